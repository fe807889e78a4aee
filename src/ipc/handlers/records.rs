use serde_json::json;

use crate::ipc::helpers::{bool_param, err, i64_param, ok, str_param, u64_param};
use crate::ipc::types::{AppState, Request};
use crate::model::Assessment;

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "records.list" => Some(handle_list(state, req)),
        "records.remove" => Some(handle_remove(state, req)),
        "records.setMark" => Some(handle_set_mark(state, req)),
        "records.analyze" => Some(handle_analyze(state, req)),
        "records.report" => Some(handle_report(state, req)),
        "records.sort" => Some(handle_sort(state, req)),
        "records.isSorted" => Some(handle_is_sorted(state, req)),
        _ => None,
    }
}

fn handle_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let records = match serde_json::to_value(state.store.records()) {
        Ok(v) => v,
        Err(e) => return err(&req.id, "serialize_failed", e.to_string(), None),
    };
    ok(
        &req.id,
        json!({
            "records": records,
            "count": state.store.len(),
        }),
    )
}

/// Two-phase destructive removal. Without `confirm: true` the candidate is
/// described and nothing is mutated; the caller re-sends with confirmation to
/// commit.
fn handle_remove(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(number) = u64_param(&req.params, "studentNumber") else {
        return err(&req.id, "bad_params", "missing params.studentNumber", None);
    };
    let confirm = bool_param(&req.params, "confirm");

    if !confirm {
        return match state.store.find_by_number(number) {
            Some(candidate) => ok(
                &req.id,
                json!({
                    "removed": false,
                    "requiresConfirmation": true,
                    "candidate": {
                        "studentNumber": candidate.student_number,
                        "firstName": candidate.first_name,
                        "lastName": candidate.last_name,
                        "enrolmentType": candidate.enrolment_type(),
                    },
                }),
            ),
            None => err(
                &req.id,
                "not_found",
                format!("student {} was not found", number),
                None,
            ),
        };
    }

    match state.store.remove_by_number(number) {
        Ok(removed) => {
            let record = serde_json::to_value(&removed).unwrap_or(serde_json::Value::Null);
            ok(
                &req.id,
                json!({
                    "removed": true,
                    "record": record,
                    "recordCount": state.store.len(),
                }),
            )
        }
        Err(e) => err(&req.id, e.code(), e.to_string(), None),
    }
}

fn handle_set_mark(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(number) = u64_param(&req.params, "studentNumber") else {
        return err(&req.id, "bad_params", "missing params.studentNumber", None);
    };
    let Some(field) = str_param(&req.params, "field") else {
        return err(&req.id, "bad_params", "missing params.field", None);
    };
    let Some(value) = i64_param(&req.params, "value") else {
        return err(&req.id, "bad_params", "missing params.value", None);
    };

    let Some(record) = state.store.find_by_number_mut(number) else {
        return err(
            &req.id,
            "not_found",
            format!("student {} was not found", number),
            None,
        );
    };

    let enrolment_type = record.enrolment_type();
    let outcome = match (&mut record.assessment, field) {
        (Assessment::Coursework(unit), "assignment1") => unit.set_assignment1(value),
        (Assessment::Coursework(unit), "assignment2") => unit.set_assignment2(value),
        (Assessment::Coursework(unit), "finalExam") => unit.set_final_exam(value),
        (Assessment::Research(unit), "proposal") => unit.set_proposal(value),
        (Assessment::Research(unit), "dissertation") => unit.set_dissertation(value),
        (_, other) => {
            return err(
                &req.id,
                "bad_params",
                format!("field {} does not apply to a {} record", other, enrolment_type),
                None,
            );
        }
    };

    match outcome {
        Ok(()) => ok(
            &req.id,
            json!({
                "studentNumber": number,
                "field": field,
                "value": value,
                "overallScore": record.overall_score(),
                "grade": record.letter_grade(),
            }),
        ),
        Err(e) => err(
            &req.id,
            e.code(),
            e.to_string(),
            Some(json!({ "field": field, "value": value })),
        ),
    }
}

fn handle_analyze(state: &mut AppState, req: &Request) -> serde_json::Value {
    match state.store.analyze() {
        Ok(analysis) => {
            let result = serde_json::to_value(analysis).unwrap_or(serde_json::Value::Null);
            ok(&req.id, result)
        }
        Err(e) => err(&req.id, e.code(), e.to_string(), None),
    }
}

fn handle_report(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(number) = u64_param(&req.params, "studentNumber") else {
        return err(&req.id, "bad_params", "missing params.studentNumber", None);
    };
    match state.store.report(number) {
        Ok(report) => {
            let result = serde_json::to_value(report).unwrap_or(serde_json::Value::Null);
            ok(&req.id, result)
        }
        Err(e) => err(&req.id, e.code(), e.to_string(), None),
    }
}

fn handle_sort(state: &mut AppState, req: &Request) -> serde_json::Value {
    state.store.sort_by_number();
    ok(
        &req.id,
        json!({
            "sorted": true,
            "recordCount": state.store.len(),
        }),
    )
}

fn handle_is_sorted(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(&req.id, json!({ "sorted": state.store.is_sorted() }))
}
