use serde_json::json;
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

fn fixture_path(rel: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join(rel)
}

fn spawn_daemon() -> (Child, ChildStdin, BufReader<ChildStdout>) {
    let exe = env!("CARGO_BIN_EXE_gradebookd");
    let mut child = Command::new(exe)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn gradebookd");
    let stdin = child.stdin.take().expect("child stdin");
    let stdout = child.stdout.take().expect("child stdout");
    (child, stdin, BufReader::new(stdout))
}

fn request(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let payload = json!({
        "id": id,
        "method": method,
        "params": params,
    });
    writeln!(stdin, "{}", payload).expect("write request");
    stdin.flush().expect("flush request");

    let mut line = String::new();
    reader.read_line(&mut line).expect("read response line");
    assert!(!line.trim().is_empty(), "empty response for {}", method);
    let value: serde_json::Value = serde_json::from_str(line.trim()).expect("parse response json");
    assert_eq!(value.get("id").and_then(|v| v.as_str()), Some(id));
    value
}

fn request_ok(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let value = request(stdin, reader, id, method, params);
    assert!(
        value.get("ok").and_then(|v| v.as_bool()).unwrap_or(false),
        "{} failed: {}",
        method,
        value
    );
    value.get("result").cloned().unwrap_or_else(|| json!({}))
}

fn request_err_code(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> String {
    let value = request(stdin, reader, id, method, params);
    assert_eq!(
        value.get("ok").and_then(|v| v.as_bool()),
        Some(false),
        "{} unexpectedly succeeded: {}",
        method,
        value
    );
    value
        .get("error")
        .and_then(|e| e.get("code"))
        .and_then(|c| c.as_str())
        .expect("error code")
        .to_string()
}

fn record_count(result: &serde_json::Value) -> u64 {
    result
        .get("recordCount")
        .and_then(|v| v.as_u64())
        .expect("recordCount")
}

#[test]
fn analyze_report_and_update_follow_grade_rules() {
    let fixture = fixture_path("fixtures/roster/students.csv");
    let (mut child, mut stdin, mut reader) = spawn_daemon();

    // Analysis of an empty session is a typed error, not arithmetic on zero.
    let code = request_err_code(&mut stdin, &mut reader, "1", "records.analyze", json!({}));
    assert_eq!(code, "empty_store");

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "roster.load",
        json!({ "path": fixture.to_string_lossy() }),
    );

    // Scores: 77.5, 79.5, 50.0, 100.0, 47.75; mean 70.95; ties count above.
    let analysis = request_ok(&mut stdin, &mut reader, "3", "records.analyze", json!({}));
    let avg = analysis
        .get("averageOverallScore")
        .and_then(|v| v.as_f64())
        .expect("average");
    assert!((avg - 70.95).abs() < 1e-9);
    assert_eq!(analysis.get("countAbove").and_then(|v| v.as_u64()), Some(3));
    assert_eq!(analysis.get("countBelow").and_then(|v| v.as_u64()), Some(2));

    let report = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "records.report",
        json!({ "studentNumber": 30088 }),
    );
    assert_eq!(report.get("firstName").and_then(|v| v.as_str()), Some("Priya"));
    assert_eq!(
        report.get("enrolmentType").and_then(|v| v.as_str()),
        Some("Research")
    );
    let score = report
        .get("overallScore")
        .and_then(|v| v.as_f64())
        .expect("score");
    assert!((score - 79.5).abs() < 1e-9);
    assert_eq!(report.get("grade").and_then(|v| v.as_str()), Some("D"));

    let code = request_err_code(
        &mut stdin,
        &mut reader,
        "5",
        "records.report",
        json!({ "studentNumber": 99999 }),
    );
    assert_eq!(code, "not_found");

    // Out-of-range update is rejected and the stored marks stay put.
    let code = request_err_code(
        &mut stdin,
        &mut reader,
        "6",
        "records.setMark",
        json!({ "studentNumber": 30125, "field": "assignment1", "value": 120 }),
    );
    assert_eq!(code, "out_of_range_mark");
    let unchanged = request_ok(
        &mut stdin,
        &mut reader,
        "7",
        "records.report",
        json!({ "studentNumber": 30125 }),
    );
    let score = unchanged
        .get("overallScore")
        .and_then(|v| v.as_f64())
        .expect("score");
    assert!((score - 77.5).abs() < 1e-9);

    // A valid update recomputes score and grade: 0.25*100 + 0.25*90 + 0.5*70.
    let updated = request_ok(
        &mut stdin,
        &mut reader,
        "8",
        "records.setMark",
        json!({ "studentNumber": 30125, "field": "assignment1", "value": 100 }),
    );
    let score = updated
        .get("overallScore")
        .and_then(|v| v.as_f64())
        .expect("score");
    assert!((score - 82.5).abs() < 1e-9);
    assert_eq!(updated.get("grade").and_then(|v| v.as_str()), Some("HD"));

    // Research records only accept research fields.
    let code = request_err_code(
        &mut stdin,
        &mut reader,
        "9",
        "records.setMark",
        json!({ "studentNumber": 30088, "field": "finalExam", "value": 50 }),
    );
    assert_eq!(code, "bad_params");

    drop(stdin);
    let _ = child.wait();
}

#[test]
fn removal_commits_only_with_confirmation() {
    let fixture = fixture_path("fixtures/roster/students.csv");
    let (mut child, mut stdin, mut reader) = spawn_daemon();

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "roster.load",
        json!({ "path": fixture.to_string_lossy() }),
    );

    // Phase one: no confirm flag, candidate described, store untouched.
    let pending = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "records.remove",
        json!({ "studentNumber": 30240 }),
    );
    assert_eq!(pending.get("removed").and_then(|v| v.as_bool()), Some(false));
    assert_eq!(
        pending
            .get("requiresConfirmation")
            .and_then(|v| v.as_bool()),
        Some(true)
    );
    let candidate = pending.get("candidate").expect("candidate");
    assert_eq!(
        candidate.get("firstName").and_then(|v| v.as_str()),
        Some("Marcus")
    );
    assert_eq!(
        candidate.get("enrolmentType").and_then(|v| v.as_str()),
        Some("Coursework")
    );

    let health = request_ok(&mut stdin, &mut reader, "3", "health", json!({}));
    assert_eq!(record_count(&health), 5);

    // Declining is the same as never confirming.
    let declined = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "records.remove",
        json!({ "studentNumber": 30240, "confirm": false }),
    );
    assert_eq!(declined.get("removed").and_then(|v| v.as_bool()), Some(false));

    // Phase two: confirmed, exactly one record leaves the store.
    let removed = request_ok(
        &mut stdin,
        &mut reader,
        "5",
        "records.remove",
        json!({ "studentNumber": 30240, "confirm": true }),
    );
    assert_eq!(removed.get("removed").and_then(|v| v.as_bool()), Some(true));
    assert_eq!(record_count(&removed), 4);

    let code = request_err_code(
        &mut stdin,
        &mut reader,
        "6",
        "records.report",
        json!({ "studentNumber": 30240 }),
    );
    assert_eq!(code, "not_found");

    let code = request_err_code(
        &mut stdin,
        &mut reader,
        "7",
        "records.remove",
        json!({ "studentNumber": 30240, "confirm": true }),
    );
    assert_eq!(code, "not_found");

    drop(stdin);
    let _ = child.wait();
}
