use serde_json::json;
use std::path::PathBuf;

use crate::ipc::helpers::{err, ok, str_param};
use crate::ipc::types::{AppState, Request};
use crate::roster;

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "roster.discover" => Some(handle_discover(state, req)),
        "roster.load" => Some(handle_load(state, req)),
        "roster.save" => Some(handle_save(state, req)),
        _ => None,
    }
}

fn handle_discover(_state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(dir) = str_param(&req.params, "dir").map(PathBuf::from) else {
        return err(&req.id, "bad_params", "missing params.dir", None);
    };

    match roster::find_roster_file(&dir) {
        Ok(found) => ok(
            &req.id,
            json!({
                "path": found.map(|p| p.to_string_lossy().into_owned()),
            }),
        ),
        Err(e) => err(
            &req.id,
            "discover_failed",
            format!("{e:?}"),
            Some(json!({ "dir": dir.to_string_lossy() })),
        ),
    }
}

fn handle_load(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(path) = str_param(&req.params, "path").map(PathBuf::from) else {
        return err(&req.id, "bad_params", "missing params.path", None);
    };

    match roster::load_into(&mut state.store, &path) {
        Ok(summary) => {
            let diagnostics =
                serde_json::to_value(&summary.diagnostics).unwrap_or(serde_json::Value::Null);
            ok(
                &req.id,
                json!({
                    "added": summary.added,
                    "recordCount": state.store.len(),
                    "diagnostics": diagnostics,
                }),
            )
        }
        Err(e) => err(
            &req.id,
            e.code(),
            e.to_string(),
            Some(json!({ "path": path.to_string_lossy() })),
        ),
    }
}

fn handle_save(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(path) = str_param(&req.params, "path").map(PathBuf::from) else {
        return err(&req.id, "bad_params", "missing params.path", None);
    };

    match roster::save_to(&state.store, &path) {
        Ok(summary) => ok(
            &req.id,
            json!({
                "path": path.to_string_lossy(),
                "rowsWritten": summary.rows_written,
                "backup": summary.backup,
            }),
        ),
        Err(e) => err(
            &req.id,
            e.code(),
            e.to_string(),
            Some(json!({ "path": path.to_string_lossy() })),
        ),
    }
}
