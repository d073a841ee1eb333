use crate::error::ContextError;
use serde_json::json;

pub fn ok(id: &str, result: serde_json::Value) -> serde_json::Value {
    json!({
        "id": id,
        "ok": true,
        "result": result
    })
}

pub fn err(
    id: &str,
    code: &str,
    message: impl Into<String>,
    details: Option<serde_json::Value>,
) -> serde_json::Value {
    let mut error = json!({
        "code": code,
        "message": message.into(),
    });
    if let Some(d) = details {
        error["details"] = d;
    }
    json!({
        "id": id,
        "ok": false,
        "error": error,
    })
}

/// Maps a library error onto its stable wire code.
pub fn fail(id: &str, e: &ContextError) -> serde_json::Value {
    if matches!(e, ContextError::StoreUnavailable(_)) {
        tracing::error!(error = %e, "store failure");
    }
    err(id, e.code(), e.to_string(), None)
}
