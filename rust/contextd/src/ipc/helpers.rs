use crate::ipc::error::err;
use crate::ipc::types::{AppState, Request};
use crate::store::SqliteStore;
use serde::de::DeserializeOwned;

/// Error envelope already built for the caller to return.
pub type HandlerResult<T> = Result<T, serde_json::Value>;

pub fn store<'a>(state: &'a AppState, req: &Request) -> HandlerResult<&'a SqliteStore> {
    state
        .store
        .as_ref()
        .ok_or_else(|| err(&req.id, "no_workspace", "select a workspace first", None))
}

/// Required non-blank string parameter.
pub fn required_str(req: &Request, key: &str) -> HandlerResult<String> {
    match req.params.get(key).and_then(|v| v.as_str()) {
        Some(v) if !v.trim().is_empty() => Ok(v.trim().to_string()),
        _ => Err(err(&req.id, "bad_params", format!("missing {key}"), None)),
    }
}

/// Optional string; `null`, absent and blank all mean `None`.
pub fn optional_str(req: &Request, key: &str) -> HandlerResult<Option<String>> {
    match req.params.get(key) {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::String(s)) => {
            let t = s.trim();
            Ok((!t.is_empty()).then(|| t.to_string()))
        }
        Some(_) => Err(err(
            &req.id,
            "bad_params",
            format!("{key} must be a string"),
            None,
        )),
    }
}

/// String parameter that must be present but may be empty (note content).
pub fn text(req: &Request, key: &str) -> HandlerResult<String> {
    req.params
        .get(key)
        .and_then(|v| v.as_str())
        .map(str::to_string)
        .ok_or_else(|| err(&req.id, "bad_params", format!("missing {key}"), None))
}

pub fn required_bool(req: &Request, key: &str) -> HandlerResult<bool> {
    req.params
        .get(key)
        .and_then(|v| v.as_bool())
        .ok_or_else(|| err(&req.id, "bad_params", format!("missing {key}"), None))
}

pub fn optional_bool(req: &Request, key: &str) -> bool {
    req.params
        .get(key)
        .and_then(|v| v.as_bool())
        .unwrap_or(false)
}

/// Deserializes a nested object parameter, or the whole params object when
/// `key` is `None`.
pub fn object<T: DeserializeOwned>(req: &Request, key: Option<&str>) -> HandlerResult<T> {
    let raw = match key {
        Some(k) => req.params.get(k).cloned().unwrap_or(serde_json::Value::Null),
        None => req.params.clone(),
    };
    let raw = if raw.is_null() {
        serde_json::Value::Object(Default::default())
    } else {
        raw
    };
    serde_json::from_value(raw).map_err(|e| {
        err(
            &req.id,
            "bad_params",
            format!("invalid {}: {e}", key.unwrap_or("params")),
            None,
        )
    })
}

pub fn to_json<T: serde::Serialize>(v: T) -> serde_json::Value {
    serde_json::to_value(v).unwrap_or(serde_json::Value::Null)
}
