use super::handlers;
use super::types::{AppState, Request};
use crate::ipc::error::err;

type Handler = fn(&mut AppState, &Request) -> Option<serde_json::Value>;

const HANDLERS: &[Handler] = &[
    handlers::core::try_handle,
    handlers::roster::try_handle,
    handlers::contexts::try_handle,
    handlers::resolve::try_handle,
    handlers::personalities::try_handle,
    handlers::bundles::try_handle,
];

pub fn handle_request(state: &mut AppState, req: Request) -> serde_json::Value {
    let _span = tracing::debug_span!("request", id = %req.id, method = %req.method).entered();
    for handler in HANDLERS {
        if let Some(resp) = handler(state, &req) {
            return resp;
        }
    }

    tracing::warn!(method = %req.method, "unknown method");
    err(
        &req.id,
        "not_implemented",
        format!("unknown method: {}", req.method),
        None,
    )
}
