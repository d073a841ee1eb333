use crate::adapter::ContextAdapter;
use crate::ipc::error::{err, fail, ok};
use crate::ipc::helpers::{optional_str, store, to_json, HandlerResult};
use crate::ipc::types::{AppState, Request};
use crate::profile::Personalities;
use crate::prompt::PromptAssembler;
use crate::resolver::ResolvedContext;
use crate::roster::Roster;
use serde_json::json;

fn respond(req: &Request, resolved: &ResolvedContext, prompt: String) -> serde_json::Value {
    ok(
        &req.id,
        json!({
            "text": resolved.text,
            "breakdown": to_json(&resolved.breakdown),
            "promptTokens": PromptAssembler::estimate_tokens(&prompt),
            "prompt": prompt,
        }),
    )
}

fn handle_context_resolve(state: &AppState, req: &Request) -> HandlerResult<serde_json::Value> {
    let store = store(state, req)?;
    let individual_id = optional_str(req, "individualId")?;
    let contact_handle = optional_str(req, "contactHandle")?;

    let individual_id = match (individual_id, contact_handle) {
        (Some(id), _) => Some(id),
        (None, Some(handle)) => Roster::new(store)
            .find_by_contact_handle(&handle)
            .map_err(|e| fail(&req.id, &e))?,
        (None, None) => {
            return Err(err(
                &req.id,
                "bad_params",
                "missing individualId or contactHandle",
                None,
            ))
        }
    };
    // Unknown handle: nothing to resolve, but no failure either.
    let Some(individual_id) = individual_id else {
        return Ok(respond(req, &ResolvedContext::default(), String::new()));
    };

    let profile = Personalities::new(store)
        .load_profile()
        .map_err(|e| fail(&req.id, &e))?;
    let ctx = ContextAdapter::new(store, profile)
        .agent_context_for(&individual_id)
        .map_err(|e| fail(&req.id, &e))?;
    Ok(respond(req, &ctx.resolved, ctx.prompt))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "context.resolve" => Some(handle_context_resolve(state, req).unwrap_or_else(|e| e)),
        _ => None,
    }
}
