use crate::ipc::error::{fail, ok};
use crate::ipc::helpers::{object, optional_bool, required_str, store, text, to_json, HandlerResult};
use crate::ipc::types::{AppState, Request};
use crate::profile::{Personalities, PersonalityPatch, ProfileSettings};
use serde_json::json;

fn handle_list(state: &AppState, req: &Request) -> HandlerResult<serde_json::Value> {
    let ps = Personalities::new(store(state, req)?);
    let rows = ps
        .list(optional_bool(req, "includeInactive"))
        .map_err(|e| fail(&req.id, &e))?;
    Ok(ok(&req.id, json!({ "personalities": to_json(rows) })))
}

fn handle_create(state: &AppState, req: &Request) -> HandlerResult<serde_json::Value> {
    let ps = Personalities::new(store(state, req)?);
    let name = text(req, "name")?;
    let prompt = text(req, "prompt")?;
    let p = ps.create(&name, &prompt).map_err(|e| fail(&req.id, &e))?;
    Ok(ok(&req.id, json!({ "personality": to_json(p) })))
}

fn handle_update(state: &AppState, req: &Request) -> HandlerResult<serde_json::Value> {
    let ps = Personalities::new(store(state, req)?);
    let id = required_str(req, "personalityId")?;
    let patch: PersonalityPatch = object(req, Some("patch"))?;
    let p = ps.update(&id, &patch).map_err(|e| fail(&req.id, &e))?;
    Ok(ok(&req.id, json!({ "personality": to_json(p) })))
}

fn handle_deactivate(state: &AppState, req: &Request) -> HandlerResult<serde_json::Value> {
    let ps = Personalities::new(store(state, req)?);
    let id = required_str(req, "personalityId")?;
    let p = ps.deactivate(&id).map_err(|e| fail(&req.id, &e))?;
    Ok(ok(&req.id, json!({ "personality": to_json(p) })))
}

fn handle_profile_get(state: &AppState, req: &Request) -> HandlerResult<serde_json::Value> {
    let ps = Personalities::new(store(state, req)?);
    let settings = ps.settings().map_err(|e| fail(&req.id, &e))?;
    let profile = ps.load_profile().map_err(|e| fail(&req.id, &e))?;
    Ok(ok(
        &req.id,
        json!({ "settings": to_json(settings), "profile": to_json(profile) }),
    ))
}

fn handle_profile_set(state: &AppState, req: &Request) -> HandlerResult<serde_json::Value> {
    let ps = Personalities::new(store(state, req)?);
    let settings: ProfileSettings = object(req, None)?;
    let saved = ps.save_settings(&settings).map_err(|e| fail(&req.id, &e))?;
    let profile = ps.load_profile().map_err(|e| fail(&req.id, &e))?;
    Ok(ok(
        &req.id,
        json!({ "settings": to_json(saved), "profile": to_json(profile) }),
    ))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "personalities.list" => handle_list(state, req),
        "personalities.create" => handle_create(state, req),
        "personalities.update" => handle_update(state, req),
        "personalities.deactivate" => handle_deactivate(state, req),
        "agent.profile.get" => handle_profile_get(state, req),
        "agent.profile.set" => handle_profile_set(state, req),
        _ => return None,
    };
    Some(result.unwrap_or_else(|e| e))
}
