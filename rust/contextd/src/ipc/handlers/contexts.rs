use crate::editing::{ContextEditor, NewInstitutionEntry};
use crate::ipc::error::{fail, ok};
use crate::ipc::helpers::{
    object, optional_bool, optional_str, required_bool, required_str, store, text, to_json,
    HandlerResult,
};
use crate::ipc::types::{AppState, Request};
use crate::model::EntryPatch;
use crate::roster::Roster;
use crate::store::ContextStore;
use serde_json::json;

fn handle_institution_list(state: &AppState, req: &Request) -> HandlerResult<serde_json::Value> {
    let store = store(state, req)?;
    let institution_id = required_str(req, "institutionId")?;
    let include_inactive = optional_bool(req, "includeInactive");
    let entries = store
        .institution_entries(&institution_id, include_inactive)
        .map_err(|e| fail(&req.id, &e))?;
    Ok(ok(&req.id, json!({ "entries": to_json(entries) })))
}

fn handle_institution_create(state: &AppState, req: &Request) -> HandlerResult<serde_json::Value> {
    let editor = ContextEditor::new(store(state, req)?);
    let institution_id = required_str(req, "institutionId")?;
    let new: NewInstitutionEntry = object(req, None)?;
    let entry = editor
        .create_institution_entry(&institution_id, new)
        .map_err(|e| fail(&req.id, &e))?;
    Ok(ok(&req.id, json!({ "entry": to_json(entry) })))
}

fn handle_institution_update(state: &AppState, req: &Request) -> HandlerResult<serde_json::Value> {
    let editor = ContextEditor::new(store(state, req)?);
    let entry_id = required_str(req, "entryId")?;
    let patch: EntryPatch = object(req, Some("patch"))?;
    let entry = editor
        .update_institution_entry(&entry_id, &patch)
        .map_err(|e| fail(&req.id, &e))?;
    Ok(ok(&req.id, json!({ "entry": to_json(entry) })))
}

fn handle_institution_delete(state: &AppState, req: &Request) -> HandlerResult<serde_json::Value> {
    let editor = ContextEditor::new(store(state, req)?);
    let entry_id = required_str(req, "entryId")?;
    editor
        .delete_institution_entry(&entry_id)
        .map_err(|e| fail(&req.id, &e))?;
    Ok(ok(&req.id, json!({ "ok": true })))
}

fn handle_institution_toggle(state: &AppState, req: &Request) -> HandlerResult<serde_json::Value> {
    let editor = ContextEditor::new(store(state, req)?);
    let entry_id = required_str(req, "entryId")?;
    let active = required_bool(req, "active")?;
    let entry = editor
        .toggle_institution_entry(&entry_id, active)
        .map_err(|e| fail(&req.id, &e))?;
    Ok(ok(&req.id, json!({ "entry": to_json(entry) })))
}

fn handle_group_get(state: &AppState, req: &Request) -> HandlerResult<serde_json::Value> {
    let store = store(state, req)?;
    let group_id = required_str(req, "groupId")?;
    let entry = store
        .group_entry(&group_id)
        .map_err(|e| fail(&req.id, &e))?;
    Ok(ok(&req.id, json!({ "entry": to_json(entry) })))
}

fn handle_group_set(state: &AppState, req: &Request) -> HandlerResult<serde_json::Value> {
    let editor = ContextEditor::new(store(state, req)?);
    let group_id = required_str(req, "groupId")?;
    let content = text(req, "content")?;
    let entry = editor
        .set_group_entry(&group_id, &content)
        .map_err(|e| fail(&req.id, &e))?;
    Ok(ok(&req.id, json!({ "entry": to_json(entry) })))
}

fn handle_group_list(state: &AppState, req: &Request) -> HandlerResult<serde_json::Value> {
    let roster = Roster::new(store(state, req)?);
    let institution_id = required_str(req, "institutionId")?;
    let groups = roster
        .list_groups(&institution_id)
        .map_err(|e| fail(&req.id, &e))?;
    Ok(ok(&req.id, json!({ "groups": to_json(groups) })))
}

fn handle_individual_get(state: &AppState, req: &Request) -> HandlerResult<serde_json::Value> {
    let store = store(state, req)?;
    let individual_id = required_str(req, "individualId")?;
    let entry = store
        .individual_entry(&individual_id)
        .map_err(|e| fail(&req.id, &e))?;
    Ok(ok(&req.id, json!({ "entry": to_json(entry) })))
}

fn handle_individual_set(state: &AppState, req: &Request) -> HandlerResult<serde_json::Value> {
    let editor = ContextEditor::new(store(state, req)?);
    let individual_id = required_str(req, "individualId")?;
    let content = text(req, "content")?;
    let entry = editor
        .set_individual_entry(&individual_id, &content)
        .map_err(|e| fail(&req.id, &e))?;
    Ok(ok(&req.id, json!({ "entry": to_json(entry) })))
}

fn handle_individual_list(state: &AppState, req: &Request) -> HandlerResult<serde_json::Value> {
    let roster = Roster::new(store(state, req)?);
    let institution_id = required_str(req, "institutionId")?;
    let group_id = optional_str(req, "groupId")?;
    let rows = roster
        .list_individual_contexts(&institution_id, group_id.as_deref())
        .map_err(|e| fail(&req.id, &e))?;
    Ok(ok(&req.id, json!({ "individuals": to_json(rows) })))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "contexts.institution.list" => handle_institution_list(state, req),
        "contexts.institution.create" => handle_institution_create(state, req),
        "contexts.institution.update" => handle_institution_update(state, req),
        "contexts.institution.delete" => handle_institution_delete(state, req),
        "contexts.institution.toggle" => handle_institution_toggle(state, req),
        "contexts.group.get" => handle_group_get(state, req),
        "contexts.group.set" => handle_group_set(state, req),
        "contexts.group.list" => handle_group_list(state, req),
        "contexts.individual.get" => handle_individual_get(state, req),
        "contexts.individual.set" => handle_individual_set(state, req),
        "contexts.individual.list" => handle_individual_list(state, req),
        _ => return None,
    };
    Some(result.unwrap_or_else(|e| e))
}
