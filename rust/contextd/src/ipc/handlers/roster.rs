use crate::ipc::error::{fail, ok};
use crate::ipc::helpers::{optional_str, required_str, store, to_json, HandlerResult};
use crate::ipc::types::{AppState, Request};
use crate::roster::Roster;
use serde_json::json;

fn handle_institutions_list(state: &AppState, req: &Request) -> HandlerResult<serde_json::Value> {
    let roster = Roster::new(store(state, req)?);
    let rows = roster.list_institutions().map_err(|e| fail(&req.id, &e))?;
    Ok(ok(&req.id, json!({ "institutions": to_json(rows) })))
}

fn handle_institutions_create(state: &AppState, req: &Request) -> HandlerResult<serde_json::Value> {
    let roster = Roster::new(store(state, req)?);
    let name = required_str(req, "name")?;
    let inst = roster
        .create_institution(&name)
        .map_err(|e| fail(&req.id, &e))?;
    Ok(ok(&req.id, json!({ "institution": to_json(inst) })))
}

fn handle_groups_list(state: &AppState, req: &Request) -> HandlerResult<serde_json::Value> {
    let roster = Roster::new(store(state, req)?);
    let institution_id = required_str(req, "institutionId")?;
    let rows = roster
        .list_groups(&institution_id)
        .map_err(|e| fail(&req.id, &e))?;
    Ok(ok(&req.id, json!({ "groups": to_json(rows) })))
}

fn handle_groups_create(state: &AppState, req: &Request) -> HandlerResult<serde_json::Value> {
    let roster = Roster::new(store(state, req)?);
    let institution_id = required_str(req, "institutionId")?;
    let name = required_str(req, "name")?;
    let grade = optional_str(req, "grade")?;
    let group = roster
        .create_group(&institution_id, &name, grade.as_deref())
        .map_err(|e| fail(&req.id, &e))?;
    Ok(ok(&req.id, json!({ "group": to_json(group) })))
}

fn handle_groups_delete(state: &AppState, req: &Request) -> HandlerResult<serde_json::Value> {
    let roster = Roster::new(store(state, req)?);
    let group_id = required_str(req, "groupId")?;
    roster
        .delete_group(&group_id)
        .map_err(|e| fail(&req.id, &e))?;
    Ok(ok(&req.id, json!({ "ok": true })))
}

fn handle_individuals_list(state: &AppState, req: &Request) -> HandlerResult<serde_json::Value> {
    let roster = Roster::new(store(state, req)?);
    let institution_id = required_str(req, "institutionId")?;
    let group_id = optional_str(req, "groupId")?;
    let rows = roster
        .list_individuals(&institution_id, group_id.as_deref())
        .map_err(|e| fail(&req.id, &e))?;
    Ok(ok(&req.id, json!({ "individuals": to_json(rows) })))
}

fn handle_individuals_create(state: &AppState, req: &Request) -> HandlerResult<serde_json::Value> {
    let roster = Roster::new(store(state, req)?);
    let institution_id = required_str(req, "institutionId")?;
    let name = required_str(req, "name")?;
    let group_id = optional_str(req, "groupId")?;
    let contact_handle = optional_str(req, "contactHandle")?;
    let individual = roster
        .create_individual(
            &institution_id,
            group_id.as_deref(),
            &name,
            contact_handle.as_deref(),
        )
        .map_err(|e| fail(&req.id, &e))?;
    Ok(ok(&req.id, json!({ "individual": to_json(individual) })))
}

fn handle_individuals_assign_group(
    state: &AppState,
    req: &Request,
) -> HandlerResult<serde_json::Value> {
    let roster = Roster::new(store(state, req)?);
    let individual_id = required_str(req, "individualId")?;
    let group_id = optional_str(req, "groupId")?;
    let individual = roster
        .assign_group(&individual_id, group_id.as_deref())
        .map_err(|e| fail(&req.id, &e))?;
    Ok(ok(&req.id, json!({ "individual": to_json(individual) })))
}

fn handle_individuals_delete(state: &AppState, req: &Request) -> HandlerResult<serde_json::Value> {
    let roster = Roster::new(store(state, req)?);
    let individual_id = required_str(req, "individualId")?;
    roster
        .delete_individual(&individual_id)
        .map_err(|e| fail(&req.id, &e))?;
    Ok(ok(&req.id, json!({ "ok": true })))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "institutions.list" => handle_institutions_list(state, req),
        "institutions.create" => handle_institutions_create(state, req),
        "groups.list" => handle_groups_list(state, req),
        "groups.create" => handle_groups_create(state, req),
        "groups.delete" => handle_groups_delete(state, req),
        "individuals.list" => handle_individuals_list(state, req),
        "individuals.create" => handle_individuals_create(state, req),
        "individuals.assignGroup" => handle_individuals_assign_group(state, req),
        "individuals.delete" => handle_individuals_delete(state, req),
        _ => return None,
    };
    Some(result.unwrap_or_else(|e| e))
}
