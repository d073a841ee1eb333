use crate::backup;
use crate::ipc::error::{err, ok};
use crate::ipc::helpers::{required_str, HandlerResult};
use crate::ipc::types::{AppState, Request};
use serde_json::json;
use std::path::PathBuf;

fn workspace_path(state: &AppState, req: &Request) -> HandlerResult<PathBuf> {
    req.params
        .get("workspacePath")
        .and_then(|v| v.as_str())
        .map(PathBuf::from)
        .or_else(|| state.workspace.clone())
        .ok_or_else(|| err(&req.id, "no_workspace", "select a workspace first", None))
}

fn handle_export_bundle(state: &mut AppState, req: &Request) -> HandlerResult<serde_json::Value> {
    let out_path = required_str(req, "outPath")?;
    let workspace_path = workspace_path(state, req)?;

    let out = PathBuf::from(&out_path);
    let export = backup::export_workspace_bundle(&workspace_path, &out).map_err(|e| {
        err(
            &req.id,
            "bundle_failed",
            format!("{e:#}"),
            Some(json!({ "path": out_path })),
        )
    })?;

    Ok(ok(
        &req.id,
        json!({
            "path": out_path,
            "bundleFormat": export.bundle_format,
            "entryCount": export.entry_count,
            "dbSha256": export.db_sha256,
        }),
    ))
}

fn handle_import_bundle(state: &mut AppState, req: &Request) -> HandlerResult<serde_json::Value> {
    let in_path = required_str(req, "inPath")?;
    let workspace_path = workspace_path(state, req)?;

    let src = PathBuf::from(&in_path);
    if !src.is_file() {
        return Err(err(
            &req.id,
            "not_found",
            "bundle file not found",
            Some(json!({ "path": in_path })),
        ));
    }

    // Drop open handle before replacing file.
    state.close_store();

    let import = backup::import_workspace_bundle(&src, &workspace_path);
    // Reopen whatever is on disk now, even after a failed import.
    let reopened = state.open_workspace(&workspace_path);

    let import = import.map_err(|e| {
        err(
            &req.id,
            "bundle_failed",
            format!("{e:#}"),
            Some(json!({ "path": in_path })),
        )
    })?;
    reopened.map_err(|e| err(&req.id, "store_unavailable", format!("{e:#}"), None))?;

    Ok(ok(
        &req.id,
        json!({
            "workspacePath": workspace_path.to_string_lossy(),
            "bundleFormatDetected": import.bundle_format_detected
        }),
    ))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "workspace.exportBundle" => handle_export_bundle(state, req),
        "workspace.importBundle" => handle_import_bundle(state, req),
        _ => return None,
    };
    Some(result.unwrap_or_else(|e| e))
}
