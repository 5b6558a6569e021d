use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use crate::models::*;
use crate::script::runner::{run_script, ScriptReport, ThreadPause};
use crate::script::Script;
use crate::ssh::SshShell;
use crate::AppState;

use super::{created, ApiError};

async fn load_host(state: &AppState, host_id: i64) -> Result<Host, ApiError> {
    state
        .store
        .get_host(host_id)
        .await?
        .ok_or_else(|| ApiError::not_found("host"))
}

async fn load_script(state: &AppState, host_id: i64, script_id: i64) -> Result<HostScript, ApiError> {
    state
        .store
        .get_script(host_id, script_id)
        .await?
        .ok_or_else(|| ApiError::not_found("script"))
}

/// List the scripts stored for a host
pub async fn list_scripts(
    State(state): State<Arc<AppState>>,
    Path(host_id): Path<i64>,
) -> Result<Json<Vec<HostScript>>, ApiError> {
    load_host(&state, host_id).await?;
    let scripts = state.store.list_scripts(host_id).await?;
    Ok(Json(scripts))
}

/// Get a single script of a host
pub async fn get_script(
    State(state): State<Arc<AppState>>,
    Path((host_id, script_id)): Path<(i64, i64)>,
) -> Result<Json<HostScript>, ApiError> {
    Ok(Json(load_script(&state, host_id, script_id).await?))
}

/// Store a script for a host.
/// The body is decoded here so definition errors come back as 400 with their message.
pub async fn create_script(
    State(state): State<Arc<AppState>>,
    Path(host_id): Path<i64>,
    Json(body): Json<serde_json::Value>,
) -> Result<(StatusCode, Json<HostScript>), ApiError> {
    let script: Script = serde_json::from_value(body)
        .map_err(|e| ApiError::bad_request(format!("invalid script: {}", e)))?;

    load_host(&state, host_id).await?;
    let stored = state.store.create_script(host_id, &script).await?;
    tracing::info!(
        "Created script '{}' ({} steps) for host {}",
        stored.script.name(),
        stored.script.steps().len(),
        host_id
    );
    Ok(created(stored))
}

/// Delete a script of a host
pub async fn delete_script(
    State(state): State<Arc<AppState>>,
    Path((host_id, script_id)): Path<(i64, i64)>,
) -> Result<StatusCode, ApiError> {
    state.store.delete_script(host_id, script_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Resolve every step of a script without contacting the host
pub async fn preview_script(
    State(state): State<Arc<AppState>>,
    Path((host_id, script_id)): Path<(i64, i64)>,
    Json(req): Json<PreviewScriptRequest>,
) -> Result<Json<ScriptPreviewResponse>, ApiError> {
    let host = load_host(&state, host_id).await?;
    let stored = load_script(&state, host_id, script_id).await?;
    let values = param_strings(&req.params);

    let steps = stored
        .script
        .resolve_all(&values)
        .with_wait_override(wait_override(req.wait_override_ms))
        .map(|step| step.map(PreviewStep::from))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Json(ScriptPreviewResponse {
        host: host.name,
        script: stored.script.name().to_string(),
        steps,
    }))
}

/// Push a script to its host over SSH and return the per-step report
pub async fn run_host_script(
    State(state): State<Arc<AppState>>,
    Path((host_id, script_id)): Path<(i64, i64)>,
    Json(req): Json<RunScriptRequest>,
) -> Result<Json<ScriptReport>, ApiError> {
    if req.username.is_empty() {
        return Err(ApiError::bad_request("username is required"));
    }

    let host = load_host(&state, host_id).await?;
    let stored = load_script(&state, host_id, script_id).await?;
    let values = param_strings(&req.params);
    let wait = wait_override(req.wait_override_ms);

    // Refuse before connecting when a parameter is missing
    stored
        .script
        .resolve_all(&values)
        .try_for_each(|step| step.map(|_| ()))?;

    let timeout_secs = state.config.ssh_timeout_secs;
    let read_quiet = state.config.ssh_read_quiet();

    let report = tokio::task::spawn_blocking(move || -> anyhow::Result<ScriptReport> {
        let mut shell = SshShell::open(
            &host.ip_address,
            host.port,
            &req.username,
            &req.password,
            timeout_secs,
            read_quiet,
        )?;
        Ok(run_script(&host, &stored.script, &values, wait, &mut shell, &mut ThreadPause))
    })
    .await
    .map_err(|e| ApiError::internal(format!("script task failed: {}", e)))?
    .map_err(|e| {
        tracing::warn!("SSH session to host {} failed: {:#}", host_id, e);
        ApiError::bad_gateway(format!("{:#}", e))
    })?;

    Ok(Json(report))
}
