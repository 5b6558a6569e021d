use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use crate::models::*;
use crate::AppState;

use super::{created, ApiError};

/// List all hosts
pub async fn list_hosts(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Host>>, ApiError> {
    let hosts = state.store.list_hosts().await?;
    Ok(Json(hosts))
}

/// Get a single host by ID
pub async fn get_host(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Host>, ApiError> {
    let host = state
        .store
        .get_host(id)
        .await?
        .ok_or_else(|| ApiError::not_found("host"))?;
    Ok(Json(host))
}

/// Create a batch of hosts; every entry is validated before anything is stored
pub async fn create_hosts(
    State(state): State<Arc<AppState>>,
    Json(reqs): Json<Vec<CreateHostRequest>>,
) -> Result<(StatusCode, Json<Vec<Host>>), ApiError> {
    if reqs.is_empty() {
        return Err(ApiError::bad_request("at least one host is required"));
    }
    for req in &reqs {
        req.validate().map_err(ApiError::bad_request)?;
    }

    let hosts = state.store.create_hosts(&reqs).await?;
    tracing::info!("Created {} host(s)", hosts.len());
    Ok(created(hosts))
}

/// Delete a host and return it
pub async fn delete_host(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Host>, ApiError> {
    let host = state.store.delete_host(id).await?;
    tracing::info!("Deleted host {} ({})", host.name, host.id);
    Ok(Json(host))
}

/// Delete every host and return what was removed
pub async fn delete_all_hosts(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Host>>, ApiError> {
    let hosts = state.store.delete_all_hosts().await?;
    tracing::info!("Deleted all hosts ({})", hosts.len());
    Ok(Json(hosts))
}
