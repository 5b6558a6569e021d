use axum::{
    extract::{Path, Query, State},
    Json,
};
use std::sync::Arc;

use crate::models::PingQuery;
use crate::ping::{ping_host, PingReport};
use crate::utils::is_ip_address;
use crate::AppState;

use super::ApiError;

/// Ping an arbitrary IP address
pub async fn ping_ip(
    State(state): State<Arc<AppState>>,
    Path(ip): Path<String>,
    Query(query): Query<PingQuery>,
) -> Result<Json<PingReport>, ApiError> {
    if !is_ip_address(&ip) {
        return Err(ApiError::bad_request("invalid IP address."));
    }

    let amount = query.sanitize(state.config.ping_max_amount);
    Ok(Json(ping_host(&ip, amount, state.config.ping_timeout_secs).await))
}

/// Ping a stored host by ID
pub async fn ping_stored_host(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Query(query): Query<PingQuery>,
) -> Result<Json<PingReport>, ApiError> {
    let host = state
        .store
        .get_host(id)
        .await?
        .ok_or_else(|| ApiError::not_found("host"))?;

    let amount = query.sanitize(state.config.ping_max_amount);
    Ok(Json(
        ping_host(&host.ip_address, amount, state.config.ping_timeout_secs).await,
    ))
}
