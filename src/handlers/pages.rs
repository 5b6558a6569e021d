use axum::{
    extract::{Path, State},
    response::Html,
};
use std::sync::Arc;

use crate::pages;
use crate::AppState;

use super::ApiError;

/// Home page
pub async fn home(State(state): State<Arc<AppState>>) -> Result<Html<String>, ApiError> {
    Ok(Html(pages::render_home(&state.pages)?))
}

/// Host listing page
pub async fn hosts_page(State(state): State<Arc<AppState>>) -> Result<Html<String>, ApiError> {
    let hosts = state.store.list_hosts().await?;
    Ok(Html(pages::render_hosts(&state.pages, &hosts)?))
}

/// Host detail page with its stored scripts
pub async fn host_page(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Html<String>, ApiError> {
    let host = state
        .store
        .get_host(id)
        .await?
        .ok_or_else(|| ApiError::not_found("host"))?;
    let scripts = state.store.list_scripts(id).await?;
    Ok(Html(pages::render_host(&state.pages, &host, &scripts)?))
}
