use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::AppState;

/// Build the application router with all routes
pub fn build(state: Arc<AppState>, static_dir: &str) -> Router {
    Router::new()
        // Pages
        .route("/", get(handlers::pages::home))
        .route("/pages/hosts", get(handlers::pages::hosts_page))
        .route("/pages/hosts/:id", get(handlers::pages::host_page))
        .route("/api/health", get(handlers::healthcheck))
        // Host routes
        .route(
            "/hosts",
            get(handlers::hosts::list_hosts)
                .post(handlers::hosts::create_hosts)
                .delete(handlers::hosts::delete_all_hosts),
        )
        .route(
            "/hosts/:id",
            get(handlers::hosts::get_host).delete(handlers::hosts::delete_host),
        )
        // Ping routes
        .route("/hosts/:id/ping", get(handlers::ping::ping_stored_host))
        .route("/ping/:ip", get(handlers::ping::ping_ip))
        // Script routes
        .route(
            "/hosts/:id/scripts",
            get(handlers::scripts::list_scripts).post(handlers::scripts::create_script),
        )
        .route(
            "/hosts/:id/scripts/:script_id",
            get(handlers::scripts::get_script).delete(handlers::scripts::delete_script),
        )
        .route(
            "/hosts/:id/scripts/:script_id/preview",
            post(handlers::scripts::preview_script),
        )
        .route(
            "/hosts/:id/scripts/:script_id/run",
            post(handlers::scripts::run_host_script),
        )
        // Static assets
        .nest_service("/static", ServeDir::new(static_dir))
        // Add state and middleware
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
}
