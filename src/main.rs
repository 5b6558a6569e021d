mod config;
mod db;
mod handlers;
mod logging;
mod models;
mod pages;
mod ping;
mod router;
mod script;
mod ssh;
mod utils;

use std::sync::Arc;
use tokio::signal;

use config::Config;
use db::Store;

/// Application state shared across handlers
pub struct AppState {
    pub store: Store,
    pub config: Config,
    pub pages: tera::Tera,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Load configuration
    let cfg = Config::load();

    // Initialize tracing
    let log_file = logging::init(&cfg)?;
    tracing::info!("Starting Host Inventory Server");
    if let Some(path) = log_file {
        tracing::info!("Log file: {}", path.display());
    }
    tracing::info!("Database: {}", cfg.db_path);
    tracing::info!("Listen: {}", cfg.listen_addr());

    // Initialize database
    let store = Store::with_pool_size(&cfg.db_path, cfg.db_max_connections).await?;
    tracing::info!("Database initialized (pool_size={})", cfg.db_max_connections);

    let pages = pages::build()?;

    // Create app state
    let state = Arc::new(AppState {
        store,
        config: cfg.clone(),
        pages,
    });

    // Build router
    let app = router::build(state, &cfg.static_dir);

    // Start server
    let listener = tokio::net::TcpListener::bind(cfg.listen_addr()).await?;
    tracing::info!("Host Inventory listening on {}", cfg.listen_addr());

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Host Inventory shutting down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => { sig.recv().await; }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
