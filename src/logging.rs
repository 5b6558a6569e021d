use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;

const LOG_FILE_PREFIX: &str = "host_inventory";

/// Filter directives used when RUST_LOG is not set
pub fn default_directives(level: &str) -> String {
    format!("host_inventory={level},tower_http={level}")
}

/// Log file name stamped with the start time, e.g. "host_inventory_20240131_235959.log"
pub fn log_file_name(started: NaiveDateTime) -> String {
    format!("{}_{}.log", LOG_FILE_PREFIX, started.format("%Y%m%d_%H%M%S"))
}

/// Initialize tracing: stdout always, plus a timestamped file under LOG_DIR when set.
/// Returns the log file path if one was opened.
pub fn init(cfg: &Config) -> Result<Option<PathBuf>> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(&cfg.log_level)));

    let (file_layer, path) = match cfg.log_dir.as_deref() {
        Some(dir) => {
            let path = open_log_path(Path::new(dir))?;
            let file = File::create(&path)
                .with_context(|| format!("Failed to create log file {}", path.display()))?;
            let layer = fmt::layer().with_ansi(false).with_writer(Mutex::new(file));
            (Some(layer), Some(path))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .with(file_layer)
        .init();

    Ok(path)
}

fn open_log_path(dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create log directory {}", dir.display()))?;
    Ok(dir.join(log_file_name(chrono::Local::now().naive_local())))
}
