use anyhow::{Context, Result};
use sqlx::{Row, sqlite::SqliteRow};

use crate::models::*;
use crate::script::{CommandTemplate, Script};

/// Map a SQLite row to a Host struct
pub fn map_host_row(row: &SqliteRow) -> Host {
    let port: i64 = row.get("port");
    Host {
        id: row.get("id"),
        name: row.get("name"),
        ip_address: row.get("ip_address"),
        port: u16::try_from(port).unwrap_or_default(),
        mac_address: row.get("mac_address"),
        created_at: row.get("created_at"),
    }
}

/// Map a SQLite row to a HostScript; steps are stored as JSON and re-validated on load
pub fn map_script_row(row: &SqliteRow) -> Result<HostScript> {
    let id: i64 = row.get("id");
    let name: String = row.get("name");
    let steps_json: String = row.get("steps");

    let steps: Vec<CommandTemplate> = serde_json::from_str(&steps_json)
        .with_context(|| format!("Invalid stored steps for script {}", id))?;
    let script = Script::new(name, steps)
        .with_context(|| format!("Invalid stored definition for script {}", id))?;

    Ok(HostScript {
        id,
        host_id: row.get("host_id"),
        script,
        created_at: row.get("created_at"),
    })
}
