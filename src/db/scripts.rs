use anyhow::{Context, Result};
use chrono::Utc;
use sqlx::{Pool, Sqlite};

use crate::models::*;
use crate::script::Script;

use super::row_helpers::map_script_row;

const SELECT_SCRIPT: &str = r#"
    SELECT id, host_id, name, steps, created_at
    FROM scripts
"#;

/// Script database operations; scripts are always scoped to their host
pub struct ScriptRepo;

impl ScriptRepo {
    pub async fn list(pool: &Pool<Sqlite>, host_id: i64) -> Result<Vec<HostScript>> {
        let rows = sqlx::query(&format!("{} WHERE host_id = ? ORDER BY id", SELECT_SCRIPT))
            .bind(host_id)
            .fetch_all(pool)
            .await?;

        rows.iter().map(map_script_row).collect()
    }

    pub async fn get(pool: &Pool<Sqlite>, host_id: i64, id: i64) -> Result<Option<HostScript>> {
        let row = sqlx::query(&format!("{} WHERE host_id = ? AND id = ?", SELECT_SCRIPT))
            .bind(host_id)
            .bind(id)
            .fetch_optional(pool)
            .await?;

        row.as_ref().map(map_script_row).transpose()
    }

    pub async fn create(pool: &Pool<Sqlite>, host_id: i64, script: &Script) -> Result<HostScript> {
        let steps = serde_json::to_string(script.steps()).context("Failed to encode script steps")?;

        let result = sqlx::query(
            r#"
            INSERT INTO scripts (host_id, name, steps, created_at)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(host_id)
        .bind(script.name())
        .bind(&steps)
        .bind(Utc::now())
        .execute(pool)
        .await
        .map_err(|e| super::conflict_or_error(e, "Script", script.name()))?;

        Self::get(pool, host_id, result.last_insert_rowid())
            .await?
            .context("Script not found after creation")
    }

    pub async fn delete(pool: &Pool<Sqlite>, host_id: i64, id: i64) -> Result<()> {
        let result = sqlx::query("DELETE FROM scripts WHERE host_id = ? AND id = ?")
            .bind(host_id)
            .bind(id)
            .execute(pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(super::NotFoundError::new("Script", &id.to_string()).into());
        }
        Ok(())
    }
}
