mod hosts;
pub(crate) mod row_helpers;
mod scripts;

use anyhow::{Context, Result};
use sqlx::{sqlite::SqlitePoolOptions, Pool, Sqlite};

use crate::models::*;
use crate::script::Script;

/// Typed error for "resource not found", downcast by the API error handler
#[derive(Debug)]
pub struct NotFoundError {
    pub resource: String,
    pub id: String,
}

impl NotFoundError {
    pub fn new(resource: &str, id: &str) -> Self {
        Self {
            resource: resource.to_string(),
            id: id.to_string(),
        }
    }
}

impl std::fmt::Display for NotFoundError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} not found: {}", self.resource, self.id)
    }
}

impl std::error::Error for NotFoundError {}

/// Typed error for unique-constraint violations, mapped to 409 by the API
#[derive(Debug)]
pub struct ConflictError {
    pub resource: String,
    pub key: String,
    pub detail: String,
}

impl std::fmt::Display for ConflictError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} '{}' already exists ({})", self.resource, self.key, self.detail)
    }
}

impl std::error::Error for ConflictError {}

/// Turn a unique violation into a ConflictError; pass every other error through
pub(crate) fn conflict_or_error(err: sqlx::Error, resource: &str, key: &str) -> anyhow::Error {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => ConflictError {
            resource: resource.to_string(),
            key: key.to_string(),
            detail: db.message().replace('\n', " "),
        }
        .into(),
        _ => err.into(),
    }
}

/// Store handles all database operations, delegating to per-entity repo modules.
#[derive(Clone)]
pub struct Store {
    pool: Pool<Sqlite>,
}

impl Store {
    /// Create a new database store with a specific pool size
    pub async fn with_pool_size(db_path: &str, max_connections: u32) -> Result<Self> {
        let db_url = format!("sqlite:{}?mode=rwc", db_path);

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections.max(1))
            .connect(&db_url)
            .await
            .context("Failed to connect to database")?;

        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    /// Private in-memory store for tests
    #[cfg(test)]
    pub async fn in_memory() -> Result<Self> {
        Self::with_pool_size(":memory:", 1).await
    }

    /// Run database migrations
    async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .context("Failed to run database migrations")?;
        Ok(())
    }

    // ========== Host Operations ==========

    pub async fn list_hosts(&self) -> Result<Vec<Host>> {
        hosts::HostRepo::list(&self.pool).await
    }

    pub async fn get_host(&self, id: i64) -> Result<Option<Host>> {
        hosts::HostRepo::get(&self.pool, id).await
    }

    pub async fn create_hosts(&self, reqs: &[CreateHostRequest]) -> Result<Vec<Host>> {
        hosts::HostRepo::create_many(&self.pool, reqs).await
    }

    pub async fn delete_host(&self, id: i64) -> Result<Host> {
        hosts::HostRepo::delete(&self.pool, id).await
    }

    pub async fn delete_all_hosts(&self) -> Result<Vec<Host>> {
        hosts::HostRepo::delete_all(&self.pool).await
    }

    // ========== Script Operations ==========

    pub async fn list_scripts(&self, host_id: i64) -> Result<Vec<HostScript>> {
        scripts::ScriptRepo::list(&self.pool, host_id).await
    }

    pub async fn get_script(&self, host_id: i64, id: i64) -> Result<Option<HostScript>> {
        scripts::ScriptRepo::get(&self.pool, host_id, id).await
    }

    pub async fn create_script(&self, host_id: i64, script: &Script) -> Result<HostScript> {
        scripts::ScriptRepo::create(&self.pool, host_id, script).await
    }

    pub async fn delete_script(&self, host_id: i64, id: i64) -> Result<()> {
        scripts::ScriptRepo::delete(&self.pool, host_id, id).await
    }
}
