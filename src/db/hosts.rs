use anyhow::Result;
use chrono::Utc;
use sqlx::{Pool, Sqlite};

use crate::models::*;

use super::row_helpers::map_host_row;

const SELECT_HOST: &str = r#"
    SELECT id, name, ip_address, port, mac_address, created_at
    FROM hosts
"#;

/// Host database operations
pub struct HostRepo;

impl HostRepo {
    pub async fn list(pool: &Pool<Sqlite>) -> Result<Vec<Host>> {
        let rows = sqlx::query(&format!("{} ORDER BY id", SELECT_HOST))
            .fetch_all(pool)
            .await?;

        Ok(rows.iter().map(map_host_row).collect())
    }

    pub async fn get(pool: &Pool<Sqlite>, id: i64) -> Result<Option<Host>> {
        let row = sqlx::query(&format!("{} WHERE id = ?", SELECT_HOST))
            .bind(id)
            .fetch_optional(pool)
            .await?;

        Ok(row.as_ref().map(map_host_row))
    }

    /// Insert all hosts in one transaction; nothing is stored if any insert fails
    pub async fn create_many(pool: &Pool<Sqlite>, reqs: &[CreateHostRequest]) -> Result<Vec<Host>> {
        let now = Utc::now();
        let mut tx = pool.begin().await?;
        let mut ids = Vec::with_capacity(reqs.len());

        for req in reqs {
            let result = sqlx::query(
                r#"
                INSERT INTO hosts (name, ip_address, port, mac_address, created_at)
                VALUES (?, ?, ?, ?, ?)
                "#,
            )
            .bind(&req.name)
            .bind(&req.ip_address)
            .bind(req.port)
            .bind(req.mac_or_empty())
            .bind(now)
            .execute(&mut *tx)
            .await
            .map_err(|e| super::conflict_or_error(e, "Host", &req.name))?;

            ids.push(result.last_insert_rowid());
        }

        let mut hosts = Vec::with_capacity(ids.len());
        for id in ids {
            let row = sqlx::query(&format!("{} WHERE id = ?", SELECT_HOST))
                .bind(id)
                .fetch_one(&mut *tx)
                .await?;
            hosts.push(map_host_row(&row));
        }

        tx.commit().await?;
        Ok(hosts)
    }

    /// Delete a host, returning what was removed
    pub async fn delete(pool: &Pool<Sqlite>, id: i64) -> Result<Host> {
        let host = Self::get(pool, id)
            .await?
            .ok_or_else(|| super::NotFoundError::new("Host", &id.to_string()))?;

        let result = sqlx::query("DELETE FROM hosts WHERE id = ?")
            .bind(id)
            .execute(pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(super::NotFoundError::new("Host", &id.to_string()).into());
        }
        Ok(host)
    }

    /// Delete every host, returning what was removed
    pub async fn delete_all(pool: &Pool<Sqlite>) -> Result<Vec<Host>> {
        let mut tx = pool.begin().await?;

        let rows = sqlx::query(&format!("{} ORDER BY id", SELECT_HOST))
            .fetch_all(&mut *tx)
            .await?;
        let hosts: Vec<Host> = rows.iter().map(map_host_row).collect();

        sqlx::query("DELETE FROM hosts").execute(&mut *tx).await?;
        tx.commit().await?;

        Ok(hosts)
    }
}
