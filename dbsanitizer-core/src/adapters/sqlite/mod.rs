//! SQLite store driver.
//!
//! # Module Structure
//! - `connection`: Connection string handling and the single-connection pool
//! - `rows`: Value binding and row decoding
//!
//! # SQLite-Specific Behavior
//! - Foreign keys are toggled with `PRAGMA foreign_keys`, which is scoped
//!   to the connection; the pool therefore never holds more than one
//! - SQLite has no TRUNCATE, so tables are emptied with `DELETE FROM`
//! - Supports both file-based and in-memory databases

pub mod connection;
pub mod rows;


use super::SanitizerStore;
use super::helpers;
use crate::Result;
use crate::config::ConnectionConfig;
use crate::error::SanitizerError;
use crate::models::{DatabaseType, Row, Value};
use async_trait::async_trait;
use sqlx::SqlitePool;

/// SQLite store driver.
pub struct SqliteStore {
    /// Connection pool holding exactly one connection
    pub pool: SqlitePool,
    /// Connection configuration
    pub config: ConnectionConfig,
    /// Original connection string (kept for reference, public for test access)
    pub connection_string: String,
}

impl std::fmt::Debug for SqliteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteStore")
            .field("config", &self.config)
            .field("is_in_memory", &self.is_in_memory())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl SanitizerStore for SqliteStore {
    async fn test_connection(&self) -> Result<()> {
        let connectivity_result: i32 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map_err(SanitizerError::connection_failed)?;

        if connectivity_result != 1 {
            return Err(SanitizerError::configuration(
                "Basic connectivity test failed: unexpected result",
            ));
        }

        Ok(())
    }

    async fn count_rows(&self, table: &str) -> Result<u64> {
        let count: i64 = sqlx::query_scalar(&helpers::count_sql(DatabaseType::SQLite, table))
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                SanitizerError::query_failed(format!("Failed to count rows of '{}'", table), e)
            })?;

        Ok(u64::try_from(count).unwrap_or(0))
    }

    async fn fetch_chunk(
        &self,
        table: &str,
        key: &str,
        after: Option<&Value>,
        limit: u32,
    ) -> Result<Vec<Row>> {
        let sql = helpers::select_chunk_sql(DatabaseType::SQLite, table, key, after.is_some());

        let mut query = sqlx::query(&sql);
        if let Some(after) = after {
            query = rows::bind_value(query, after);
        }

        let fetched = query
            .bind(i64::from(limit))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                SanitizerError::query_failed(format!("Failed to fetch rows from '{}'", table), e)
            })?;

        Ok(fetched.iter().map(rows::decode_row).collect())
    }

    async fn update_row(
        &self,
        table: &str,
        key: &str,
        key_value: &Value,
        assignments: &[(String, Value)],
    ) -> Result<u64> {
        let statement =
            helpers::update_row_sql(DatabaseType::SQLite, table, key, key_value, assignments);

        let mut query = sqlx::query(&statement.sql);
        for value in &statement.binds {
            query = rows::bind_value(query, value);
        }

        let result = query.execute(&self.pool).await.map_err(|e| {
            SanitizerError::row_update_failed(table, helpers::describe_key(key, key_value), e)
        })?;

        Ok(result.rows_affected())
    }

    async fn truncate(&self, table: &str) -> Result<()> {
        sqlx::query(&helpers::truncate_sql(DatabaseType::SQLite, table))
            .execute(&self.pool)
            .await
            .map_err(|e| SanitizerError::truncate_failed(table, e))?;

        Ok(())
    }

    async fn set_referential_integrity(&self, enabled: bool) -> Result<()> {
        let pragma = if enabled {
            "PRAGMA foreign_keys = ON"
        } else {
            "PRAGMA foreign_keys = OFF"
        };

        sqlx::query(pragma)
            .execute(&self.pool)
            .await
            .map_err(|e| SanitizerError::query_failed("Failed to toggle foreign keys", e))?;

        Ok(())
    }

    async fn referential_integrity_enabled(&self) -> Result<bool> {
        let enabled: i64 = sqlx::query_scalar("PRAGMA foreign_keys")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| SanitizerError::query_failed("Failed to read foreign key state", e))?;

        Ok(enabled == 1)
    }

    fn database_type(&self) -> DatabaseType {
        DatabaseType::SQLite
    }

    fn endpoint(&self) -> String {
        self.database_path()
            .unwrap_or_else(|| ":memory:".to_string())
    }
}
