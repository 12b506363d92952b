//! MySQL store driver.
//!
//! # Module Structure
//! - `connection`: Connection pool management and validation
//! - `rows`: Value binding and row decoding
//!
//! # MySQL-Specific Behavior
//! - Foreign keys are toggled with the session variable `FOREIGN_KEY_CHECKS`
//! - `TRUNCATE TABLE` succeeds on referenced tables while checks are off
//! - MariaDB URLs (`mariadb://`) are accepted and handled as MySQL

pub mod connection;
mod rows;


use super::SanitizerStore;
use super::helpers;
use crate::Result;
use crate::config::ConnectionConfig;
use crate::error::SanitizerError;
use crate::models::{DatabaseType, Row, Value};
use async_trait::async_trait;
use sqlx::MySqlPool;

/// MySQL store driver
pub struct MySqlStore {
    /// Connection pool holding at most one connection
    pub pool: MySqlPool,
    /// Connection configuration (timeouts, endpoint)
    pub config: ConnectionConfig,
}

impl std::fmt::Debug for MySqlStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MySqlStore")
            .field("config", &self.config)
            .field("pool_size", &self.pool.size())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl SanitizerStore for MySqlStore {
    async fn test_connection(&self) -> Result<()> {
        let connectivity_result: i64 = sqlx::query_scalar("SELECT 1")
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
        let count: i64 = sqlx::query_scalar(&helpers::count_sql(DatabaseType::MySQL, table))
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
        let sql = helpers::select_chunk_sql(DatabaseType::MySQL, table, key, after.is_some());

        let mut query = sqlx::query(&sql);
        if let Some(after) = after {
            query = rows::bind_value(query, after);
        }

        let fetched = query
            .bind(limit)
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
            helpers::update_row_sql(DatabaseType::MySQL, table, key, key_value, assignments);

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
        sqlx::query(&helpers::truncate_sql(DatabaseType::MySQL, table))
            .execute(&self.pool)
            .await
            .map_err(|e| SanitizerError::truncate_failed(table, e))?;

        Ok(())
    }

    async fn set_referential_integrity(&self, enabled: bool) -> Result<()> {
        let statement = if enabled {
            "SET FOREIGN_KEY_CHECKS = 1"
        } else {
            "SET FOREIGN_KEY_CHECKS = 0"
        };

        sqlx::query(statement)
            .execute(&self.pool)
            .await
            .map_err(|e| SanitizerError::query_failed("Failed to toggle foreign keys", e))?;

        Ok(())
    }

    async fn referential_integrity_enabled(&self) -> Result<bool> {
        let checks: i64 = sqlx::query_scalar("SELECT @@FOREIGN_KEY_CHECKS")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| SanitizerError::query_failed("Failed to read foreign key state", e))?;

        Ok(checks == 1)
    }

    fn database_type(&self) -> DatabaseType {
        DatabaseType::MySQL
    }

    fn endpoint(&self) -> String {
        self.config.to_string()
    }
}
