//! MySQL connection pool management and validation.
//!
//! # Security Features
//! - Validates connection string format and parameters
//! - Sets appropriate timeouts for all operations
//! - Credentials never appear in errors or logs

use super::MySqlStore;
use crate::Result;
use crate::config::ConnectionConfig;
use crate::error::{SanitizerError, redact_database_url};
use sqlx::MySqlPool;
use url::Url;

const DEFAULT_PORT: u16 = 3306;

impl MySqlStore {
    /// Creates a MySQL store driver.
    ///
    /// # Arguments
    /// * `connection_string` - MySQL connection URL (credentials sanitized in errors)
    ///
    /// # Errors
    /// Returns error if:
    /// - Connection string format is invalid
    /// - Pool configuration is invalid
    #[allow(clippy::unused_async)]
    pub async fn new(connection_string: &str) -> Result<Self> {
        let config = parse_mysql_connection_config(connection_string)?;
        let pool = create_mysql_connection_pool(connection_string, &config)?;

        Ok(Self { pool, config })
    }
}

/// Parses and validates a MySQL connection string.
pub fn parse_mysql_connection_config(connection_string: &str) -> Result<ConnectionConfig> {
    validate_mysql_connection_string(connection_string)?;
    ConnectionConfig::from_url(connection_string, DEFAULT_PORT)
}

/// Validates MySQL connection string format.
///
/// # Errors
/// Returns error if connection string is invalid
pub fn validate_mysql_connection_string(connection_string: &str) -> Result<()> {
    let url = Url::parse(connection_string).map_err(|e| {
        SanitizerError::configuration(format!("Invalid MySQL connection string format: {}", e))
    })?;

    if !matches!(url.scheme(), "mysql" | "mariadb") {
        return Err(SanitizerError::configuration(
            "Connection string must use mysql:// or mariadb:// scheme",
        ));
    }

    if url.host_str().is_none() {
        return Err(SanitizerError::configuration(
            "Connection string must specify a host",
        ));
    }

    Ok(())
}

/// sqlx only understands the `mysql` scheme.
fn normalize_scheme(connection_string: &str) -> String {
    connection_string.strip_prefix("mariadb://").map_or_else(
        || connection_string.to_string(),
        |rest| format!("mysql://{}", rest),
    )
}

/// Creates the single-connection pool.
///
/// `FOREIGN_KEY_CHECKS` is session state, so the one connection is never
/// recycled.
fn create_mysql_connection_pool(
    connection_string: &str,
    config: &ConnectionConfig,
) -> Result<MySqlPool> {
    use sqlx::Executor;

    let statement_timeout_ms = config.statement_timeout.map(|t| t.as_millis());

    let pool = sqlx::mysql::MySqlPoolOptions::new()
        .max_connections(1)
        .acquire_timeout(config.connect_timeout)
        .idle_timeout(None)
        .max_lifetime(None)
        .after_connect(move |conn, _meta| {
            Box::pin(async move {
                if let Some(ms) = statement_timeout_ms {
                    conn.execute(format!("SET SESSION MAX_EXECUTION_TIME = {}", ms).as_str())
                        .await?;
                }
                conn.execute("SET SESSION time_zone = '+00:00'").await?;
                Ok(())
            })
        })
        .connect_lazy(&normalize_scheme(connection_string))
        .map_err(|e| SanitizerError::Connection {
            context: format!(
                "Failed to create MySQL connection pool to {}",
                redact_database_url(connection_string)
            ),
            source: Box::new(e),
        })?;

    Ok(pool)
}
