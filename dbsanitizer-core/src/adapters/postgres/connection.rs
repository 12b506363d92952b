//! PostgreSQL connection pool management and validation.

use super::PostgresStore;
use crate::Result;
use crate::config::ConnectionConfig;
use crate::error::{SanitizerError, redact_database_url};
use sqlx::PgPool;
use url::Url;

const DEFAULT_PORT: u16 = 5432;

impl PostgresStore {
    /// Creates a PostgreSQL store driver.
    ///
    /// The pool connects lazily, so an unreachable server is only reported
    /// by the first statement (usually `test_connection`).
    ///
    /// # Errors
    /// Returns error if the connection string format is invalid.
    #[allow(clippy::unused_async)]
    pub async fn new(connection_string: &str) -> Result<Self> {
        let config = Self::parse_connection_config(connection_string)?;
        let pool = Self::create_connection_pool(connection_string, &config)?;

        Ok(Self { pool, config })
    }

    /// Parses a connection string into configuration, credentials excluded.
    pub fn parse_connection_config(connection_string: &str) -> Result<ConnectionConfig> {
        Self::validate_connection_string(connection_string)?;
        ConnectionConfig::from_url(connection_string, DEFAULT_PORT)
    }

    /// Creates the single-connection pool.
    ///
    /// `session_replication_role` is session state, so the one connection
    /// is never recycled.
    fn create_connection_pool(connection_string: &str, config: &ConnectionConfig) -> Result<PgPool> {
        use sqlx::Executor;

        let statement_timeout_ms = config.statement_timeout.map(|t| t.as_millis());

        let pool = sqlx::postgres::PgPoolOptions::new()
            .max_connections(1)
            .acquire_timeout(config.connect_timeout)
            .idle_timeout(None)
            .max_lifetime(None)
            .after_connect(move |conn, _meta| {
                Box::pin(async move {
                    if let Some(ms) = statement_timeout_ms {
                        conn.execute(format!("SET statement_timeout = {}", ms).as_str())
                            .await?;
                    }

                    let app_name = format!("dbsanitizer-{}", env!("CARGO_PKG_VERSION"));
                    conn.execute(format!("SET application_name = '{}'", app_name).as_str())
                        .await?;

                    Ok(())
                })
            })
            .connect_lazy(connection_string)
            .map_err(|e| SanitizerError::Connection {
                context: format!(
                    "Failed to create PostgreSQL connection pool to {}",
                    redact_database_url(connection_string)
                ),
                source: Box::new(e),
            })?;

        Ok(pool)
    }

    /// Validates connection string format.
    ///
    /// # Errors
    /// Returns error if connection string is invalid
    pub fn validate_connection_string(connection_string: &str) -> Result<()> {
        let url = Url::parse(connection_string).map_err(|e| {
            SanitizerError::configuration(format!(
                "Invalid PostgreSQL connection string format: {}",
                e
            ))
        })?;

        if !matches!(url.scheme(), "postgres" | "postgresql") {
            return Err(SanitizerError::configuration(
                "Connection string must use postgres:// or postgresql:// scheme",
            ));
        }

        if url.host_str().is_none() {
            return Err(SanitizerError::configuration(
                "Connection string must specify a host",
            ));
        }

        Ok(())
    }
}
