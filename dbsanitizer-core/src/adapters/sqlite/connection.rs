//! SQLite connection handling.
//!
//! # Connection Modes
//! - File-based: `sqlite:///path/to/database.db` or `sqlite://./relative.db`
//! - Bare file path ending in `.db`, `.sqlite` or `.sqlite3`
//! - In-memory: `sqlite::memory:` or `:memory:`
//!
//! The database file must already exist: a sanitization run against a
//! freshly created empty file is always a mistake.

use super::SqliteStore;
use crate::Result;
use crate::config::ConnectionConfig;
use crate::error::SanitizerError;
use sqlx::SqlitePool;
use url::Url;

impl SqliteStore {
    /// Opens a SQLite database from a connection string.
    ///
    /// # Errors
    /// Returns error if:
    /// - Connection string format is invalid
    /// - Database file does not exist
    /// - Database cannot be opened
    pub async fn new(connection_string: &str) -> Result<Self> {
        let config = parse_sqlite_connection_config(connection_string)?;
        Self::with_config(connection_string, config).await
    }

    /// Opens a SQLite database with custom configuration.
    pub async fn with_config(connection_string: &str, config: ConnectionConfig) -> Result<Self> {
        config.validate()?;
        validate_sqlite_connection_string(connection_string)?;
        let pool = create_sqlite_connection(connection_string, &config).await?;

        tracing::debug!("Opened SQLite database {}", config);

        Ok(Self {
            pool,
            config,
            connection_string: connection_string.to_string(),
        })
    }

    /// Checks if the connection is to an in-memory database.
    pub fn is_in_memory(&self) -> bool {
        self.connection_string.contains(":memory:")
            || self.connection_string.contains("mode=memory")
    }

    /// Gets the database file path if using a file-based database.
    pub fn database_path(&self) -> Option<String> {
        if self.is_in_memory() {
            return None;
        }

        if let Some(stripped) = self.connection_string.strip_prefix("sqlite://") {
            let path = stripped.split('?').next().unwrap_or(stripped);
            if !path.is_empty() {
                return Some(path.to_string());
            }
        } else if has_sqlite_extension(&self.connection_string) {
            return Some(self.connection_string.clone());
        }

        None
    }
}

/// Parses a SQLite connection string into a connection configuration.
pub fn parse_sqlite_connection_config(connection_string: &str) -> Result<ConnectionConfig> {
    validate_sqlite_connection_string(connection_string)?;

    let config = ConnectionConfig::new("localhost".to_string())
        .with_database(extract_database_name(connection_string));

    Ok(config)
}

/// Validates SQLite connection string format.
///
/// # Errors
/// Returns error if connection string is invalid
pub fn validate_sqlite_connection_string(connection_string: &str) -> Result<()> {
    if connection_string == ":memory:" || has_sqlite_extension(connection_string) {
        return Ok(());
    }

    if connection_string.starts_with("sqlite:") {
        if connection_string.contains(":memory:") || connection_string.contains("mode=memory") {
            return Ok(());
        }

        if let Ok(url) = Url::parse(connection_string) {
            if url.scheme() != "sqlite" {
                return Err(SanitizerError::configuration(
                    "Connection string must use sqlite:// scheme",
                ));
            }
            return Ok(());
        }

        if connection_string.starts_with("sqlite://") {
            return Ok(());
        }
    }

    Err(SanitizerError::configuration(
        "Invalid SQLite connection string format: expected sqlite:// URL, file path, or :memory:",
    ))
}

fn has_sqlite_extension(connection_string: &str) -> bool {
    connection_string.ends_with(".db")
        || connection_string.ends_with(".sqlite")
        || connection_string.ends_with(".sqlite3")
}

/// Extracts database name from connection string.
fn extract_database_name(connection_string: &str) -> String {
    if connection_string.contains(":memory:") {
        return ":memory:".to_string();
    }

    let path = connection_string
        .strip_prefix("sqlite://")
        .unwrap_or(connection_string);
    let path = path.split('?').next().unwrap_or(path);

    match path.rsplit('/').next() {
        Some(filename) if !filename.is_empty() => filename.to_string(),
        _ => "main".to_string(),
    }
}

/// Opens the single-connection pool.
///
/// The connection is never recycled: `PRAGMA foreign_keys` and in-memory
/// databases both live exactly as long as it does.
async fn create_sqlite_connection(
    connection_string: &str,
    config: &ConnectionConfig,
) -> Result<SqlitePool> {
    use sqlx::sqlite::SqliteConnectOptions;
    use std::str::FromStr;

    let normalized = normalize_connection_string(connection_string);

    let options = SqliteConnectOptions::from_str(&normalized).map_err(|e| {
        SanitizerError::configuration(format!("Invalid SQLite connection string: {}", e))
    })?;

    let pool = sqlx::sqlite::SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .acquire_timeout(config.connect_timeout)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await
        .map_err(|e| SanitizerError::Connection {
            context: format!("Failed to open SQLite database {}", config),
            source: Box::new(e),
        })?;

    Ok(pool)
}

/// Normalizes connection string to SQLite URL format.
fn normalize_connection_string(connection_string: &str) -> String {
    if connection_string == ":memory:" {
        return "sqlite::memory:".to_string();
    }

    if connection_string.starts_with("sqlite:") {
        return connection_string.to_string();
    }

    format!("sqlite://{}", connection_string)
}
