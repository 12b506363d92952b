//! Per-invocation run configuration.

use crate::error::SanitizerError;
use std::collections::BTreeSet;

/// Rows fetched per chunk when nothing else is configured.
pub const DEFAULT_CHUNK_SIZE: u32 = 1000;

/// Inputs for one sanitization run, fixed once the run starts.
///
/// # Example
/// ```rust
/// use dbsanitizer_core::RunConfiguration;
///
/// let config = RunConfiguration::new()
///     .with_sanitize_list(["User", "Order"])
///     .with_truncate_list(["AuditLog"])
///     .with_table_filter(["users"]);
///
/// assert!(config.validate().is_ok());
/// assert!(config.includes_table("users"));
/// assert!(!config.includes_table("orders"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfiguration {
    /// References to sanitize, in order
    pub sanitize_list: Vec<String>,
    /// References to truncate, in order
    pub truncate_list: Vec<String>,
    /// Maximum rows per fetched chunk
    pub chunk_size: u32,
    /// Physical table names the sanitize pass is restricted to
    pub table_filter: Option<BTreeSet<String>>,
    /// Report what would be touched without mutating anything
    pub info_only: bool,
    /// Skip the sanitize pass and only truncate
    pub truncate_only: bool,
    /// Seed for the fake-data source
    pub seed: Option<u64>,
}

impl Default for RunConfiguration {
    fn default() -> Self {
        Self {
            sanitize_list: Vec::new(),
            truncate_list: Vec::new(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            table_filter: None,
            info_only: false,
            truncate_only: false,
            seed: None,
        }
    }
}

impl RunConfiguration {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sanitize_list<I, S>(mut self, references: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sanitize_list = references.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_truncate_list<I, S>(mut self, references: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.truncate_list = references.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_chunk_size(mut self, chunk_size: u32) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// Restricts the sanitize pass to the named tables.
    ///
    /// Blank names are dropped; an empty result clears the filter.
    pub fn with_table_filter<I, S>(mut self, tables: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let tables: BTreeSet<String> = tables
            .into_iter()
            .map(Into::into)
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect();
        self.table_filter = if tables.is_empty() { None } else { Some(tables) };
        self
    }

    pub fn with_info_only(mut self, info_only: bool) -> Self {
        self.info_only = info_only;
        self
    }

    pub fn with_truncate_only(mut self, truncate_only: bool) -> Self {
        self.truncate_only = truncate_only;
        self
    }

    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    /// Whether the sanitize pass should process the given physical table.
    pub fn includes_table(&self, table_name: &str) -> bool {
        self.table_filter
            .as_ref()
            .is_none_or(|filter| filter.contains(table_name))
    }

    /// Validates the configuration.
    ///
    /// # Errors
    /// Returns error if the chunk size is zero or the modes conflict.
    pub fn validate(&self) -> crate::Result<()> {
        if self.chunk_size == 0 {
            return Err(SanitizerError::configuration(
                "chunk size must be greater than 0",
            ));
        }

        if self.info_only && self.truncate_only {
            return Err(SanitizerError::configuration(
                "--info and --truncate cannot be combined",
            ));
        }

        Ok(())
    }
}
