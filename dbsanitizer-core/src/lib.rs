//! Core engine of DBSanitizer.
//!
//! Rewrites sensitive columns in place and truncates tables, as one batch
//! job run against a live relational database, typically before copying
//! production data into a non-production environment.
//!
//! # Architecture
//! - Store drivers behind the object-safe [`adapters::SanitizerStore`] trait,
//!   created by a factory from a connection URL
//! - Tables take part through the [`RuleProvider`] capability interface,
//!   looked up in a [`ModelRegistry`]
//! - The [`engine`] sequences resolution, chunked mutation, truncation and
//!   referential-integrity suspension
//!
//! # Security Guarantees
//! - No credentials stored or logged in any data structures
//! - Connection strings are redacted in every error message
//! - Fake data uses reserved `example.*` domains

pub mod adapters;
pub mod config;
pub mod engine;
pub mod error;
pub mod fake;
pub mod logging;
pub mod models;
pub mod registry;
pub mod rules;

// Re-export commonly used types
pub use config::{ConnectionConfig, DEFAULT_CHUNK_SIZE, RunConfiguration, SanitizerConfig};
pub use engine::{
    Confirmation, FixedAnswer, NoProgress, Orchestrator, ProgressSink, RunOutcome, RunReport,
    RunState,
};
pub use error::{Result, SanitizerError};
pub use fake::{FakeData, FakeKind};
pub use models::{DatabaseType, Row, TableDescriptor, Value};
pub use registry::{ModelRegistry, RuleProvider, TableDefinition};
pub use rules::{SanitizationRuleSet, ValueRule};
