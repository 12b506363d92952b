//! Configuration types.
//!
//! - `ConnectionConfig`: database session settings (no credentials)
//! - `RunConfiguration`: inputs of a single run
//! - `SanitizerConfig`: the TOML configuration file

mod connection;
mod file;
mod run;

pub use connection::ConnectionConfig;
pub use file::{ModelConfig, SanitizerConfig};
pub use run::{DEFAULT_CHUNK_SIZE, RunConfiguration};
