//! On-disk sanitizer configuration (TOML).
//!
//! ```toml
//! sanitize_models = ["User"]
//! truncate_models = ["AuditLog"]
//! chunk_count = 500
//!
//! [models.User]
//! table = "users"
//!
//! [models.User.sanitize]
//! email = { fake = "email" }
//! display_name = { template = "User {id}" }
//! password = "secret"
//! api_token = { null = true }
//!
//! [models.AuditLog]
//! table = "audit_log"
//! ```
//!
//! Rules keep their file order. A model without a `sanitize` table has no
//! rule set and can only be truncated.

use super::run::{DEFAULT_CHUNK_SIZE, RunConfiguration};
use crate::error::SanitizerError;
use crate::fake::FakeKind;
use crate::models::Value;
use crate::registry::{DEFAULT_PRIMARY_KEY, ModelRegistry, TableDefinition};
use crate::rules::{SanitizationRuleSet, ValueRule};
use crate::Result;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

fn default_chunk_count() -> u32 {
    DEFAULT_CHUNK_SIZE
}

/// Parsed configuration file.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SanitizerConfig {
    /// References to sanitize, in order
    #[serde(default)]
    pub sanitize_models: Vec<String>,
    /// References to truncate, in order
    #[serde(default)]
    pub truncate_models: Vec<String>,
    /// Rows per chunk
    #[serde(default = "default_chunk_count")]
    pub chunk_count: u32,
    /// Optional seed for reproducible fake data
    #[serde(default)]
    pub seed: Option<u64>,
    /// Model definitions keyed by reference
    #[serde(default)]
    pub models: BTreeMap<String, ModelConfig>,
}

/// One `[models.<reference>]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModelConfig {
    /// Physical table name; defaults to the reference
    pub table: Option<String>,
    /// Key column; defaults to `id`
    pub primary_key: Option<String>,
    /// Column → rule table, in file order
    pub sanitize: Option<toml::Table>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum RuleSpec {
    Fake { fake: FakeKind },
    Template { template: String },
    Null { null: bool },
    Static(Value),
}

impl SanitizerConfig {
    /// Parses a configuration from TOML text.
    ///
    /// # Errors
    /// Returns a parse error for malformed TOML or unknown keys, and a
    /// configuration error for a zero chunk count.
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: Self = toml::from_str(contents).map_err(|e| SanitizerError::ConfigParse {
            context: "sanitizer configuration".to_string(),
            source: e,
        })?;

        if config.chunk_count == 0 {
            return Err(SanitizerError::configuration(
                "chunk_count must be greater than 0",
            ));
        }

        Ok(config)
    }

    /// Reads and parses a configuration file.
    ///
    /// # Errors
    /// Returns an I/O error if the file cannot be read, otherwise the
    /// errors of [`SanitizerConfig::from_toml_str`].
    pub async fn load(path: &Path) -> Result<Self> {
        let contents =
            tokio::fs::read_to_string(path)
                .await
                .map_err(|e| SanitizerError::Io {
                    context: format!("Failed to read {}", path.display()),
                    source: e,
                })?;
        tracing::debug!("Loaded configuration from {}", path.display());
        Self::from_toml_str(&contents)
    }

    /// Builds the model registry and the base run configuration.
    ///
    /// # Errors
    /// Returns an error if a rule cannot be interpreted.
    pub fn into_parts(self) -> Result<(ModelRegistry, RunConfiguration)> {
        let mut registry = ModelRegistry::new();

        for (reference, model) in self.models {
            let definition = build_definition(&reference, model)?;
            registry.register(reference, definition)?;
        }

        let run = RunConfiguration::new()
            .with_sanitize_list(self.sanitize_models)
            .with_truncate_list(self.truncate_models)
            .with_chunk_size(self.chunk_count)
            .with_seed(self.seed);

        Ok((registry, run))
    }
}

fn build_definition(reference: &str, model: ModelConfig) -> Result<TableDefinition> {
    let table = model.table.unwrap_or_else(|| reference.to_string());
    let primary_key = model
        .primary_key
        .unwrap_or_else(|| DEFAULT_PRIMARY_KEY.to_string());
    let mut definition = TableDefinition::new(table).with_primary_key(primary_key);

    if let Some(sanitize) = model.sanitize {
        let mut rules = SanitizationRuleSet::new();
        for (column, raw) in sanitize {
            let spec: RuleSpec = raw.try_into().map_err(|e| SanitizerError::ConfigParse {
                context: format!("rule for column '{}' of model '{}'", column, reference),
                source: e,
            })?;
            rules.insert(column.as_str(), rule_from_spec(reference, &column, spec)?)?;
        }
        definition = definition.with_rule_set(rules);
    }

    Ok(definition)
}

fn rule_from_spec(reference: &str, column: &str, spec: RuleSpec) -> Result<ValueRule> {
    match spec {
        RuleSpec::Fake { fake } => Ok(ValueRule::fake(fake)),
        RuleSpec::Template { template } => ValueRule::template(&template),
        RuleSpec::Null { null: true } => Ok(ValueRule::Static(Value::Null)),
        RuleSpec::Null { null: false } => Err(SanitizerError::configuration(format!(
            "Column '{}' of model '{}': `null = false` is not a rule",
            column, reference
        ))),
        RuleSpec::Static(value) => Ok(ValueRule::Static(value)),
    }
}
