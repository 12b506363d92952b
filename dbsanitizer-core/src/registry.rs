//! Rule providers and the registry that maps configured references to them.
//!
//! A table takes part in a run through a [`RuleProvider`]: it names its
//! physical table and key column, and may expose a sanitization rule set.
//! Providers without a rule set are a normal variant; they can still be
//! truncated, and are skipped with a warning when listed for sanitization.

use crate::error::SanitizerError;
use crate::rules::{SanitizationRuleSet, ValueRule};
use crate::Result;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Default key column, used when a model does not name one.
pub const DEFAULT_PRIMARY_KEY: &str = "id";

/// Capability interface every manageable table exposes.
pub trait RuleProvider: Send + Sync {
    /// Physical table name.
    fn table_name(&self) -> &str;

    /// Immutable single-column key that orders and addresses rows.
    fn primary_key(&self) -> &str {
        DEFAULT_PRIMARY_KEY
    }

    /// Rule set to apply, or `None` when the table is not sanitizable.
    fn rule_set(&self) -> Option<SanitizationRuleSet>;
}

/// Concrete provider assembled from configuration or code.
///
/// # Example
/// ```rust
/// use dbsanitizer_core::{FakeKind, TableDefinition, ValueRule, registry::RuleProvider};
///
/// let users = TableDefinition::new("users")
///     .with_rule("email", ValueRule::fake(FakeKind::Email))?
///     .with_rule("password", ValueRule::fixed("secret"))?;
///
/// assert_eq!(users.table_name(), "users");
/// assert_eq!(users.rule_set().map(|r| r.len()), Some(2));
/// # Ok::<(), dbsanitizer_core::SanitizerError>(())
/// ```
#[derive(Debug, Clone)]
pub struct TableDefinition {
    table_name: String,
    primary_key: String,
    rules: Option<SanitizationRuleSet>,
}

impl TableDefinition {
    /// Creates a definition without rules, keyed on `id`.
    pub fn new(table_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            primary_key: DEFAULT_PRIMARY_KEY.to_string(),
            rules: None,
        }
    }

    /// Sets the key column.
    pub fn with_primary_key(mut self, primary_key: impl Into<String>) -> Self {
        self.primary_key = primary_key.into();
        self
    }

    /// Replaces the whole rule set.
    pub fn with_rule_set(mut self, rules: SanitizationRuleSet) -> Self {
        self.rules = Some(rules);
        self
    }

    /// Adds one rule, creating the rule set on first use.
    ///
    /// # Errors
    /// Returns a configuration error if the column already has a rule.
    pub fn with_rule(mut self, column: impl Into<String>, rule: ValueRule) -> Result<Self> {
        self.rules
            .get_or_insert_with(SanitizationRuleSet::new)
            .insert(column, rule)?;
        Ok(self)
    }
}

impl RuleProvider for TableDefinition {
    fn table_name(&self) -> &str {
        &self.table_name
    }

    fn primary_key(&self) -> &str {
        &self.primary_key
    }

    fn rule_set(&self) -> Option<SanitizationRuleSet> {
        self.rules.clone()
    }
}

/// Maps configuration references to rule providers.
#[derive(Clone, Default)]
pub struct ModelRegistry {
    providers: BTreeMap<String, Arc<dyn RuleProvider>>,
}

impl fmt::Debug for ModelRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelRegistry")
            .field("references", &self.providers.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl ModelRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a provider under a reference.
    ///
    /// # Errors
    /// Returns a configuration error if the reference is already taken.
    pub fn register(
        &mut self,
        reference: impl Into<String>,
        provider: impl RuleProvider + 'static,
    ) -> Result<()> {
        self.register_shared(reference, Arc::new(provider))
    }

    /// Registers an already shared provider under a reference.
    ///
    /// # Errors
    /// Returns a configuration error if the reference is already taken.
    pub fn register_shared(
        &mut self,
        reference: impl Into<String>,
        provider: Arc<dyn RuleProvider>,
    ) -> Result<()> {
        let reference = reference.into();
        if self.providers.contains_key(&reference) {
            return Err(SanitizerError::configuration(format!(
                "Model '{}' is registered more than once",
                reference
            )));
        }
        self.providers.insert(reference, provider);
        Ok(())
    }

    /// Looks up the provider for a reference.
    pub fn get(&self, reference: &str) -> Option<Arc<dyn RuleProvider>> {
        self.providers.get(reference).cloned()
    }

    /// Registered references, sorted.
    pub fn references(&self) -> impl Iterator<Item = &str> {
        self.providers.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}
