//! Resolution of configured references to live tables.

use crate::Result;
use crate::adapters::SanitizerStore;
use crate::error::SanitizerError;
use crate::models::TableDescriptor;
use crate::registry::{ModelRegistry, RuleProvider};
use std::fmt;
use std::sync::Arc;

/// A descriptor together with the provider it was resolved from.
#[derive(Clone)]
pub struct ResolvedTable {
    pub descriptor: TableDescriptor,
    pub provider: Arc<dyn RuleProvider>,
}

impl fmt::Debug for ResolvedTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedTable")
            .field("descriptor", &self.descriptor)
            .finish_non_exhaustive()
    }
}

/// Maps references to [`TableDescriptor`]s.
///
/// Resolution only reads: the registry lookup plus a row count. Resolving
/// the same reference twice yields the same physical table.
pub struct TableResolver<'a> {
    registry: &'a ModelRegistry,
    store: &'a dyn SanitizerStore,
}

impl<'a> TableResolver<'a> {
    pub fn new(registry: &'a ModelRegistry, store: &'a dyn SanitizerStore) -> Self {
        Self { registry, store }
    }

    /// Resolves one reference.
    ///
    /// # Errors
    /// `ReferenceNotFound` when the registry does not know the reference,
    /// or the store error raised while counting rows.
    pub async fn resolve(&self, reference: &str) -> Result<ResolvedTable> {
        let provider = self
            .registry
            .get(reference)
            .ok_or_else(|| SanitizerError::reference_not_found(reference))?;

        let table_name = provider.table_name().to_string();
        let row_count = self.store.count_rows(&table_name).await?;

        tracing::debug!(
            "Resolved '{}' to table '{}' ({} rows)",
            reference,
            table_name,
            row_count
        );

        Ok(ResolvedTable {
            descriptor: TableDescriptor {
                reference: reference.to_string(),
                table_name,
                primary_key: provider.primary_key().to_string(),
                row_count,
            },
            provider,
        })
    }
}
