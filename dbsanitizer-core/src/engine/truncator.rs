//! Unconditional table truncation.

use crate::Result;
use crate::adapters::SanitizerStore;
use crate::models::TableDescriptor;

/// Empties tables. One statement per table, never retried.
pub struct Truncator<'a> {
    store: &'a dyn SanitizerStore,
}

impl<'a> Truncator<'a> {
    pub fn new(store: &'a dyn SanitizerStore) -> Self {
        Self { store }
    }

    /// Removes every row of the table.
    ///
    /// # Errors
    /// `TruncateFailed` when the store rejects the statement, for example
    /// for a view or a table that no longer exists.
    pub async fn truncate(&self, descriptor: &TableDescriptor) -> Result<()> {
        tracing::info!(
            "Truncating table '{}' ({} rows)",
            descriptor.table_name,
            descriptor.row_count
        );
        self.store.truncate(&descriptor.table_name).await
    }
}
