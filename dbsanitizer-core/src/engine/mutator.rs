//! Chunked, in-place row rewriting.
//!
//! A table is read in chunks of at most `chunk_size` rows, ordered by its
//! key column. Each chunk starts strictly after the last key processed, so
//! the position of the next chunk never depends on values already written.
//! This only holds when the key itself is immutable and is not one of the
//! rewritten columns.
//!
//! There is no transaction around the sweep: when a row fails, the rows
//! already updated keep their new values and the remaining chunks of the
//! table are not visited.

use super::progress::ProgressSink;
use super::resolver::ResolvedTable;
use super::values::resolve_row;
use crate::Result;
use crate::adapters::SanitizerStore;
use crate::adapters::helpers::describe_key;
use crate::error::SanitizerError;
use crate::fake::FakeData;
use crate::models::Value;
use crate::rules::SanitizationRuleSet;
use serde::Serialize;

/// Counters for one table sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TableStats {
    /// Rows updated
    pub rows: u64,
    /// Non-empty chunks fetched
    pub chunks: u64,
}

/// Drives the update sweep over one table at a time.
pub struct ChunkedRowMutator<'a> {
    store: &'a dyn SanitizerStore,
    chunk_size: u32,
}

impl<'a> ChunkedRowMutator<'a> {
    pub fn new(store: &'a dyn SanitizerStore, chunk_size: u32) -> Self {
        Self {
            store,
            chunk_size: chunk_size.max(1),
        }
    }

    /// Sanitizes every row of a resolved table.
    ///
    /// # Errors
    /// - `MissingRuleSet` if the table exposes no rule set (nothing is read)
    /// - `UnknownColumn` if a rule targets or reads a column the first row
    ///   does not have (nothing is written)
    /// - `KeyUnavailable` if a row has no value for the key column
    /// - `RowUpdateFailed` if the store rejects an update
    /// - the store error of a failed chunk fetch
    pub async fn sanitize(
        &self,
        table: &ResolvedTable,
        fake: &mut FakeData,
        progress: &mut dyn ProgressSink,
    ) -> Result<TableStats> {
        let descriptor = &table.descriptor;
        let rules = table
            .provider
            .rule_set()
            .ok_or_else(|| SanitizerError::missing_rule_set(&descriptor.table_name))?;

        if rules.is_empty() {
            tracing::debug!(
                "Rule set of '{}' is empty, nothing to rewrite",
                descriptor.table_name
            );
            return Ok(TableStats::default());
        }

        if rules.get(&descriptor.primary_key).is_some() {
            tracing::warn!(
                "Key column '{}' of '{}' is rewritten; rows may be visited twice",
                descriptor.primary_key,
                descriptor.table_name
            );
        }

        progress.start(&descriptor.table_name, descriptor.row_count);
        let mut stats = TableStats::default();
        let result = self.sweep(table, &rules, fake, progress, &mut stats).await;
        progress.finish();

        result.map(|()| stats)
    }

    async fn sweep(
        &self,
        table: &ResolvedTable,
        rules: &SanitizationRuleSet,
        fake: &mut FakeData,
        progress: &mut dyn ProgressSink,
        stats: &mut TableStats,
    ) -> Result<()> {
        let table_name = table.descriptor.table_name.as_str();
        let key = table.descriptor.primary_key.as_str();
        let mut last_key: Option<Value> = None;

        loop {
            let chunk = self
                .store
                .fetch_chunk(table_name, key, last_key.as_ref(), self.chunk_size)
                .await?;

            if chunk.is_empty() {
                break;
            }

            stats.chunks = stats.chunks.saturating_add(1);
            tracing::debug!(
                "Fetched chunk {} of '{}' ({} rows)",
                stats.chunks,
                table_name,
                chunk.len()
            );

            if let (None, Some(first)) = (&last_key, chunk.first()) {
                rules.check_columns(table_name, first)?;
            }

            for row in &chunk {
                let key_value = row
                    .get(key)
                    .filter(|v| !v.is_null())
                    .cloned()
                    .ok_or_else(|| SanitizerError::key_unavailable(table_name, key))?;

                let assignments = resolve_row(rules, row, fake);
                let affected = self
                    .store
                    .update_row(table_name, key, &key_value, &assignments)
                    .await?;

                if affected == 0 {
                    tracing::debug!(
                        "Update of {} in '{}' changed no rows",
                        describe_key(key, &key_value),
                        table_name
                    );
                } else {
                    tracing::trace!(
                        "Updated {} in '{}'",
                        describe_key(key, &key_value),
                        table_name
                    );
                }

                stats.rows = stats.rows.saturating_add(1);
                progress.advance();
                last_key = Some(key_value);
            }
        }

        Ok(())
    }
}
