//! Per-row replacement values.

use crate::fake::FakeData;
use crate::models::{Row, Value};
use crate::rules::SanitizationRuleSet;

/// Computes the replacement for every column of the rule set, in rule order.
///
/// Every rule sees the row as it was fetched; replacements computed for
/// earlier columns are not visible to later ones. No I/O happens here and
/// the returned values are not checked against column types.
pub fn resolve_row(
    rules: &SanitizationRuleSet,
    row: &Row,
    fake: &mut FakeData,
) -> Vec<(String, Value)> {
    rules
        .iter()
        .map(|(column, rule)| (column.to_string(), rule.evaluate(row, fake)))
        .collect()
}
