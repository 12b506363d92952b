//! Value binding and row decoding for MySQL.

use crate::models::{Row, Value};
use sqlx::Row as _;
use sqlx::mysql::{MySql, MySqlArguments, MySqlRow};
use sqlx::query::Query;

/// Binds a value as the next positional parameter.
pub(super) fn bind_value<'q>(
    query: Query<'q, MySql, MySqlArguments>,
    value: &Value,
) -> Query<'q, MySql, MySqlArguments> {
    match value {
        Value::Bool(b) => query.bind(*b),
        Value::Integer(i) => query.bind(*i),
        Value::Float(f) => query.bind(*f),
        Value::Text(s) => query.bind(s.clone()),
        Value::Bytes(b) => query.bind(b.clone()),
        Value::Null => query.bind(None::<String>),
    }
}

/// Decodes every column of a fetched row, in select order.
pub(super) fn decode_row(row: &MySqlRow) -> Row {
    use sqlx::Column;

    let mut decoded = Row::new();
    for column in row.columns() {
        decoded.push(column.name(), extract_column_value(row, column.ordinal()));
    }
    decoded
}

/// `BOOLEAN` columns are `TINYINT(1)` and decode as integers.
fn extract_column_value(row: &MySqlRow, index: usize) -> Value {
    if let Ok(v) = row.try_get::<Option<i64>, _>(index) {
        return v.map_or(Value::Null, Value::Integer);
    }
    if let Ok(v) = row.try_get::<Option<u64>, _>(index) {
        // Unsigned keys above i64::MAX are kept as text.
        return v.map_or(Value::Null, |n| {
            i64::try_from(n).map_or_else(|_| Value::Text(n.to_string()), Value::Integer)
        });
    }
    if let Ok(v) = row.try_get::<Option<f64>, _>(index) {
        return v.map_or(Value::Null, Value::Float);
    }
    if let Ok(v) = row.try_get::<Option<f32>, _>(index) {
        return v.map_or(Value::Null, |n| Value::Float(f64::from(n)));
    }
    if let Ok(v) = row.try_get::<Option<String>, _>(index) {
        return v.map_or(Value::Null, Value::Text);
    }
    if let Ok(v) = row.try_get::<Option<Vec<u8>>, _>(index) {
        return v.map_or(Value::Null, Value::Bytes);
    }

    Value::Null
}
