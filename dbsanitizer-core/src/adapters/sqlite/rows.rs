//! Value binding and row decoding for SQLite.

use crate::models::{Row, Value};
use sqlx::Row as _;
use sqlx::query::Query;
use sqlx::sqlite::{Sqlite, SqliteArguments, SqliteRow};

/// Binds a value as the next positional parameter.
pub fn bind_value<'q>(
    query: Query<'q, Sqlite, SqliteArguments<'q>>,
    value: &Value,
) -> Query<'q, Sqlite, SqliteArguments<'q>> {
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
pub fn decode_row(row: &SqliteRow) -> Row {
    use sqlx::Column;

    let mut decoded = Row::new();
    for column in row.columns() {
        decoded.push(column.name(), extract_column_value(row, column.ordinal()));
    }
    decoded
}

/// SQLite is dynamically typed, so each storage class is tried in turn.
fn extract_column_value(row: &SqliteRow, index: usize) -> Value {
    if let Ok(v) = row.try_get::<Option<i64>, _>(index) {
        return v.map_or(Value::Null, Value::Integer);
    }
    if let Ok(v) = row.try_get::<Option<f64>, _>(index) {
        return v.map_or(Value::Null, Value::Float);
    }
    if let Ok(v) = row.try_get::<Option<String>, _>(index) {
        return v.map_or(Value::Null, Value::Text);
    }
    if let Ok(v) = row.try_get::<Option<Vec<u8>>, _>(index) {
        return v.map_or(Value::Null, Value::Bytes);
    }

    Value::Null
}
