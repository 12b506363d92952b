//! Value binding and row decoding for PostgreSQL.

use crate::models::{Row, Value};
use sqlx::Row as _;
use sqlx::postgres::{PgArguments, PgRow, Postgres};
use sqlx::query::Query;

/// Binds a value as the next positional parameter.
///
/// `Text` binds as `TEXT`, so generated UUIDs and addresses only fit text
/// columns; PostgreSQL does not cast them into `uuid` or `inet`.
pub(super) fn bind_value<'q>(
    query: Query<'q, Postgres, PgArguments>,
    value: &Value,
) -> Query<'q, Postgres, PgArguments> {
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
pub(super) fn decode_row(row: &PgRow) -> Row {
    use sqlx::Column;

    let mut decoded = Row::new();
    for column in row.columns() {
        decoded.push(column.name(), extract_column_value(row, column.ordinal()));
    }
    decoded
}

/// Columns of other types (numeric, temporal, json) decode as `Null`.
fn extract_column_value(row: &PgRow, index: usize) -> Value {
    if let Ok(v) = row.try_get::<Option<i64>, _>(index) {
        return v.map_or(Value::Null, Value::Integer);
    }
    if let Ok(v) = row.try_get::<Option<i32>, _>(index) {
        return v.map_or(Value::Null, |n| Value::Integer(i64::from(n)));
    }
    if let Ok(v) = row.try_get::<Option<i16>, _>(index) {
        return v.map_or(Value::Null, |n| Value::Integer(i64::from(n)));
    }
    if let Ok(v) = row.try_get::<Option<f64>, _>(index) {
        return v.map_or(Value::Null, Value::Float);
    }
    if let Ok(v) = row.try_get::<Option<f32>, _>(index) {
        return v.map_or(Value::Null, |n| Value::Float(f64::from(n)));
    }
    if let Ok(v) = row.try_get::<Option<bool>, _>(index) {
        return v.map_or(Value::Null, Value::Bool);
    }
    if let Ok(v) = row.try_get::<Option<String>, _>(index) {
        return v.map_or(Value::Null, Value::Text);
    }
    if let Ok(v) = row.try_get::<Option<Vec<u8>>, _>(index) {
        return v.map_or(Value::Null, Value::Bytes);
    }

    Value::Null
}
