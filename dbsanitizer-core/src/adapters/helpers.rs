//! SQL building shared by the store drivers.
//!
//! Every identifier is quoted for the target dialect and every value is
//! bound as a parameter, except NULL which is written literally so that it
//! is accepted by columns of any type.

use crate::models::{DatabaseType, Value};

/// Quotes a possibly schema-qualified identifier (`public.users`).
pub fn quote_identifier(database_type: DatabaseType, identifier: &str) -> String {
    identifier
        .split('.')
        .map(|part| match database_type {
            DatabaseType::MySQL => format!("`{}`", part.replace('`', "``")),
            DatabaseType::PostgreSQL | DatabaseType::SQLite => {
                format!("\"{}\"", part.replace('"', "\"\""))
            }
        })
        .collect::<Vec<_>>()
        .join(".")
}

/// Positional parameter marker, 1-based.
pub fn placeholder(database_type: DatabaseType, index: usize) -> String {
    match database_type {
        DatabaseType::PostgreSQL => format!("${}", index),
        DatabaseType::MySQL | DatabaseType::SQLite => "?".to_string(),
    }
}

/// `SELECT COUNT(*)` for a table.
pub fn count_sql(database_type: DatabaseType, table: &str) -> String {
    format!(
        "SELECT COUNT(*) FROM {}",
        quote_identifier(database_type, table)
    )
}

/// Keyset-paginated chunk query ordered by the key column.
///
/// Binds: the last key seen (only when `after_key` is set), then the limit.
pub fn select_chunk_sql(
    database_type: DatabaseType,
    table: &str,
    key: &str,
    after_key: bool,
) -> String {
    let table = quote_identifier(database_type, table);
    let key = quote_identifier(database_type, key);

    if after_key {
        format!(
            "SELECT * FROM {} WHERE {} > {} ORDER BY {} ASC LIMIT {}",
            table,
            key,
            placeholder(database_type, 1),
            key,
            placeholder(database_type, 2)
        )
    } else {
        format!(
            "SELECT * FROM {} ORDER BY {} ASC LIMIT {}",
            table,
            key,
            placeholder(database_type, 1)
        )
    }
}

/// An UPDATE statement and the values to bind, in order.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateStatement {
    pub sql: String,
    pub binds: Vec<Value>,
}

/// Single-row UPDATE addressed by the key column.
pub fn update_row_sql(
    database_type: DatabaseType,
    table: &str,
    key: &str,
    key_value: &Value,
    assignments: &[(String, Value)],
) -> UpdateStatement {
    let mut binds = Vec::with_capacity(assignments.len().saturating_add(1));
    let mut sets = Vec::with_capacity(assignments.len());

    for (column, value) in assignments {
        let column = quote_identifier(database_type, column);
        if value.is_null() {
            sets.push(format!("{} = NULL", column));
        } else {
            binds.push(value.clone());
            sets.push(format!(
                "{} = {}",
                column,
                placeholder(database_type, binds.len())
            ));
        }
    }

    binds.push(key_value.clone());
    let sql = format!(
        "UPDATE {} SET {} WHERE {} = {}",
        quote_identifier(database_type, table),
        sets.join(", "),
        quote_identifier(database_type, key),
        placeholder(database_type, binds.len())
    );

    UpdateStatement { sql, binds }
}

/// Statement that empties a table.
///
/// SQLite has no TRUNCATE; an unqualified DELETE uses its truncate
/// optimization.
pub fn truncate_sql(database_type: DatabaseType, table: &str) -> String {
    let table = quote_identifier(database_type, table);
    match database_type {
        DatabaseType::SQLite => format!("DELETE FROM {}", table),
        DatabaseType::PostgreSQL | DatabaseType::MySQL => format!("TRUNCATE TABLE {}", table),
    }
}

/// Renders a key value for log lines and error messages.
pub fn describe_key(key: &str, value: &Value) -> String {
    format!("{}={}", key, value)
}
