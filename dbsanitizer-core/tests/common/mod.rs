//! Shared fixtures for the SQLite-backed engine tests.

#![allow(dead_code)]

use async_trait::async_trait;
use dbsanitizer_core::adapters::SanitizerStore;
use dbsanitizer_core::adapters::sqlite::SqliteStore;
use dbsanitizer_core::{
    DatabaseType, FakeKind, ModelRegistry, ProgressSink, Result, Row, TableDefinition, Value,
    ValueRule,
};
use sqlx::SqlitePool;
use std::sync::Mutex;

/// Store calls observed by [`RecordingStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    Count(String),
    Fetch { table: String, rows: usize },
    Update(String),
    Truncate(String),
    SetIntegrity(bool),
    ReadIntegrity,
}

/// SQLite store that records every call it forwards.
pub struct RecordingStore {
    pub inner: SqliteStore,
    events: Mutex<Vec<StoreEvent>>,
}

impl RecordingStore {
    pub fn new(inner: SqliteStore) -> Self {
        Self {
            inner,
            events: Mutex::new(Vec::new()),
        }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.inner.pool
    }

    pub fn events(&self) -> Vec<StoreEvent> {
        self.events.lock().unwrap().clone()
    }

    /// Row counts of the non-empty chunks fetched from `table`.
    pub fn chunk_sizes(&self, table: &str) -> Vec<usize> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                StoreEvent::Fetch { table: t, rows } if t == table && rows > 0 => Some(rows),
                _ => None,
            })
            .collect()
    }

    pub fn integrity_toggles(&self) -> Vec<bool> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                StoreEvent::SetIntegrity(enabled) => Some(enabled),
                _ => None,
            })
            .collect()
    }

    fn record(&self, event: StoreEvent) {
        self.events.lock().unwrap().push(event);
    }
}

#[async_trait]
impl SanitizerStore for RecordingStore {
    async fn test_connection(&self) -> Result<()> {
        self.inner.test_connection().await
    }

    async fn count_rows(&self, table: &str) -> Result<u64> {
        self.record(StoreEvent::Count(table.to_string()));
        self.inner.count_rows(table).await
    }

    async fn fetch_chunk(
        &self,
        table: &str,
        key: &str,
        after: Option<&Value>,
        limit: u32,
    ) -> Result<Vec<Row>> {
        let rows = self.inner.fetch_chunk(table, key, after, limit).await?;
        self.record(StoreEvent::Fetch {
            table: table.to_string(),
            rows: rows.len(),
        });
        Ok(rows)
    }

    async fn update_row(
        &self,
        table: &str,
        key: &str,
        key_value: &Value,
        assignments: &[(String, Value)],
    ) -> Result<u64> {
        self.record(StoreEvent::Update(table.to_string()));
        self.inner
            .update_row(table, key, key_value, assignments)
            .await
    }

    async fn truncate(&self, table: &str) -> Result<()> {
        self.record(StoreEvent::Truncate(table.to_string()));
        self.inner.truncate(table).await
    }

    async fn set_referential_integrity(&self, enabled: bool) -> Result<()> {
        self.record(StoreEvent::SetIntegrity(enabled));
        self.inner.set_referential_integrity(enabled).await
    }

    async fn referential_integrity_enabled(&self) -> Result<bool> {
        self.record(StoreEvent::ReadIntegrity);
        self.inner.referential_integrity_enabled().await
    }

    fn database_type(&self) -> DatabaseType {
        DatabaseType::SQLite
    }

    fn endpoint(&self) -> String {
        self.inner.endpoint()
    }
}

/// Progress sink that keeps every event it receives.
#[derive(Debug, Default)]
pub struct RecordingProgress {
    pub starts: Vec<(String, u64)>,
    pub advances: u64,
    pub finishes: u64,
}

impl ProgressSink for RecordingProgress {
    fn start(&mut self, table: &str, total: u64) {
        self.starts.push((table.to_string(), total));
    }

    fn advance(&mut self) {
        self.advances += 1;
    }

    fn finish(&mut self) {
        self.finishes += 1;
    }
}

/// In-memory shop database:
/// - `users`: 7 rows
/// - `orders`: 3 rows referencing users
/// - `audit_log`: 4 rows referencing users
pub async fn shop_store() -> RecordingStore {
    let store = SqliteStore::new("sqlite::memory:").await.unwrap();
    let pool = &store.pool;

    for ddl in [
        "CREATE TABLE users (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            email TEXT NOT NULL,
            password TEXT,
            api_token TEXT
        )",
        "CREATE TABLE orders (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL REFERENCES users(id),
            note TEXT
        )",
        "CREATE TABLE audit_log (
            id INTEGER PRIMARY KEY,
            user_id INTEGER REFERENCES users(id),
            message TEXT
        )",
    ] {
        sqlx::query(ddl).execute(pool).await.unwrap();
    }

    for id in 1..=7_i64 {
        sqlx::query("INSERT INTO users (id, name, email, password, api_token) VALUES (?, ?, ?, ?, ?)")
            .bind(id)
            .bind(format!("Real Person {}", id))
            .bind(format!("person{}@corp.test", id))
            .bind("hunter2")
            .bind(format!("tok-{}", id))
            .execute(pool)
            .await
            .unwrap();
    }

    for (id, user_id) in [(1_i64, 1_i64), (2, 2), (3, 2)] {
        sqlx::query("INSERT INTO orders (id, user_id, note) VALUES (?, ?, ?)")
            .bind(id)
            .bind(user_id)
            .bind("deliver to back door")
            .execute(pool)
            .await
            .unwrap();
    }

    for id in 1..=4_i64 {
        sqlx::query("INSERT INTO audit_log (id, user_id, message) VALUES (?, ?, ?)")
            .bind(id)
            .bind(1_i64)
            .bind("login")
            .execute(pool)
            .await
            .unwrap();
    }

    RecordingStore::new(store)
}

/// `User` → users (rules), `Order` → orders (rules), `AuditLog` → audit_log (no rules).
pub fn shop_registry() -> ModelRegistry {
    let mut registry = ModelRegistry::new();

    registry
        .register(
            "User",
            TableDefinition::new("users")
                .with_rule("name", ValueRule::fake(FakeKind::Name))
                .unwrap()
                .with_rule("email", ValueRule::template("user{id}@example.com").unwrap())
                .unwrap()
                .with_rule("password", ValueRule::fixed("secret"))
                .unwrap()
                .with_rule("api_token", ValueRule::fixed(Value::Null))
                .unwrap(),
        )
        .unwrap();

    registry
        .register(
            "Order",
            TableDefinition::new("orders")
                .with_rule("note", ValueRule::fixed("redacted"))
                .unwrap(),
        )
        .unwrap();

    registry
        .register("AuditLog", TableDefinition::new("audit_log"))
        .unwrap();

    registry
}

pub async fn column(pool: &SqlitePool, table: &str, column: &str) -> Vec<Option<String>> {
    sqlx::query_scalar(&format!("SELECT {} FROM {} ORDER BY id", column, table))
        .fetch_all(pool)
        .await
        .unwrap()
}

pub async fn count(pool: &SqlitePool, table: &str) -> i64 {
    sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", table))
        .fetch_one(pool)
        .await
        .unwrap()
}

pub async fn foreign_keys_enabled(pool: &SqlitePool) -> bool {
    let enabled: i64 = sqlx::query_scalar("PRAGMA foreign_keys")
        .fetch_one(pool)
        .await
        .unwrap();
    enabled == 1
}

/// Every row of every shop table, for before/after comparisons.
pub async fn snapshot(store: &RecordingStore) -> Vec<Vec<Row>> {
    let mut tables = Vec::new();
    for table in ["users", "orders", "audit_log"] {
        tables.push(store.inner.fetch_chunk(table, "id", None, 1000).await.unwrap());
    }
    tables
}
