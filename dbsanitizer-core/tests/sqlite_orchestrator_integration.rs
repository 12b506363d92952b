//! End-to-end engine runs against an in-memory SQLite database.

#![cfg(feature = "sqlite")]

mod common;

use common::{
    RecordingProgress, StoreEvent, column, count, foreign_keys_enabled, shop_registry, shop_store,
    snapshot,
};
use dbsanitizer_core::engine::{FixedAnswer, NoProgress, Orchestrator, PlannedAction};
use dbsanitizer_core::{
    FakeKind, ModelRegistry, RunConfiguration, RunOutcome, RunState, SanitizerConfig,
    TableDefinition, Value, ValueRule,
};

fn sanitize_users_and_orders() -> RunConfiguration {
    RunConfiguration::new()
        .with_sanitize_list(["User", "Order"])
        .with_truncate_list(["AuditLog"])
        .with_chunk_size(3)
        .with_seed(Some(42))
}

#[tokio::test]
async fn test_sqlite_sweep_visits_every_row_in_chunks() {
    let store = shop_store().await;
    let registry = shop_registry();

    let mut orchestrator = Orchestrator::new(&store, &registry, sanitize_users_and_orders());
    let report = orchestrator
        .run(&mut FixedAnswer(true), &mut NoProgress)
        .await
        .unwrap();

    assert_eq!(report.outcome, RunOutcome::Completed);
    assert_eq!(orchestrator.state(), RunState::Done);

    assert_eq!(store.chunk_sizes("users"), vec![3, 3, 1]);
    assert_eq!(store.chunk_sizes("orders"), vec![3]);

    let users = &report.sanitized[0];
    assert_eq!(users.table_name, "users");
    assert_eq!(users.stats.rows, 7);
    assert_eq!(users.stats.chunks, 3);
    assert_eq!(report.rows_sanitized(), 10);

    let updates = store
        .events()
        .iter()
        .filter(|e| **e == StoreEvent::Update("users".to_string()))
        .count();
    assert_eq!(updates, 7);
}

#[tokio::test]
async fn test_sqlite_rules_applied_to_all_rows() {
    let store = shop_store().await;
    let registry = shop_registry();

    let mut orchestrator = Orchestrator::new(&store, &registry, sanitize_users_and_orders());
    orchestrator
        .run(&mut FixedAnswer(true), &mut NoProgress)
        .await
        .unwrap();

    let pool = store.pool();
    let emails = column(pool, "users", "email").await;
    let expected: Vec<Option<String>> = (1..=7)
        .map(|id| Some(format!("user{}@example.com", id)))
        .collect();
    assert_eq!(emails, expected);

    assert!(
        column(pool, "users", "password")
            .await
            .iter()
            .all(|p| p.as_deref() == Some("secret"))
    );
    assert!(
        column(pool, "users", "api_token")
            .await
            .iter()
            .all(Option::is_none)
    );
    assert!(
        column(pool, "users", "name")
            .await
            .iter()
            .all(|n| n.as_deref().is_some_and(|n| !n.starts_with("Real Person")))
    );
    assert!(
        column(pool, "orders", "note")
            .await
            .iter()
            .all(|n| n.as_deref() == Some("redacted"))
    );

    // columns without rules are untouched
    let user_ids: Vec<i64> = sqlx::query_scalar("SELECT user_id FROM orders ORDER BY id")
        .fetch_all(pool)
        .await
        .unwrap();
    assert_eq!(user_ids, vec![1, 2, 2]);

    assert_eq!(count(pool, "audit_log").await, 0);
}

#[tokio::test]
async fn test_sqlite_seeded_runs_are_reproducible() {
    let mut names = Vec::new();
    for _ in 0..2 {
        let store = shop_store().await;
        let registry = shop_registry();
        let mut orchestrator = Orchestrator::new(&store, &registry, sanitize_users_and_orders());
        orchestrator
            .run(&mut FixedAnswer(true), &mut NoProgress)
            .await
            .unwrap();
        names.push(column(store.pool(), "users", "name").await);
    }

    assert_eq!(names[0], names[1]);
}

#[tokio::test]
async fn test_sqlite_table_filter_restricts_sanitize_only() {
    let store = shop_store().await;
    let registry = shop_registry();
    let config = sanitize_users_and_orders().with_table_filter(["users"]);

    let mut orchestrator = Orchestrator::new(&store, &registry, config);
    let report = orchestrator
        .run(&mut FixedAnswer(true), &mut NoProgress)
        .await
        .unwrap();

    assert_eq!(report.sanitized.len(), 1);
    assert_eq!(report.filtered_out, vec!["orders"]);
    assert_eq!(report.truncated, vec!["audit_log"]);

    let pool = store.pool();
    assert!(
        column(pool, "orders", "note")
            .await
            .iter()
            .all(|n| n.as_deref() == Some("deliver to back door"))
    );
    assert!(store.chunk_sizes("orders").is_empty());
    assert_eq!(count(pool, "audit_log").await, 0);
}

#[tokio::test]
async fn test_sqlite_truncate_only_parent_table_with_children() {
    let store = shop_store().await;
    let registry = shop_registry();
    let config = RunConfiguration::new()
        .with_sanitize_list(["User"])
        .with_truncate_list(["User"])
        .with_truncate_only(true);

    let pool = store.pool();
    assert!(foreign_keys_enabled(pool).await);

    let mut orchestrator = Orchestrator::new(&store, &registry, config);
    let report = orchestrator
        .run(&mut FixedAnswer(true), &mut NoProgress)
        .await
        .unwrap();

    assert_eq!(report.outcome, RunOutcome::Completed);
    assert!(report.sanitized.is_empty());
    assert_eq!(report.truncated, vec!["users"]);
    assert!(report.failed.is_empty());

    assert_eq!(count(pool, "users").await, 0);
    assert_eq!(count(pool, "orders").await, 3);
    assert!(store.chunk_sizes("users").is_empty());

    assert_eq!(store.integrity_toggles(), vec![false, true]);
    assert!(foreign_keys_enabled(pool).await);
}

#[tokio::test]
async fn test_sqlite_info_report_changes_nothing() {
    let store = shop_store().await;
    let registry = shop_registry();
    let before = snapshot(&store).await;

    let config = sanitize_users_and_orders()
        .with_sanitize_list(["User", "Order", "Ghost"])
        .with_table_filter(["users"])
        .with_info_only(true);
    let mut orchestrator = Orchestrator::new(&store, &registry, config);

    // a decline would abort; info mode never asks
    let report = orchestrator
        .run(&mut FixedAnswer(false), &mut NoProgress)
        .await
        .unwrap();

    assert_eq!(report.outcome, RunOutcome::InfoReport);
    assert_eq!(snapshot(&store).await, before);
    assert!(store.integrity_toggles().is_empty());
    assert!(
        !store
            .events()
            .iter()
            .any(|e| matches!(e, StoreEvent::Update(_) | StoreEvent::Truncate(_)))
    );

    let sanitize: Vec<_> = report
        .planned
        .iter()
        .filter(|t| t.action == PlannedAction::Sanitize)
        .map(|t| (t.table_name.as_str(), t.row_count))
        .collect();
    assert_eq!(sanitize, vec![("users", 7), ("orders", 3)]);

    let truncate: Vec<_> = report
        .planned
        .iter()
        .filter(|t| t.action == PlannedAction::Truncate)
        .map(|t| t.table_name.as_str())
        .collect();
    assert_eq!(truncate, vec!["audit_log"]);

    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].reference, "Ghost");
}

#[tokio::test]
async fn test_sqlite_declined_run_touches_nothing() {
    let store = shop_store().await;
    let registry = shop_registry();
    let before = snapshot(&store).await;

    let mut orchestrator = Orchestrator::new(&store, &registry, sanitize_users_and_orders());
    let report = orchestrator
        .run(&mut FixedAnswer(false), &mut NoProgress)
        .await
        .unwrap();

    assert_eq!(report.outcome, RunOutcome::Aborted);
    assert_eq!(orchestrator.state(), RunState::Aborted);
    assert_eq!(report.summary(), "Aborted, no changes made");
    assert_eq!(snapshot(&store).await, before);
    assert!(store.integrity_toggles().is_empty());
}

#[tokio::test]
async fn test_sqlite_failed_table_releases_guard_and_continues() {
    let store = shop_store().await;
    let mut registry = ModelRegistry::new();
    registry
        .register(
            "User",
            TableDefinition::new("users")
                .with_rule("email", ValueRule::fixed(Value::Null))
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

    let config = RunConfiguration::new().with_sanitize_list(["User", "Order"]);
    let mut orchestrator = Orchestrator::new(&store, &registry, config);
    let report = orchestrator
        .run(&mut FixedAnswer(true), &mut NoProgress)
        .await
        .unwrap();

    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].reference, "User");
    assert!(report.failed[0].reason.contains("id=1"));

    assert_eq!(report.sanitized.len(), 1);
    assert_eq!(report.sanitized[0].table_name, "orders");

    let pool = store.pool();
    assert!(
        column(pool, "users", "email")
            .await
            .iter()
            .all(|e| e.as_deref().is_some_and(|e| e.ends_with("@corp.test")))
    );
    assert!(
        column(pool, "orders", "note")
            .await
            .iter()
            .all(|n| n.as_deref() == Some("redacted"))
    );

    assert_eq!(store.integrity_toggles(), vec![false, true]);
    assert!(foreign_keys_enabled(pool).await);
}

/// Email rule that writes NULL, rejected by `NOT NULL`, for one key.
fn email_rule_failing_at(failing_id: i64) -> ValueRule {
    ValueRule::derived(move |row, _| match row.get("id") {
        Some(Value::Integer(id)) if *id == failing_id => Value::Null,
        Some(id) => Value::Text(format!("user{}@example.com", id)),
        None => Value::Null,
    })
}

#[tokio::test]
async fn test_sqlite_failure_mid_table_keeps_earlier_chunks() {
    let store = shop_store().await;
    let mut registry = ModelRegistry::new();
    registry
        .register(
            "User",
            TableDefinition::new("users")
                .with_rule("email", email_rule_failing_at(5))
                .unwrap(),
        )
        .unwrap();

    let config = RunConfiguration::new()
        .with_sanitize_list(["User"])
        .with_chunk_size(3);
    let mut progress = RecordingProgress::default();
    let mut orchestrator = Orchestrator::new(&store, &registry, config);
    let report = orchestrator
        .run(&mut FixedAnswer(true), &mut progress)
        .await
        .unwrap();

    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].reference, "User");
    assert!(report.failed[0].reason.contains("id=5"), "{}", report.failed[0].reason);
    assert!(report.sanitized.is_empty());

    // The third chunk is never fetched.
    assert_eq!(store.chunk_sizes("users"), vec![3, 3]);

    let emails = column(store.pool(), "users", "email").await;
    let expected: Vec<Option<String>> = (1..=7)
        .map(|id| {
            Some(if id <= 4 {
                format!("user{}@example.com", id)
            } else {
                format!("person{}@corp.test", id)
            })
        })
        .collect();
    assert_eq!(emails, expected);

    assert_eq!(progress.starts, vec![("users".to_string(), 7)]);
    assert_eq!(progress.advances, 4);
    assert_eq!(progress.finishes, 1);

    assert_eq!(store.integrity_toggles(), vec![false, true]);
    assert!(foreign_keys_enabled(store.pool()).await);
}

#[tokio::test]
async fn test_sqlite_progress_reports_each_table_sweep() {
    let store = shop_store().await;
    let registry = shop_registry();

    let mut progress = RecordingProgress::default();
    let mut orchestrator = Orchestrator::new(&store, &registry, sanitize_users_and_orders());
    let report = orchestrator
        .run(&mut FixedAnswer(true), &mut progress)
        .await
        .unwrap();

    assert_eq!(report.outcome, RunOutcome::Completed);
    assert_eq!(
        progress.starts,
        vec![("users".to_string(), 7), ("orders".to_string(), 3)]
    );
    assert_eq!(progress.advances, 10);
    assert_eq!(progress.finishes, 2);
}

#[tokio::test]
async fn test_sqlite_rejected_truncate_does_not_stop_the_next() {
    let store = shop_store().await;
    sqlx::query("CREATE VIEW user_emails AS SELECT id, email FROM users")
        .execute(store.pool())
        .await
        .unwrap();

    let mut registry = shop_registry();
    registry
        .register("UserEmail", TableDefinition::new("user_emails"))
        .unwrap();

    let config = RunConfiguration::new()
        .with_truncate_list(["UserEmail", "AuditLog"])
        .with_truncate_only(true);
    let mut orchestrator = Orchestrator::new(&store, &registry, config);
    let report = orchestrator
        .run(&mut FixedAnswer(true), &mut NoProgress)
        .await
        .unwrap();

    assert_eq!(report.outcome, RunOutcome::Completed);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].reference, "UserEmail");
    assert!(report.failed[0].reason.contains("user_emails"));
    assert_eq!(report.truncated, vec!["audit_log"]);

    assert_eq!(count(store.pool(), "audit_log").await, 0);
    assert_eq!(count(store.pool(), "users").await, 7);
    assert!(foreign_keys_enabled(store.pool()).await);
}

#[tokio::test]
async fn test_sqlite_template_with_unknown_column_fails_table() {
    let store = shop_store().await;
    let mut registry = ModelRegistry::new();
    registry
        .register(
            "User",
            TableDefinition::new("users")
                .with_rule("email", ValueRule::template("user{idd}@example.com").unwrap())
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

    let config = RunConfiguration::new().with_sanitize_list(["User", "Order"]);
    let mut orchestrator = Orchestrator::new(&store, &registry, config);
    let report = orchestrator
        .run(&mut FixedAnswer(true), &mut NoProgress)
        .await
        .unwrap();

    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].reference, "User");
    assert!(report.failed[0].reason.contains("'idd'"), "{}", report.failed[0].reason);
    assert_eq!(report.sanitized.len(), 1);
    assert_eq!(report.sanitized[0].table_name, "orders");

    let updates = store
        .events()
        .iter()
        .filter(|e| **e == StoreEvent::Update("users".to_string()))
        .count();
    assert_eq!(updates, 0);
    assert!(
        column(store.pool(), "users", "email")
            .await
            .iter()
            .all(|e| e.as_deref().is_some_and(|e| e.ends_with("@corp.test")))
    );
}

#[tokio::test]
async fn test_sqlite_rule_for_missing_column_fails_table() {
    let store = shop_store().await;
    let mut registry = ModelRegistry::new();
    registry
        .register(
            "User",
            TableDefinition::new("users")
                .with_rule("name", ValueRule::fixed("Anon"))
                .unwrap()
                .with_rule("phone", ValueRule::fake(FakeKind::PhoneNumber))
                .unwrap(),
        )
        .unwrap();

    let config = RunConfiguration::new().with_sanitize_list(["User"]);
    let mut orchestrator = Orchestrator::new(&store, &registry, config);
    let report = orchestrator
        .run(&mut FixedAnswer(true), &mut NoProgress)
        .await
        .unwrap();

    assert_eq!(report.failed.len(), 1);
    assert!(report.failed[0].reason.contains("'phone'"));
    assert!(
        column(store.pool(), "users", "name")
            .await
            .iter()
            .all(|n| n.as_deref().is_some_and(|n| n.starts_with("Real Person")))
    );
}

#[tokio::test]
async fn test_sqlite_unknown_reference_is_skipped() {
    let store = shop_store().await;
    let registry = shop_registry();
    let config = RunConfiguration::new().with_sanitize_list(["Ghost", "Order"]);

    let mut orchestrator = Orchestrator::new(&store, &registry, config);
    let report = orchestrator
        .run(&mut FixedAnswer(true), &mut NoProgress)
        .await
        .unwrap();

    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].reference, "Ghost");
    assert!(report.failed.is_empty());
    assert_eq!(report.sanitized.len(), 1);
    assert!(report.summary().contains("1 skipped"));
}

#[tokio::test]
async fn test_sqlite_missing_rule_set_is_skipped() {
    let store = shop_store().await;
    let registry = shop_registry();
    let config = RunConfiguration::new().with_sanitize_list(["AuditLog", "Order"]);

    let mut orchestrator = Orchestrator::new(&store, &registry, config);
    let report = orchestrator
        .run(&mut FixedAnswer(true), &mut NoProgress)
        .await
        .unwrap();

    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].reference, "AuditLog");
    assert!(store.chunk_sizes("audit_log").is_empty());
    assert_eq!(count(store.pool(), "audit_log").await, 4);
    assert_eq!(report.sanitized.len(), 1);
}

#[tokio::test]
async fn test_sqlite_resolution_is_idempotent() {
    let store = shop_store().await;
    let registry = shop_registry();
    let config = RunConfiguration::new()
        .with_sanitize_list(["User", "User"])
        .with_info_only(true);

    let mut orchestrator = Orchestrator::new(&store, &registry, config);
    let report = orchestrator
        .run(&mut FixedAnswer(true), &mut NoProgress)
        .await
        .unwrap();

    assert_eq!(report.planned.len(), 2);
    assert_eq!(report.planned[0], report.planned[1]);
}

#[tokio::test]
async fn test_sqlite_empty_list_is_noop() {
    let store = shop_store().await;
    let registry = shop_registry();
    let config = RunConfiguration::new().with_truncate_list(["AuditLog"]);

    let mut orchestrator = Orchestrator::new(&store, &registry, config);
    let report = orchestrator
        .run(&mut FixedAnswer(true), &mut NoProgress)
        .await
        .unwrap();

    assert_eq!(report.outcome, RunOutcome::NoOp);
    assert!(store.integrity_toggles().is_empty());
    assert_eq!(count(store.pool(), "audit_log").await, 4);
}

#[tokio::test]
async fn test_sqlite_single_row_chunks() {
    let store = shop_store().await;
    let mut registry = ModelRegistry::new();
    registry
        .register(
            "Note",
            TableDefinition::new("orders")
                .with_rule("note", ValueRule::fake(FakeKind::Sentence))
                .unwrap(),
        )
        .unwrap();

    let config = RunConfiguration::new()
        .with_sanitize_list(["Note"])
        .with_chunk_size(1);
    let mut orchestrator = Orchestrator::new(&store, &registry, config);
    let report = orchestrator
        .run(&mut FixedAnswer(true), &mut NoProgress)
        .await
        .unwrap();

    assert_eq!(report.sanitized[0].stats.rows, 3);
    assert_eq!(report.sanitized[0].stats.chunks, 3);
    assert_eq!(store.chunk_sizes("orders"), vec![1, 1, 1]);
}

#[tokio::test]
async fn test_sqlite_run_from_toml_configuration() {
    let store = shop_store().await;
    let file = SanitizerConfig::from_toml_str(
        r#"
sanitize_models = ["User"]
truncate_models = ["AuditLog"]
chunk_count = 2
seed = 9

[models.User]
table = "users"

[models.User.sanitize]
email = { template = "user{id}@example.com" }
password = "secret"
api_token = { null = true }

[models.AuditLog]
table = "audit_log"
"#,
    )
    .unwrap();

    let (registry, config) = file.into_parts().unwrap();
    let mut orchestrator = Orchestrator::new(&store, &registry, config);
    let report = orchestrator
        .run(&mut FixedAnswer(true), &mut NoProgress)
        .await
        .unwrap();

    assert_eq!(report.outcome, RunOutcome::Completed);
    assert_eq!(store.chunk_sizes("users"), vec![2, 2, 2, 1]);

    let pool = store.pool();
    assert_eq!(
        column(pool, "users", "email").await[6].as_deref(),
        Some("user7@example.com")
    );
    assert_eq!(count(pool, "audit_log").await, 0);
    assert!(report.summary().starts_with("Sanitized 1 table(s) (7 rows), truncated 1 table(s)"));
}
