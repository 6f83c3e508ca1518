//! End-to-end migration runs over real SQLite databases.

use std::sync::Mutex;

use mysql_sqlite_migrate::{
    DbConnection, MigrateError, MigrationEngine, NullSink, ProgressSink, RunOutcome,
    SchemaAnalyzer,
};
use tokio_util::sync::CancellationToken;

async fn connect(dir: &tempfile::TempDir, file: &str) -> DbConnection {
    let url = format!("sqlite:{}/{}", dir.path().display(), file);
    DbConnection::connect(&url).await.expect("connect sqlite")
}

async fn seed(conn: &mut DbConnection, statements: &[&str]) {
    for sql in statements {
        conn.execute(sql).await.expect(sql);
    }
}

#[tokio::test]
async fn migrates_users_table_with_rows() {
    let dir = tempfile::tempdir().unwrap();
    let mut source = connect(&dir, "src.db").await;
    let mut target = connect(&dir, "tgt.db").await;

    seed(
        &mut source,
        &[
            "CREATE TABLE users (id INTEGER PRIMARY KEY AUTOINCREMENT, name TEXT NOT NULL, active BOOLEAN DEFAULT 1)",
            "INSERT INTO users (name, active) VALUES ('alice', 1)",
            "INSERT INTO users (name, active) VALUES ('bob', 0)",
            "INSERT INTO users (name, active) VALUES ('carol', 1)",
        ],
    )
    .await;

    let engine = MigrationEngine::new();
    let cancel = CancellationToken::new();
    let result = engine.run(&mut source, &mut target, &NullSink, &cancel).await;

    assert!(result.success, "run failed: {:?}", result.error);
    assert_eq!(result.outcome, RunOutcome::Committed);
    // sqlite_sequence exists on the source but is engine-internal.
    assert_eq!(result.tables_total, 1);
    assert_eq!(result.tables_migrated, 1);
    assert_eq!(result.rows_migrated, 3);
    assert!(result.error.is_none());
    assert!(result.finished_at >= result.started_at);

    let count = target
        .fetch_count("SELECT COUNT(*) FROM \"users\"")
        .await
        .unwrap();
    assert_eq!(count, 3);

    // Booleans land as 0/1 integers.
    let ints = target
        .fetch_count("SELECT COUNT(*) FROM \"users\" WHERE typeof(active) = 'integer'")
        .await
        .unwrap();
    assert_eq!(ints, 3);

    // The auto-increment primary key survives the round trip.
    let autoinc = target
        .fetch_count(
            "SELECT COUNT(*) FROM sqlite_master WHERE name = 'users' AND sql LIKE '%AUTOINCREMENT%'",
        )
        .await
        .unwrap();
    assert_eq!(autoinc, 1);

    // Structural fidelity, as the analyzer sees the migrated table.
    let tables = SchemaAnalyzer::analyze(&mut target).await.unwrap();
    assert_eq!(tables.len(), 1);
    let users = &tables[0];
    assert!(users.columns[0].primary_key);
    assert!(!users.columns[1].nullable);
    assert_eq!(users.columns[2].default_value.as_deref(), Some("1"));

    let checks = MigrationEngine::validate(&mut source, &mut target)
        .await
        .unwrap();
    assert!(checks.iter().all(|c| c.matches()));
}

#[tokio::test]
async fn empty_table_is_created_and_counted_as_migrated() {
    let dir = tempfile::tempdir().unwrap();
    let mut source = connect(&dir, "src.db").await;
    let mut target = connect(&dir, "tgt.db").await;

    seed(&mut source, &["CREATE TABLE audit_log (line TEXT)"]).await;

    let engine = MigrationEngine::new();
    let cancel = CancellationToken::new();
    let result = engine.run(&mut source, &mut target, &NullSink, &cancel).await;

    assert!(result.success);
    assert_eq!(result.tables_total, 1);
    assert_eq!(result.tables_migrated, 1);
    assert_eq!(result.rows_migrated, 0);

    let count = target
        .fetch_count("SELECT COUNT(*) FROM \"audit_log\"")
        .await
        .unwrap();
    assert_eq!(count, 0);
}

#[tokio::test]
async fn source_without_tables_completes_with_no_work() {
    let dir = tempfile::tempdir().unwrap();
    let mut source = connect(&dir, "src.db").await;
    let mut target = connect(&dir, "tgt.db").await;

    let engine = MigrationEngine::new();
    let cancel = CancellationToken::new();
    let result = engine.run(&mut source, &mut target, &NullSink, &cancel).await;

    assert!(result.success);
    assert_eq!(result.outcome, RunOutcome::Committed);
    assert_eq!(result.tables_total, 0);
    assert_eq!(result.rows_migrated, 0);
}

/// Records `on_error` messages.
struct ErrorSink {
    errors: Mutex<Vec<String>>,
}

impl ProgressSink for ErrorSink {
    fn on_progress(&self, _message: &str, _fraction: f64) {}
    fn on_table_start(&self, _table: &str, _total_rows: i64) {}
    fn on_table_complete(&self, _table: &str, _migrated_rows: i64) {}
    fn on_error(&self, message: &str, _error: &MigrateError) {
        self.errors.lock().unwrap().push(message.to_string());
    }
}

#[tokio::test]
async fn ddl_failure_on_second_table_aborts_the_run() {
    let dir = tempfile::tempdir().unwrap();
    let mut source = connect(&dir, "src.db").await;
    let mut target = connect(&dir, "tgt.db").await;

    seed(
        &mut source,
        &[
            "CREATE TABLE t_a (x INTEGER)",
            "INSERT INTO t_a VALUES (1)",
            "CREATE TABLE t_b (x INTEGER)",
            "CREATE TABLE t_c (x INTEGER)",
        ],
    )
    .await;

    // DROP TABLE IF EXISTS leaves views alone, so table creation for
    // t_b collides with this.
    seed(&mut target, &["CREATE VIEW t_b AS SELECT 1 AS x"]).await;

    let sink = ErrorSink {
        errors: Mutex::new(Vec::new()),
    };
    let engine = MigrationEngine::new();
    let cancel = CancellationToken::new();
    let result = engine.run(&mut source, &mut target, &sink, &cancel).await;

    assert!(!result.success);
    assert_eq!(result.outcome, RunOutcome::RolledBack);
    assert_eq!(result.tables_total, 3);
    // Schema creation happens before any data copy; nothing migrated.
    assert_eq!(result.tables_migrated, 0);
    assert_eq!(result.rows_migrated, 0);

    let error = result.error.expect("failed run carries a message");
    assert!(error.contains("t_b"), "unexpected message: {}", error);

    let errors = sink.errors.lock().unwrap();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("t_b"));
}

/// Requests cancellation when a progress message with the given prefix
/// arrives.
struct CancelOnPrefix {
    prefix: String,
    token: CancellationToken,
}

impl ProgressSink for CancelOnPrefix {
    fn on_progress(&self, message: &str, _fraction: f64) {
        if message.starts_with(&self.prefix) {
            self.token.cancel();
        }
    }
    fn on_table_start(&self, _table: &str, _total_rows: i64) {}
    fn on_table_complete(&self, _table: &str, _migrated_rows: i64) {}
    fn on_error(&self, _message: &str, _error: &MigrateError) {}
}

#[tokio::test]
async fn cancellation_mid_table_keeps_completed_tables() {
    let dir = tempfile::tempdir().unwrap();
    let mut source = connect(&dir, "src.db").await;
    let mut target = connect(&dir, "tgt.db").await;

    seed(
        &mut source,
        &[
            "CREATE TABLE a_first (n INTEGER)",
            "INSERT INTO a_first VALUES (1), (2), (3)",
            "CREATE TABLE b_big (n INTEGER)",
            "INSERT INTO b_big (n) \
             WITH RECURSIVE cnt(x) AS (SELECT 1 UNION ALL SELECT x + 1 FROM cnt WHERE x < 2500) \
             SELECT x FROM cnt",
        ],
    )
    .await;

    let cancel = CancellationToken::new();
    let sink = CancelOnPrefix {
        prefix: "copying b_big".to_string(),
        token: cancel.clone(),
    };

    let engine = MigrationEngine::new();
    let result = engine.run(&mut source, &mut target, &sink, &cancel).await;

    assert!(!result.success);
    assert_eq!(result.outcome, RunOutcome::Cancelled);
    assert_eq!(result.error.as_deref(), Some("migration cancelled"));

    // The table completed before cancellation stays migrated.
    assert_eq!(result.tables_migrated, 1);
    assert_eq!(result.rows_migrated, 3);
    let kept = target
        .fetch_count("SELECT COUNT(*) FROM \"a_first\"")
        .await
        .unwrap();
    assert_eq!(kept, 3);

    // The interrupted table's uncommitted rows were rolled back.
    let interrupted = target
        .fetch_count("SELECT COUNT(*) FROM \"b_big\"")
        .await
        .unwrap();
    assert_eq!(interrupted, 0);
}

#[tokio::test]
async fn defaults_and_sizes_survive_migration() {
    let dir = tempfile::tempdir().unwrap();
    let mut source = connect(&dir, "src.db").await;
    let mut target = connect(&dir, "tgt.db").await;

    seed(
        &mut source,
        &[
            "CREATE TABLE items (\
               id INTEGER PRIMARY KEY, \
               label VARCHAR(40) DEFAULT 'pending', \
               price DECIMAL(10,2), \
               created TEXT DEFAULT CURRENT_TIMESTAMP)",
            "INSERT INTO items (id, label, price) VALUES (1, 'widget', 12.5)",
        ],
    )
    .await;

    let engine = MigrationEngine::new();
    let cancel = CancellationToken::new();
    let result = engine.run(&mut source, &mut target, &NullSink, &cancel).await;
    assert!(result.success, "run failed: {:?}", result.error);

    let tables = SchemaAnalyzer::analyze(&mut target).await.unwrap();
    let items = &tables[0];

    assert_eq!(items.columns[1].default_value.as_deref(), Some("pending"));
    assert_eq!(
        items.columns[3].default_value.as_deref(),
        Some("CURRENT_TIMESTAMP")
    );

    // Defaults still apply on the target.
    target
        .execute("INSERT INTO \"items\" (id) VALUES (2)")
        .await
        .unwrap();
    let defaulted = target
        .fetch_count("SELECT COUNT(*) FROM \"items\" WHERE id = 2 AND label = 'pending'")
        .await
        .unwrap();
    assert_eq!(defaulted, 1);
}
