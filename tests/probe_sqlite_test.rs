//! Integration tests for the probe sequence against a SQLite file database.
//!
//! These tests run the full connect, CRUD and display-query sequence and then
//! verify that the deferred cleanup removes the ephemeral table.

use db_crud_probe::db::crud::{FIRST_ROW, QTY_INCREMENT, SECOND_ROW, is_probe_table_name};
use db_crud_probe::db::{Connector, ProbeSettings, StatementLogger, run_crud, run_probe};
use db_crud_probe::models::{
    ConnectedReport, ConnectionConfig, ConnectionTarget, DatabaseType, ProbeReport,
};
use sqlx::Connection;
use sqlx::sqlite::SqliteConnection;
use std::time::Duration;
use tempfile::TempDir;
use tokio_util::task::TaskTracker;

/// Helper to build probe settings for a database file inside `dir`.
fn sqlite_settings(dir: &TempDir) -> ProbeSettings {
    let path = dir.path().join("probe.db");
    ProbeSettings {
        driver: "sqlite".to_string(),
        connection: ConnectionConfig::resolve(
            None,
            None,
            None,
            None,
            Some(path.to_string_lossy().into_owned()),
        ),
        fallback: ConnectionTarget::fallback(),
        connect_timeout: Duration::from_secs(5),
        statement_timeout: Duration::from_secs(5),
    }
}

fn connected(report: ProbeReport) -> ConnectedReport {
    match report {
        ProbeReport::Connected(report) => *report,
        ProbeReport::Failed { errors } => panic!("probe failed to connect: {errors:?}"),
    }
}

async fn table_exists(settings: &ProbeSettings, table: &str) -> bool {
    let url = format!("sqlite://{}", settings.connection.database);
    let mut conn = SqliteConnection::connect(&url).await.unwrap();
    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?")
            .bind(table)
            .fetch_one(&mut conn)
            .await
            .unwrap();
    conn.close().await.unwrap();
    count > 0
}

#[tokio::test]
async fn test_probe_runs_crud_sequence() {
    let dir = TempDir::new().unwrap();
    let settings = sqlite_settings(&dir);

    let outcome = run_probe(&settings, &TaskTracker::new()).await.unwrap();
    let cleanup = outcome.cleanup.expect("cleanup registered");
    let report = connected(outcome.report);

    assert!(report.is_ok(), "crud errors: {:?}", report.crud.errors);
    assert!(is_probe_table_name(&report.crud.table_name));
    assert_eq!(report.target.to_string(), "db:3306");

    let crud = &report.crud;
    assert_eq!(crud.rows_after_insert.len(), 2);
    assert_eq!(crud.rows_after_insert[0].name, FIRST_ROW.0);
    assert_eq!(crud.rows_after_insert[0].qty, FIRST_ROW.1);
    assert_eq!(crud.rows_after_insert[1].name, SECOND_ROW.0);
    assert_eq!(crud.rows_after_insert[1].qty, SECOND_ROW.1);

    assert_eq!(crud.rows_after_update.len(), 2);
    assert_eq!(crud.rows_after_update[0].qty, FIRST_ROW.1 + QTY_INCREMENT);
    assert_eq!(crud.rows_after_update[1].qty, SECOND_ROW.1);

    assert_eq!(crud.rows_after_delete.len(), 1);
    assert_eq!(crud.rows_after_delete[0].name, FIRST_ROW.0);
    assert_eq!(crud.rows_after_delete[0].qty, 17);

    let (first_id, _) = crud.inserted_ids.unwrap();
    assert_eq!(crud.rows_after_delete[0].id, first_id);

    // 8 CRUD statements plus the three display queries
    assert_eq!(report.statements.len(), 11);
    assert!(report.statements[0].sql.starts_with("CREATE TABLE"));
    assert_eq!(report.statements[1].params_json(), r#"["Apfel",10]"#);

    assert_eq!(report.current_database.as_deref(), Some("main"));
    assert_eq!(report.current_user, None);
    assert_eq!(report.tables.total, 1);
    assert_eq!(report.tables.names, vec![report.crud.table_name.clone()]);

    assert!(report.cleanup.drop_planned());
    assert!(!report.cleanup.executed);

    drop(cleanup);
}

#[tokio::test]
async fn test_table_survives_until_cleanup_runs() {
    let dir = TempDir::new().unwrap();
    let settings = sqlite_settings(&dir);

    let outcome = run_probe(&settings, &TaskTracker::new()).await.unwrap();
    let cleanup = outcome.cleanup.unwrap();
    let table = cleanup.table_name().unwrap().to_string();

    assert!(table_exists(&settings, &table).await);

    let plan = cleanup.run().await;
    assert!(plan.executed);
    assert_eq!(plan.error, None);
    assert!(!table_exists(&settings, &table).await);
}

#[tokio::test]
async fn test_dropping_guard_drops_table() {
    let dir = TempDir::new().unwrap();
    let settings = sqlite_settings(&dir);
    let cleanups = TaskTracker::new();

    let outcome = run_probe(&settings, &cleanups).await.unwrap();
    let cleanup = outcome.cleanup.unwrap();
    let table = cleanup.table_name().unwrap().to_string();

    drop(cleanup);
    assert_eq!(cleanups.len(), 1);
    cleanups.close();
    tokio::time::timeout(Duration::from_secs(5), cleanups.wait())
        .await
        .unwrap();

    assert!(!table_exists(&settings, &table).await);
}

#[tokio::test]
async fn test_failed_drop_is_recorded() {
    let dir = TempDir::new().unwrap();
    let settings = sqlite_settings(&dir);

    let outcome = run_probe(&settings, &TaskTracker::new()).await.unwrap();
    let mut cleanup = outcome.cleanup.unwrap();
    let table = cleanup.table_name().unwrap().to_string();

    cleanup
        .connection()
        .unwrap()
        .execute("PRAGMA query_only = ON", &[], Duration::from_secs(5))
        .await
        .unwrap();

    let plan = cleanup.run().await;
    assert!(plan.executed);
    assert!(plan.error.is_some(), "drop should have failed");
    assert!(table_exists(&settings, &table).await);
}

#[tokio::test]
async fn test_crud_aborts_on_first_failure() {
    let dir = TempDir::new().unwrap();
    let settings = sqlite_settings(&dir);
    let table = "dbtest_tmp_deadbeef";

    let url = format!("sqlite://{}?mode=rwc", settings.connection.database);
    let mut setup = SqliteConnection::connect(&url).await.unwrap();
    sqlx::query(&format!(
        "CREATE TABLE `{table}` (id INTEGER PRIMARY KEY, name TEXT, qty INTEGER)"
    ))
    .execute(&mut setup)
    .await
    .unwrap();
    sqlx::query(&format!("INSERT INTO `{table}` (name, qty) VALUES ('Keep', 1)"))
        .execute(&mut setup)
        .await
        .unwrap();

    let connector = Connector::new(DatabaseType::SQLite, Duration::from_secs(5));
    let mut connected = connector
        .connect(&settings.connection, &settings.targets())
        .await
        .unwrap();
    let mut log = StatementLogger::new(Duration::from_secs(5));

    let result = run_crud(&mut connected.connection, table, &mut log).await;

    assert!(!result.succeeded);
    assert_eq!(result.errors.len(), 1);
    assert!(result.errors[0].contains("already exists"), "{:?}", result.errors);
    assert_eq!(result.inserted_ids, None);
    assert!(result.rows_after_insert.is_empty());
    assert!(result.rows_after_update.is_empty());
    assert!(result.rows_after_delete.is_empty());
    // The failing CREATE is not logged
    assert!(log.is_empty());

    let count: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM `{table}`"))
        .fetch_one(&mut setup)
        .await
        .unwrap();
    assert_eq!(count, 1);

    connected.connection.close().await.unwrap();
    setup.close().await.unwrap();
}

#[tokio::test]
async fn test_consecutive_runs_use_fresh_tables() {
    let dir = TempDir::new().unwrap();
    let settings = sqlite_settings(&dir);

    let first = run_probe(&settings, &TaskTracker::new()).await.unwrap();
    let first_plan = first.cleanup.unwrap().run().await;
    let first = connected(first.report);

    let second = run_probe(&settings, &TaskTracker::new()).await.unwrap();
    let second_plan = second.cleanup.unwrap().run().await;
    let second = connected(second.report);

    assert!(first.is_ok());
    assert!(second.is_ok());
    assert_ne!(first.crud.table_name, second.crud.table_name);
    assert_eq!(first_plan.error, None);
    assert_eq!(second_plan.error, None);
    // Only the second run's own table is visible to its inventory
    assert_eq!(second.tables.total, 1);
}

#[tokio::test]
async fn test_existing_tables_are_listed_naturally() {
    let dir = TempDir::new().unwrap();
    let settings = sqlite_settings(&dir);

    let url = format!("sqlite://{}?mode=rwc", settings.connection.database);
    let mut conn = SqliteConnection::connect(&url).await.unwrap();
    for name in ["t10", "T2", "t1"] {
        sqlx::query(&format!("CREATE TABLE {name} (id INTEGER)"))
            .execute(&mut conn)
            .await
            .unwrap();
    }
    conn.close().await.unwrap();

    let outcome = run_probe(&settings, &TaskTracker::new()).await.unwrap();
    outcome.cleanup.unwrap().run().await;
    let report = connected(outcome.report);

    assert_eq!(report.tables.total, 4);
    let expected = vec![
        report.crud.table_name.clone(),
        "t1".to_string(),
        "T2".to_string(),
        "t10".to_string(),
    ];
    assert_eq!(report.tables.names, expected);
}
