//! Integration tests for ordered connection attempts.
//!
//! Unreachable targets are simulated with freshly released local ports, so no
//! database server is needed.

use db_crud_probe::db::{Connector, ProbeSettings, run_probe};
use db_crud_probe::models::{ConnectionConfig, ConnectionTarget, DatabaseType, ProbeReport};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio_util::task::TaskTracker;

/// Reserve two distinct local ports and release them, leaving nothing listening there.
async fn closed_ports() -> (u16, u16) {
    let first = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let second = TcpListener::bind("127.0.0.1:0").await.unwrap();
    (
        first.local_addr().unwrap().port(),
        second.local_addr().unwrap().port(),
    )
}

fn mysql_config(port: u16) -> ConnectionConfig {
    ConnectionConfig::resolve(
        Some("127.0.0.1".to_string()),
        Some(port.to_string()),
        None,
        None,
        None,
    )
}

#[tokio::test]
async fn test_all_targets_fail_in_order() {
    let (primary, fallback) = closed_ports().await;
    let config = mysql_config(primary);
    let targets = config.targets(ConnectionTarget::new("127.0.0.1", fallback));

    let connector = Connector::new(DatabaseType::MySQL, Duration::from_secs(2));
    let failure = connector.connect(&config, &targets).await.unwrap_err();

    assert_eq!(failure.attempts.len(), 2);
    assert_eq!(failure.attempts[0].target.port, primary);
    assert_eq!(failure.attempts[1].target.port, fallback);

    let messages = failure.messages();
    assert!(messages[0].starts_with(&format!("127.0.0.1:{primary} -> ")));
    assert!(messages[1].starts_with(&format!("127.0.0.1:{fallback} -> ")));
    assert!(failure.to_string().contains("All 2 connection targets failed"));
}

#[tokio::test]
async fn test_probe_reports_failed_connection() {
    let (primary, fallback) = closed_ports().await;
    let settings = ProbeSettings {
        driver: "mysql".to_string(),
        connection: mysql_config(primary),
        fallback: ConnectionTarget::new("127.0.0.1", fallback),
        connect_timeout: Duration::from_secs(2),
        statement_timeout: Duration::from_secs(2),
    };

    let outcome = run_probe(&settings, &TaskTracker::new()).await.unwrap();
    assert!(outcome.cleanup.is_none());
    match outcome.report {
        ProbeReport::Failed { errors } => assert_eq!(errors.len(), 2),
        ProbeReport::Connected(_) => panic!("expected connection failure"),
    }
}

#[tokio::test]
async fn test_sqlite_connects_on_first_target() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("first.db");
    let config = ConnectionConfig::resolve(
        None,
        None,
        None,
        None,
        Some(path.to_string_lossy().into_owned()),
    );
    let targets = config.targets(ConnectionTarget::fallback());

    let connector = Connector::new(DatabaseType::SQLite, Duration::from_secs(2));
    let connected = connector.connect(&config, &targets).await.unwrap();

    assert_eq!(connected.target, targets[0]);
    assert!(connected.failed_attempts.is_empty());
    connected.connection.close().await.unwrap();
}
