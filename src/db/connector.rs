//! Connection establishment over an ordered list of targets.
//!
//! Every target gets exactly one attempt, bounded by the connect timeout.
//! There is no backoff and a target is never retried; the only redundancy is
//! the target list itself.

use crate::db::connection::DbConnection;
use crate::error::{DbError, DbResult};
use crate::models::{ConnectionConfig, ConnectionTarget, DatabaseType};
use sqlx::ConnectOptions;
use sqlx::mysql::MySqlConnectOptions;
use sqlx::sqlite::SqliteConnectOptions;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{info, warn};

/// Default per-target connect timeout in seconds.
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 5;

/// A failed attempt against one target.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{target} -> {message}")]
pub struct AttemptError {
    pub target: ConnectionTarget,
    pub message: String,
}

/// Every target failed.
#[derive(Debug, Clone, thiserror::Error)]
#[error("All {} connection targets failed", .attempts.len())]
pub struct ConnectFailure {
    /// One entry per attempted target, in attempt order
    pub attempts: Vec<AttemptError>,
}

impl ConnectFailure {
    /// Attempt errors rendered as `host:port -> message`.
    pub fn messages(&self) -> Vec<String> {
        self.attempts.iter().map(ToString::to_string).collect()
    }
}

/// A live connection and the target it was opened against.
#[derive(Debug)]
pub struct Connected {
    pub connection: DbConnection,
    pub target: ConnectionTarget,
    /// Targets that failed before this one
    pub failed_attempts: Vec<AttemptError>,
}

#[derive(Debug, Clone)]
pub struct Connector {
    db_type: DatabaseType,
    connect_timeout: Duration,
}

impl Connector {
    pub fn new(db_type: DatabaseType, connect_timeout: Duration) -> Self {
        Self {
            db_type,
            connect_timeout,
        }
    }

    /// Try `targets` in order until one connection succeeds.
    pub async fn connect(
        &self,
        config: &ConnectionConfig,
        targets: &[ConnectionTarget],
    ) -> Result<Connected, ConnectFailure> {
        let mut attempts = Vec::with_capacity(targets.len());

        for target in targets {
            info!(
                addr = %target,
                db_type = %self.db_type,
                database = %config.database,
                "Connecting to database"
            );

            match self.open(config, target).await {
                Ok(connection) => {
                    info!(addr = %target, "Connected successfully");
                    return Ok(Connected {
                        connection,
                        target: target.clone(),
                        failed_attempts: attempts,
                    });
                }
                Err(e) => {
                    let message = match e {
                        DbError::Connection { message, .. } => message,
                        other => other.to_string(),
                    };
                    warn!(addr = %target, error = %message, "Connection attempt failed");
                    attempts.push(AttemptError {
                        target: target.clone(),
                        message,
                    });
                }
            }
        }

        Err(ConnectFailure { attempts })
    }

    /// Single attempt against one target.
    async fn open(
        &self,
        config: &ConnectionConfig,
        target: &ConnectionTarget,
    ) -> DbResult<DbConnection> {
        let attempt = async {
            match self.db_type {
                DatabaseType::MySQL => {
                    let options = MySqlConnectOptions::new()
                        .host(&target.host)
                        .port(target.port)
                        .username(&config.user)
                        .password(&config.password)
                        .database(&config.database)
                        .charset("utf8mb4");
                    options
                        .connect()
                        .await
                        .map(DbConnection::MySql)
                        .map_err(DbError::from)
                }
                // File databases have no network endpoint; the target only labels the attempt.
                DatabaseType::SQLite => {
                    let options = SqliteConnectOptions::new()
                        .filename(&config.database)
                        .create_if_missing(true);
                    options
                        .connect()
                        .await
                        .map(DbConnection::SQLite)
                        .map_err(DbError::from)
                }
            }
        };

        match timeout(self.connect_timeout, attempt).await {
            Ok(result) => result,
            Err(_) => Err(DbError::timeout("connection attempt", self.connect_timeout)),
        }
    }
}
