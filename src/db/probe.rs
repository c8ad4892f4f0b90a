//! One run of the database probe: connect, register cleanup, run CRUD and the
//! read-only display queries.
//!
//! The returned [`DeferredCleanup`] still owns the connection. Whoever renders
//! the report decides when it is dropped; the table stays until then.

use crate::db::cleanup::DeferredCleanup;
use crate::db::connector::Connector;
use crate::db::crud::{generate_table_name, run_crud};
use crate::db::inventory::{current_database, current_user, list_tables};
use crate::db::statement_log::StatementLogger;
use crate::error::{DbError, DbResult};
use crate::models::{
    ConnectedReport, ConnectionConfig, ConnectionTarget, DatabaseType, ProbeReport,
    TableInventory,
};
use std::time::Duration;
use tokio_util::task::TaskTracker;
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct ProbeSettings {
    /// Raw driver name; resolved per run so an unknown driver is a request error
    pub driver: String,
    pub connection: ConnectionConfig,
    pub fallback: ConnectionTarget,
    pub connect_timeout: Duration,
    pub statement_timeout: Duration,
}

impl ProbeSettings {
    /// Driver precondition, checked before any connection attempt.
    pub fn db_type(&self) -> DbResult<DatabaseType> {
        DatabaseType::from_driver_name(&self.driver)
            .ok_or_else(|| DbError::driver_unavailable(self.driver.clone()))
    }

    pub fn targets(&self) -> Vec<ConnectionTarget> {
        self.connection.targets(self.fallback.clone())
    }
}

/// Outcome of [`run_probe`].
#[derive(Debug)]
pub struct ProbeOutcome {
    pub report: ProbeReport,
    /// Present whenever a connection was made
    pub cleanup: Option<DeferredCleanup>,
}

/// Run the probe sequence.
///
/// Fails only on the driver precondition. Connection and statement failures
/// are part of the report. A cleanup that fires on drop is spawned on `cleanups`.
pub async fn run_probe(
    settings: &ProbeSettings,
    cleanups: &TaskTracker,
) -> DbResult<ProbeOutcome> {
    let db_type = settings.db_type()?;
    let connector = Connector::new(db_type, settings.connect_timeout);

    let connected = match connector
        .connect(&settings.connection, &settings.targets())
        .await
    {
        Ok(connected) => connected,
        Err(failure) => {
            warn!(attempts = failure.attempts.len(), "{}", failure);
            return Ok(ProbeOutcome {
                report: ProbeReport::Failed {
                    errors: failure.messages(),
                },
                cleanup: None,
            });
        }
    };

    let table = generate_table_name();
    let mut cleanup = DeferredCleanup::schedule(
        connected.connection,
        &table,
        settings.statement_timeout,
        cleanups.clone(),
    );
    let mut log = StatementLogger::new(settings.statement_timeout);

    let Some(conn) = cleanup.connection() else {
        return Err(DbError::internal("cleanup released the connection early"));
    };

    let crud = run_crud(conn, &table, &mut log).await;

    let current_database = current_database(conn, &mut log).await.unwrap_or_else(|e| {
        warn!(error = %e, "Reading current database failed");
        None
    });
    let current_user = current_user(conn, &mut log).await.unwrap_or_else(|e| {
        warn!(error = %e, "Reading current user failed");
        None
    });
    let tables: TableInventory = list_tables(conn, &mut log).await;

    info!(
        target_addr = %connected.target,
        table = %table,
        crud_ok = crud.succeeded,
        statements = log.len(),
        "Probe finished, cleanup pending"
    );

    let report = ConnectedReport {
        target: connected.target,
        user: settings.connection.user.clone(),
        current_database,
        current_user,
        tables,
        crud,
        cleanup: cleanup.plan().clone(),
        statements: log.into_entries(),
    };

    Ok(ProbeOutcome {
        report: ProbeReport::Connected(Box::new(report)),
        cleanup: Some(cleanup),
    })
}
