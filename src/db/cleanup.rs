//! Deferred drop of the ephemeral table.
//!
//! A [`DeferredCleanup`] is registered right after connecting and owns the
//! connection from then on; the CRUD runner only borrows it. The drop runs
//! exactly once, either through [`DeferredCleanup::run`] or when the
//! registration is dropped. The web layer ties that drop to the end of the
//! response body, so the table outlives everything rendered from it.
//!
//! Drops triggered by `Drop` are spawned on a [`TaskTracker`] shared with the
//! server, which waits for them before the process exits.
//!
//! Failures are recorded in the returned [`CleanupPlan`] and logged. They are
//! never raised: by the time the drop runs nothing can be shown to the client.

use crate::db::connection::DbConnection;
use crate::db::crud::drop_table_sql;
use crate::models::CleanupPlan;
use std::time::Duration;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, warn};

#[derive(Debug)]
pub struct DeferredCleanup {
    connection: Option<DbConnection>,
    plan: CleanupPlan,
    statement_timeout: Duration,
    tasks: TaskTracker,
}

impl DeferredCleanup {
    /// Register the drop of `table`, taking ownership of the connection.
    pub fn schedule(
        connection: DbConnection,
        table: impl Into<String>,
        statement_timeout: Duration,
        tasks: TaskTracker,
    ) -> Self {
        let plan = CleanupPlan::scheduled(table);
        debug!(table = ?plan.table_name, "Cleanup scheduled");
        Self {
            connection: Some(connection),
            plan,
            statement_timeout,
            tasks,
        }
    }

    /// The plan as it stands before the drop ran.
    pub fn plan(&self) -> &CleanupPlan {
        &self.plan
    }

    pub fn table_name(&self) -> Option<&str> {
        self.plan.table_name.as_deref()
    }

    /// Borrow the connection for work that must happen before the drop.
    pub fn connection(&mut self) -> Option<&mut DbConnection> {
        self.connection.as_mut()
    }

    /// Drop the table now and return the final plan.
    pub async fn run(mut self) -> CleanupPlan {
        let connection = self.connection.take();
        execute(connection, self.plan.clone(), self.statement_timeout).await
    }
}

impl Drop for DeferredCleanup {
    fn drop(&mut self) {
        let Some(connection) = self.connection.take() else {
            return;
        };
        let plan = self.plan.clone();
        let statement_timeout = self.statement_timeout;

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                self.tasks.spawn_on(
                    async move {
                        execute(Some(connection), plan, statement_timeout).await;
                    },
                    &handle,
                );
            }
            Err(_) => {
                warn!(table = ?plan.table_name, "No async runtime available, table not dropped");
            }
        }
    }
}

async fn execute(
    connection: Option<DbConnection>,
    mut plan: CleanupPlan,
    statement_timeout: Duration,
) -> CleanupPlan {
    let (Some(mut connection), Some(table)) = (connection, plan.table_name.clone()) else {
        return plan;
    };

    plan.executed = true;
    match connection
        .execute(&drop_table_sql(&table), &[], statement_timeout)
        .await
    {
        Ok(_) => info!(table = %table, "Ephemeral table dropped"),
        Err(e) => {
            warn!(table = %table, error = %e, "Cleanup failed");
            plan.error = Some(e.to_string());
        }
    }

    if let Err(e) = connection.close().await {
        debug!(error = %e, "Closing cleanup connection failed");
    }
    plan
}
