//! Result records of a single probe run.

use crate::models::{ConnectionTarget, StatementLogEntry};

/// One row of the ephemeral table as read back for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrudRow {
    pub id: u64,
    pub name: String,
    pub qty: i64,
}

#[derive(Debug, Clone, Default)]
pub struct CrudResult {
    pub table_name: String,
    pub rows_after_insert: Vec<CrudRow>,
    pub rows_after_update: Vec<CrudRow>,
    pub rows_after_delete: Vec<CrudRow>,
    /// Generated ids of the two sample rows, once both inserts went through
    pub inserted_ids: Option<(u64, u64)>,
    pub succeeded: bool,
    pub errors: Vec<String>,
}

impl CrudResult {
    pub fn new(table_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            ..Default::default()
        }
    }
}

/// State of the drop scheduled to run after the response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanupPlan {
    pub scheduled: bool,
    pub table_name: Option<String>,
    /// Set once the drop was attempted
    pub executed: bool,
    pub error: Option<String>,
}

impl CleanupPlan {
    pub fn scheduled(table_name: impl Into<String>) -> Self {
        Self {
            scheduled: true,
            table_name: Some(table_name.into()),
            executed: false,
            error: None,
        }
    }

    /// Whether a drop is planned for a known table.
    pub fn drop_planned(&self) -> bool {
        self.scheduled && self.table_name.is_some()
    }
}

/// Tables visible to the probe connection.
#[derive(Debug, Clone, Default)]
pub struct TableInventory {
    /// Naturally sorted, truncated to the display limit
    pub names: Vec<String>,
    /// Number of tables before truncation
    pub total: usize,
    pub error: Option<String>,
}

impl TableInventory {
    pub fn is_truncated(&self) -> bool {
        self.total > self.names.len()
    }
}

/// Everything a successful connection produced for the page.
#[derive(Debug, Clone)]
pub struct ConnectedReport {
    pub target: ConnectionTarget,
    pub user: String,
    pub current_database: Option<String>,
    pub current_user: Option<String>,
    pub tables: TableInventory,
    pub crud: CrudResult,
    pub cleanup: CleanupPlan,
    pub statements: Vec<StatementLogEntry>,
}

impl ConnectedReport {
    /// CRUD went through and the drop is queued.
    pub fn is_ok(&self) -> bool {
        self.crud.succeeded && self.cleanup.drop_planned()
    }
}

/// Outcome of one probe run, as rendered on the page.
#[derive(Debug, Clone)]
pub enum ProbeReport {
    Connected(Box<ConnectedReport>),
    /// Every target failed; one message per attempt, in attempt order
    Failed { errors: Vec<String> },
}
