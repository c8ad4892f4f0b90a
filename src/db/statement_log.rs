//! Statement logger.
//!
//! Wraps single statement executions and records SQL, parameters, elapsed time
//! and row count in execution order. A statement that fails is not recorded;
//! its error goes back to the caller.

use crate::db::connection::{DbConnection, DbRow, ExecOutcome};
use crate::error::DbResult;
use crate::models::{DEFAULT_STATEMENT_TIMEOUT_SECS, QueryParam, StatementLogEntry};
use std::time::{Duration, Instant};
use tracing::debug;

#[derive(Debug)]
pub struct StatementLogger {
    statement_timeout: Duration,
    entries: Vec<StatementLogEntry>,
}

impl StatementLogger {
    pub fn new(statement_timeout: Duration) -> Self {
        Self {
            statement_timeout,
            entries: Vec::new(),
        }
    }

    /// Execute a write or DDL statement; logs rows affected.
    pub async fn execute(
        &mut self,
        conn: &mut DbConnection,
        sql: &str,
        params: Vec<QueryParam>,
    ) -> DbResult<ExecOutcome> {
        let start = Instant::now();
        let outcome = conn.execute(sql, &params, self.statement_timeout).await?;
        self.record(sql, params, start, outcome.rows_affected);
        Ok(outcome)
    }

    /// Run a query; logs rows returned.
    pub async fn fetch_all(
        &mut self,
        conn: &mut DbConnection,
        sql: &str,
        params: Vec<QueryParam>,
    ) -> DbResult<Vec<DbRow>> {
        let start = Instant::now();
        let rows = conn.fetch_all(sql, &params, self.statement_timeout).await?;
        self.record(sql, params, start, rows.len() as u64);
        Ok(rows)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn into_entries(self) -> Vec<StatementLogEntry> {
        self.entries
    }

    fn record(&mut self, sql: &str, params: Vec<QueryParam>, start: Instant, row_count: u64) {
        let elapsed_ms = elapsed_millis(start.elapsed());
        debug!(sql = %sql, elapsed_ms, row_count, "Statement logged");
        self.entries.push(StatementLogEntry {
            sql: sql.to_string(),
            params,
            elapsed_ms,
            row_count,
        });
    }
}

impl Default for StatementLogger {
    fn default() -> Self {
        Self::new(Duration::from_secs(DEFAULT_STATEMENT_TIMEOUT_SECS))
    }
}

/// Whole milliseconds, rounded to nearest.
fn elapsed_millis(elapsed: Duration) -> u64 {
    (elapsed.as_secs_f64() * 1000.0).round() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_elapsed_millis_rounds() {
        assert_eq!(elapsed_millis(Duration::from_micros(0)), 0);
        assert_eq!(elapsed_millis(Duration::from_micros(400)), 0);
        assert_eq!(elapsed_millis(Duration::from_micros(1500)), 2);
        assert_eq!(elapsed_millis(Duration::from_millis(42)), 42);
    }

    #[test]
    fn test_logger_defaults() {
        let logger = StatementLogger::default();
        assert!(logger.is_empty());
        assert_eq!(logger.len(), 0);
        assert!(logger.into_entries().is_empty());
    }
}
