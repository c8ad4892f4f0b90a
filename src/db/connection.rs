//! Single database connection used for one probe run.
//!
//! The probe holds exactly one connection per request, so this wraps the
//! database-specific connection types instead of a pool. Statement execution is
//! bounded by a timeout and organized in parallel per-database submodules:
//! - `mysql`: production dialect
//! - `sqlite`: local file databases for development and tests

use crate::error::{DbError, DbResult};
use crate::models::{DatabaseType, QueryParam};
use sqlx::mysql::{MySqlConnection, MySqlRow};
use sqlx::sqlite::{SqliteConnection, SqliteRow};
use sqlx::{Connection, Row};
use std::time::Duration;
use tokio::time::timeout;
use tracing::debug;

/// Outcome of a write statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecOutcome {
    pub rows_affected: u64,
    /// Id generated by an auto-increment column, 0 when none was generated
    pub last_insert_id: u64,
}

/// Database-specific connection.
pub enum DbConnection {
    MySql(MySqlConnection),
    SQLite(SqliteConnection),
}

impl std::fmt::Debug for DbConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("DbConnection").field(&self.db_type()).finish()
    }
}

impl DbConnection {
    /// Get the database type for this connection.
    pub fn db_type(&self) -> DatabaseType {
        match self {
            DbConnection::MySql(_) => DatabaseType::MySQL,
            DbConnection::SQLite(_) => DatabaseType::SQLite,
        }
    }

    /// Execute a write or DDL statement.
    pub async fn execute(
        &mut self,
        sql: &str,
        params: &[QueryParam],
        statement_timeout: Duration,
    ) -> DbResult<ExecOutcome> {
        debug!(sql = %sql, params = params.len(), "Executing statement");
        match self {
            DbConnection::MySql(conn) => {
                mysql::execute(conn, sql, params, statement_timeout).await
            }
            DbConnection::SQLite(conn) => {
                sqlite::execute(conn, sql, params, statement_timeout).await
            }
        }
    }

    /// Run a query and collect every returned row.
    pub async fn fetch_all(
        &mut self,
        sql: &str,
        params: &[QueryParam],
        statement_timeout: Duration,
    ) -> DbResult<Vec<DbRow>> {
        debug!(sql = %sql, params = params.len(), "Executing query");
        match self {
            DbConnection::MySql(conn) => {
                let rows = mysql::fetch_all(conn, sql, params, statement_timeout).await?;
                Ok(rows.into_iter().map(DbRow::MySql).collect())
            }
            DbConnection::SQLite(conn) => {
                let rows = sqlite::fetch_all(conn, sql, params, statement_timeout).await?;
                Ok(rows.into_iter().map(DbRow::SQLite).collect())
            }
        }
    }

    /// Close the connection, sending the protocol goodbye where there is one.
    pub async fn close(self) -> DbResult<()> {
        match self {
            DbConnection::MySql(conn) => conn.close().await.map_err(DbError::from),
            DbConnection::SQLite(conn) => conn.close().await.map_err(DbError::from),
        }
    }
}

/// Database-specific result row.
pub enum DbRow {
    MySql(MySqlRow),
    SQLite(SqliteRow),
}

impl DbRow {
    /// Read a text column. NULL reads as `None`.
    ///
    /// MySQL reports some metadata columns (e.g. `SHOW TABLES`) as binary strings,
    /// so those are accepted and decoded as UTF-8.
    pub fn text(&self, index: usize) -> DbResult<Option<String>> {
        match self {
            DbRow::MySql(row) => match row.try_get::<Option<String>, _>(index) {
                Ok(v) => Ok(v),
                Err(_) => {
                    let bytes: Option<Vec<u8>> = row.try_get(index).map_err(DbError::from)?;
                    Ok(bytes.map(|b| String::from_utf8_lossy(&b).into_owned()))
                }
            },
            DbRow::SQLite(row) => row.try_get(index).map_err(DbError::from),
        }
    }

    /// Read an unsigned id column.
    pub fn unsigned(&self, column: &str) -> DbResult<u64> {
        match self {
            DbRow::MySql(row) => match row.try_get::<u32, _>(column) {
                Ok(v) => Ok(u64::from(v)),
                Err(_) => row.try_get::<u64, _>(column).map_err(DbError::from),
            },
            DbRow::SQLite(row) => {
                let v: i64 = row.try_get(column).map_err(DbError::from)?;
                u64::try_from(v)
                    .map_err(|_| DbError::internal(format!("Negative value in '{}'", column)))
            }
        }
    }

    /// Read a signed integer column.
    pub fn integer(&self, column: &str) -> DbResult<i64> {
        match self {
            DbRow::MySql(row) => match row.try_get::<i32, _>(column) {
                Ok(v) => Ok(i64::from(v)),
                Err(_) => row.try_get::<i64, _>(column).map_err(DbError::from),
            },
            DbRow::SQLite(row) => row.try_get(column).map_err(DbError::from),
        }
    }

    /// Read a non-null text column by name.
    pub fn string(&self, column: &str) -> DbResult<String> {
        match self {
            DbRow::MySql(row) => row.try_get(column).map_err(DbError::from),
            DbRow::SQLite(row) => row.try_get(column).map_err(DbError::from),
        }
    }
}

// =============================================================================
// Database-Specific Implementations
// =============================================================================
//
// Each module below provides the same interface adapted to its database type.
// The code structure is intentionally parallel to make differences obvious.

mod mysql {
    use super::*;
    use sqlx::Executor;
    use sqlx::mysql::MySqlArguments;

    pub async fn execute(
        conn: &mut MySqlConnection,
        sql: &str,
        params: &[QueryParam],
        statement_timeout: Duration,
    ) -> DbResult<ExecOutcome> {
        // When params is empty, execute raw SQL directly (DDL is not always preparable)
        let result = if params.is_empty() {
            timeout(statement_timeout, conn.execute(sql)).await
        } else {
            let mut query = sqlx::query(sql);
            for param in params {
                query = bind_param(query, param);
            }
            timeout(statement_timeout, query.execute(&mut *conn)).await
        };

        match result {
            Ok(Ok(r)) => Ok(ExecOutcome {
                rows_affected: r.rows_affected(),
                last_insert_id: r.last_insert_id(),
            }),
            Ok(Err(e)) => Err(DbError::from(e)),
            Err(_) => Err(DbError::timeout("statement execution", statement_timeout)),
        }
    }

    pub async fn fetch_all(
        conn: &mut MySqlConnection,
        sql: &str,
        params: &[QueryParam],
        statement_timeout: Duration,
    ) -> DbResult<Vec<MySqlRow>> {
        let result = if params.is_empty() {
            timeout(statement_timeout, conn.fetch_all(sql)).await
        } else {
            let mut query = sqlx::query(sql);
            for param in params {
                query = bind_param(query, param);
            }
            timeout(statement_timeout, query.fetch_all(&mut *conn)).await
        };

        match result {
            Ok(rows) => rows.map_err(DbError::from),
            Err(_) => Err(DbError::timeout("query execution", statement_timeout)),
        }
    }

    fn bind_param<'q>(
        query: sqlx::query::Query<'q, sqlx::MySql, MySqlArguments>,
        param: &'q QueryParam,
    ) -> sqlx::query::Query<'q, sqlx::MySql, MySqlArguments> {
        match param {
            QueryParam::Int(v) => query.bind(*v),
            QueryParam::Float(v) => query.bind(*v),
            QueryParam::String(v) => query.bind(v.as_str()),
        }
    }
}

mod sqlite {
    use super::*;
    use sqlx::Executor;
    use sqlx::sqlite::SqliteArguments;

    pub async fn execute(
        conn: &mut SqliteConnection,
        sql: &str,
        params: &[QueryParam],
        statement_timeout: Duration,
    ) -> DbResult<ExecOutcome> {
        let result = if params.is_empty() {
            timeout(statement_timeout, conn.execute(sql)).await
        } else {
            let mut query = sqlx::query(sql);
            for param in params {
                query = bind_param(query, param);
            }
            timeout(statement_timeout, query.execute(&mut *conn)).await
        };

        match result {
            Ok(Ok(r)) => Ok(ExecOutcome {
                rows_affected: r.rows_affected(),
                last_insert_id: u64::try_from(r.last_insert_rowid()).unwrap_or(0),
            }),
            Ok(Err(e)) => Err(DbError::from(e)),
            Err(_) => Err(DbError::timeout("statement execution", statement_timeout)),
        }
    }

    pub async fn fetch_all(
        conn: &mut SqliteConnection,
        sql: &str,
        params: &[QueryParam],
        statement_timeout: Duration,
    ) -> DbResult<Vec<SqliteRow>> {
        let result = if params.is_empty() {
            timeout(statement_timeout, conn.fetch_all(sql)).await
        } else {
            let mut query = sqlx::query(sql);
            for param in params {
                query = bind_param(query, param);
            }
            timeout(statement_timeout, query.fetch_all(&mut *conn)).await
        };

        match result {
            Ok(rows) => rows.map_err(DbError::from),
            Err(_) => Err(DbError::timeout("query execution", statement_timeout)),
        }
    }

    fn bind_param<'q>(
        query: sqlx::query::Query<'q, sqlx::Sqlite, SqliteArguments<'q>>,
        param: &'q QueryParam,
    ) -> sqlx::query::Query<'q, sqlx::Sqlite, SqliteArguments<'q>> {
        match param {
            QueryParam::Int(v) => query.bind(*v),
            QueryParam::Float(v) => query.bind(*v),
            QueryParam::String(v) => query.bind(v.as_str()),
        }
    }
}
