//! Ephemeral CRUD sequence against a uniquely named table.
//!
//! Order is create, insert ×2, read, update, read, delete, read. The first
//! failing step ends the run; whatever already went through stays applied.
//! Dropping the table is left to [`crate::db::cleanup`].

use crate::db::connection::{DbConnection, DbRow};
use crate::db::statement_log::StatementLogger;
use crate::error::DbResult;
use crate::models::{CrudResult, CrudRow, DatabaseType, QueryParam};
use rand::RngCore;
use rand::rngs::OsRng;
use tracing::{info, warn};

pub const TABLE_PREFIX: &str = "dbtest_tmp_";

/// Sample rows inserted by every run.
pub const FIRST_ROW: (&str, i64) = ("Apfel", 10);
pub const SECOND_ROW: (&str, i64) = ("Birne", 5);

/// Quantity added to the first row by the update step.
pub const QTY_INCREMENT: i64 = 7;

/// `dbtest_tmp_` followed by 8 hex characters from the OS random source.
pub fn generate_table_name() -> String {
    let mut bytes = [0u8; 4];
    OsRng.fill_bytes(&mut bytes);
    let suffix: String = bytes.iter().map(|b| format!("{:02x}", b)).collect();
    format!("{}{}", TABLE_PREFIX, suffix)
}

/// Whether `name` looks like a table produced by [`generate_table_name`].
pub fn is_probe_table_name(name: &str) -> bool {
    name.strip_prefix(TABLE_PREFIX).is_some_and(|suffix| {
        suffix.len() == 8
            && suffix
                .bytes()
                .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
    })
}

/// DDL for the ephemeral table in the given dialect.
pub fn create_table_sql(db_type: DatabaseType, table: &str) -> String {
    match db_type {
        DatabaseType::MySQL => format!(
            "CREATE TABLE `{table}` (
              id INT UNSIGNED NOT NULL AUTO_INCREMENT,
              name VARCHAR(100) NOT NULL,
              qty INT NOT NULL DEFAULT 0,
              created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
              PRIMARY KEY (id)
            ) ENGINE=InnoDB DEFAULT CHARSET=utf8mb4"
        ),
        DatabaseType::SQLite => format!(
            "CREATE TABLE `{table}` (
              id INTEGER PRIMARY KEY AUTOINCREMENT,
              name VARCHAR(100) NOT NULL,
              qty INTEGER NOT NULL DEFAULT 0,
              created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            )"
        ),
    }
}

/// Statement issued by the deferred cleanup.
pub fn drop_table_sql(table: &str) -> String {
    format!("DROP TABLE IF EXISTS `{table}`")
}

/// Run the CRUD sequence, logging every statement through `log`.
///
/// Never fails as a whole: errors end the sequence and are recorded in the result.
pub async fn run_crud(
    conn: &mut DbConnection,
    table: &str,
    log: &mut StatementLogger,
) -> CrudResult {
    let mut result = CrudResult::new(table);

    match run_steps(conn, table, log, &mut result).await {
        Ok(()) => {
            result.succeeded = true;
            info!(table = %table, statements = log.len(), "CRUD sequence completed");
        }
        Err(e) => {
            warn!(table = %table, error = %e, "CRUD sequence aborted");
            result.errors.push(e.to_string());
            result.succeeded = false;
        }
    }

    result
}

async fn run_steps(
    conn: &mut DbConnection,
    table: &str,
    log: &mut StatementLogger,
    result: &mut CrudResult,
) -> DbResult<()> {
    let db_type = conn.db_type();
    let insert_sql = format!("INSERT INTO `{table}` (name, qty) VALUES (?, ?)");
    let select_sql = format!("SELECT id, name, qty FROM `{table}` ORDER BY id");

    log.execute(conn, &create_table_sql(db_type, table), Vec::new())
        .await?;

    let first_id = log
        .execute(
            conn,
            &insert_sql,
            vec![QueryParam::from(FIRST_ROW.0), QueryParam::Int(FIRST_ROW.1)],
        )
        .await?
        .last_insert_id;
    let second_id = log
        .execute(
            conn,
            &insert_sql,
            vec![QueryParam::from(SECOND_ROW.0), QueryParam::Int(SECOND_ROW.1)],
        )
        .await?
        .last_insert_id;
    result.inserted_ids = Some((first_id, second_id));

    result.rows_after_insert = read_rows(conn, &select_sql, log).await?;

    log.execute(
        conn,
        &format!("UPDATE `{table}` SET qty = qty + {QTY_INCREMENT} WHERE id = ?"),
        vec![QueryParam::from(first_id)],
    )
    .await?;
    result.rows_after_update = read_rows(conn, &select_sql, log).await?;

    log.execute(
        conn,
        &format!("DELETE FROM `{table}` WHERE id = ?"),
        vec![QueryParam::from(second_id)],
    )
    .await?;
    result.rows_after_delete = read_rows(conn, &select_sql, log).await?;

    Ok(())
}

async fn read_rows(
    conn: &mut DbConnection,
    sql: &str,
    log: &mut StatementLogger,
) -> DbResult<Vec<CrudRow>> {
    log.fetch_all(conn, sql, Vec::new())
        .await?
        .iter()
        .map(crud_row)
        .collect()
}

fn crud_row(row: &DbRow) -> DbResult<CrudRow> {
    Ok(CrudRow {
        id: row.unsigned("id")?,
        name: row.string("name")?,
        qty: row.integer("qty")?,
    })
}
