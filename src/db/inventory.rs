//! Read-only queries shown next to the CRUD results.

use crate::db::connection::DbConnection;
use crate::db::statement_log::StatementLogger;
use crate::error::DbResult;
use crate::models::{DatabaseType, TableInventory};
use std::cmp::Ordering;
use tracing::warn;

/// Maximum number of table names listed on the page.
pub const MAX_LISTED_TABLES: usize = 50;

fn current_database_sql(db_type: DatabaseType) -> &'static str {
    match db_type {
        DatabaseType::MySQL => "SELECT DATABASE() AS dbname",
        DatabaseType::SQLite => "SELECT name AS dbname FROM pragma_database_list WHERE seq = 0",
    }
}

fn current_user_sql(db_type: DatabaseType) -> &'static str {
    match db_type {
        DatabaseType::MySQL => "SELECT CURRENT_USER() AS user",
        // No user concept in file databases
        DatabaseType::SQLite => "SELECT NULL AS user",
    }
}

fn list_tables_sql(db_type: DatabaseType) -> &'static str {
    match db_type {
        DatabaseType::MySQL => "SHOW TABLES",
        DatabaseType::SQLite => {
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%'"
        }
    }
}

/// `DATABASE()` of the connection.
pub async fn current_database(
    conn: &mut DbConnection,
    log: &mut StatementLogger,
) -> DbResult<Option<String>> {
    let sql = current_database_sql(conn.db_type());
    first_text(conn, sql, log).await
}

/// `CURRENT_USER()` of the connection.
pub async fn current_user(
    conn: &mut DbConnection,
    log: &mut StatementLogger,
) -> DbResult<Option<String>> {
    let sql = current_user_sql(conn.db_type());
    first_text(conn, sql, log).await
}

/// Tables of the current database, naturally sorted and capped at
/// [`MAX_LISTED_TABLES`]. Errors end up in the inventory instead of failing.
pub async fn list_tables(conn: &mut DbConnection, log: &mut StatementLogger) -> TableInventory {
    let sql = list_tables_sql(conn.db_type());
    let names = async {
        let rows = log.fetch_all(conn, sql, Vec::new()).await?;
        let mut names = Vec::with_capacity(rows.len());
        for row in &rows {
            if let Some(name) = row.text(0)? {
                names.push(name);
            }
        }
        DbResult::Ok(names)
    }
    .await;

    match names {
        Ok(mut names) => {
            names.sort_by(|a, b| natural_cmp(a, b));
            let total = names.len();
            names.truncate(MAX_LISTED_TABLES);
            TableInventory {
                names,
                total,
                error: None,
            }
        }
        Err(e) => {
            warn!(error = %e, "Listing tables failed");
            TableInventory {
                names: Vec::new(),
                total: 0,
                error: Some(e.to_string()),
            }
        }
    }
}

async fn first_text(
    conn: &mut DbConnection,
    sql: &str,
    log: &mut StatementLogger,
) -> DbResult<Option<String>> {
    let rows = log.fetch_all(conn, sql, Vec::new()).await?;
    match rows.first() {
        Some(row) => row.text(0),
        None => Ok(None),
    }
}

/// Case-insensitive natural ordering: digit runs compare by numeric value,
/// so `t2` sorts before `t10`.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut left = a.chars().peekable();
    let mut right = b.chars().peekable();

    loop {
        match (left.peek().copied(), right.peek().copied()) {
            (None, None) => return a.cmp(b),
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(l), Some(r)) if l.is_ascii_digit() && r.is_ascii_digit() => {
                let ln = take_digits(&mut left);
                let rn = take_digits(&mut right);
                let lt = ln.trim_start_matches('0');
                let rt = rn.trim_start_matches('0');
                let ord = lt.len().cmp(&rt.len()).then_with(|| lt.cmp(rt));
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            (Some(l), Some(r)) => {
                let ord = l.to_lowercase().cmp(r.to_lowercase());
                if ord != Ordering::Equal {
                    return ord;
                }
                left.next();
                right.next();
            }
        }
    }
}

fn take_digits(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> String {
    let mut digits = String::new();
    while let Some(c) = chars.peek().copied() {
        if !c.is_ascii_digit() {
            break;
        }
        digits.push(c);
        chars.next();
    }
    digits
}
