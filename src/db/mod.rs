//! Database access layer.
//!
//! This module provides the pieces of a probe run:
//! - Single per-request connections
//! - Ordered connection attempts over a target list
//! - Statement logging with timing and row counts
//! - The ephemeral CRUD sequence
//! - Read-only display queries
//! - Deferred cleanup of the ephemeral table

pub mod cleanup;
pub mod connection;
pub mod connector;
pub mod crud;
pub mod inventory;
pub mod probe;
pub mod statement_log;

pub use cleanup::DeferredCleanup;
pub use connection::{DbConnection, DbRow, ExecOutcome};
pub use connector::{AttemptError, ConnectFailure, Connected, Connector};
pub use crud::{generate_table_name, run_crud};
pub use probe::{ProbeOutcome, ProbeSettings, run_probe};
pub use statement_log::StatementLogger;
