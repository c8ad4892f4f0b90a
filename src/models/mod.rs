//! Data models for the probe service.
//!
//! This module re-exports all model types used throughout the application.

pub mod connection;
pub mod gradebook;
pub mod probe;
pub mod query;

// Re-export commonly used types
pub use connection::{ConnectionConfig, ConnectionTarget, DatabaseType};
pub use gradebook::{BestStudent, Grade, SUBJECTS, Student};
pub use probe::{
    CleanupPlan, ConnectedReport, CrudResult, CrudRow, ProbeReport, TableInventory,
};
pub use query::{DEFAULT_STATEMENT_TIMEOUT_SECS, QueryParam, StatementLogEntry};
