//! DB CRUD Probe Library
//!
//! Connectivity and CRUD smoke test for MySQL/MariaDB (SQLite for local runs),
//! served as HTML together with a small session-backed grade book.

pub mod coerce;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod session;
pub mod web;

pub use config::Config;
pub use error::DbError;
