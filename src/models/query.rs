//! Query-related data models.
//!
//! This module defines statement parameters and the statement log records.

use serde::Serialize;

/// Default statement timeout in seconds.
pub const DEFAULT_STATEMENT_TIMEOUT_SECS: u64 = 30;

/// A parameter value for parameterized statements.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum QueryParam {
    /// Integer value (stored as i64 for maximum range)
    Int(i64),
    /// Floating point value
    Float(f64),
    /// String value
    String(String),
}

impl From<i64> for QueryParam {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<u64> for QueryParam {
    fn from(v: u64) -> Self {
        i64::try_from(v).map(Self::Int).unwrap_or(Self::Float(v as f64))
    }
}

impl From<&str> for QueryParam {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

/// One executed statement, as recorded by the statement logger.
#[derive(Debug, Clone)]
pub struct StatementLogEntry {
    pub sql: String,
    pub params: Vec<QueryParam>,
    pub elapsed_ms: u64,
    /// Rows affected for writes, rows returned for reads
    pub row_count: u64,
}

impl StatementLogEntry {
    /// Parameters rendered as a JSON array, e.g. `["Apfel",10]`.
    pub fn params_json(&self) -> String {
        serde_json::to_string(&self.params).unwrap_or_else(|_| "[]".to_string())
    }
}
