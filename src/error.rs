//! Error types for the probe service.
//!
//! This module defines all error types using `thiserror` for ergonomic error handling.
//! Messages are kept close to what the database reported, since they are shown
//! verbatim on the probe page.

use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Connection failed: {message}")]
    Connection { message: String, suggestion: String },

    #[error("{message}")]
    Database {
        message: String,
        /// e.g., "42S02" for unknown table
        sql_state: Option<String>,
        suggestion: String,
    },

    #[error("Timeout: {operation} exceeded {elapsed_ms}ms")]
    Timeout { operation: String, elapsed_ms: u128 },

    #[error("Database driver '{driver}' is not available")]
    DriverUnavailable { driver: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl DbError {
    /// Create a connection error with a helpful suggestion.
    pub fn connection(message: impl Into<String>, suggestion: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
            suggestion: suggestion.into(),
        }
    }

    /// Create a database error with optional SQL state.
    pub fn database(
        message: impl Into<String>,
        sql_state: Option<String>,
        suggestion: impl Into<String>,
    ) -> Self {
        Self::Database {
            message: message.into(),
            sql_state,
            suggestion: suggestion.into(),
        }
    }

    /// Create a timeout error.
    pub fn timeout(operation: impl Into<String>, limit: Duration) -> Self {
        Self::Timeout {
            operation: operation.into(),
            elapsed_ms: limit.as_millis(),
        }
    }

    pub fn driver_unavailable(driver: impl Into<String>) -> Self {
        Self::DriverUnavailable {
            driver: driver.into(),
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Get the suggestion for this error, if available.
    pub fn suggestion(&self) -> Option<&str> {
        match self {
            Self::Connection { suggestion, .. } => Some(suggestion),
            Self::Database { suggestion, .. } => Some(suggestion),
            _ => None,
        }
    }

    /// HTTP status used when this error ends a request.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Connection { .. } | Self::Timeout { .. } => StatusCode::SERVICE_UNAVAILABLE,
            Self::DriverUnavailable { .. } | Self::Database { .. } | Self::Internal { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

/// Convert sqlx errors to DbError.
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Configuration(msg) => DbError::connection(
                msg.to_string(),
                "Check the MYSQL_* settings and credentials",
            ),
            sqlx::Error::Database(db_err) => {
                let code = db_err.code().map(|c| c.to_string());
                DbError::database(
                    db_err.message(),
                    code,
                    "Check the SQL syntax and referenced objects",
                )
            }
            sqlx::Error::RowNotFound => DbError::database(
                "No rows returned",
                None,
                "Verify the query conditions match existing data",
            ),
            sqlx::Error::Io(io_err) => DbError::connection(
                format!("I/O error: {}", io_err),
                "Check network connectivity and database server status",
            ),
            sqlx::Error::Tls(tls_err) => DbError::connection(
                format!("TLS error: {}", tls_err),
                "Verify TLS configuration and certificates",
            ),
            sqlx::Error::Protocol(msg) => DbError::connection(
                format!("Protocol error: {}", msg),
                "Check database server compatibility",
            ),
            sqlx::Error::ColumnNotFound(col) => {
                DbError::internal(format!("Column not found: {}", col))
            }
            sqlx::Error::ColumnDecode { index, source } => {
                DbError::internal(format!("Failed to decode column {}: {}", index, source))
            }
            sqlx::Error::Decode(source) => DbError::internal(format!("Decode error: {}", source)),
            sqlx::Error::WorkerCrashed => DbError::internal("Database worker crashed"),
            _ => DbError::internal(format!("Unknown database error: {}", err)),
        }
    }
}

/// Result type alias for database operations.
pub type DbResult<T> = Result<T, DbError>;

impl IntoResponse for DbError {
    fn into_response(self) -> Response {
        let body = match &self {
            DbError::DriverUnavailable { driver } => crate::web::render::driver_missing_page(driver),
            other => crate::web::render::error_page(&other.to_string(), other.suggestion()),
        };
        (self.status_code(), Html(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = DbError::connection("Failed to connect", "Check credentials");
        assert!(err.to_string().contains("Connection failed"));
    }

    #[test]
    fn test_database_error_displays_raw_message() {
        let err = DbError::database(
            "Table 'test_db.nope' doesn't exist",
            Some("42S02".to_string()),
            "Check SQL",
        );
        assert_eq!(err.to_string(), "Table 'test_db.nope' doesn't exist");
        assert_eq!(err.suggestion(), Some("Check SQL"));
    }

    #[test]
    fn test_driver_unavailable_is_server_error() {
        let err = DbError::driver_unavailable("oracle");
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(err.to_string().contains("oracle"));
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(
            DbError::timeout("query", Duration::from_secs(30)).status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            DbError::internal("boom").status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_timeout_reports_sub_second_limits() {
        let err = DbError::timeout("statement execution", Duration::from_millis(250));
        assert_eq!(
            err.to_string(),
            "Timeout: statement execution exceeded 250ms"
        );
        let err = DbError::timeout("connection attempt", Duration::from_secs(5));
        assert!(err.to_string().ends_with("exceeded 5000ms"));
    }

    #[test]
    fn test_driver_unavailable_response_is_500() {
        let response = DbError::driver_unavailable("oracle").into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
