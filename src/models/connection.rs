//! Connection-related data models.
//!
//! This module defines types for database connection configuration and the
//! targets the connector walks through.

use crate::coerce::leading_int;

pub const DEFAULT_DB_HOST: &str = "db";
pub const DEFAULT_DB_PORT: u16 = 3306;
pub const DEFAULT_DB_USER: &str = "devuser";
pub const DEFAULT_DB_PASSWORD: &str = "devpass";
pub const DEFAULT_DB_NAME: &str = "test_db";

/// Loopback target tried after the configured one.
pub const FALLBACK_HOST: &str = "127.0.0.1";
pub const FALLBACK_PORT: u16 = 9906;

/// Supported database types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DatabaseType {
    /// Includes MariaDB
    MySQL,
    /// Local file database, `database` is the file path
    SQLite,
}

impl DatabaseType {
    /// Resolve a driver name as configured via `DB_DRIVER`.
    ///
    /// Returns `None` when no driver for the name is compiled into this binary.
    pub fn from_driver_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "mysql" | "mariadb" => Some(Self::MySQL),
            "sqlite" => Some(Self::SQLite),
            _ => None,
        }
    }

    /// Get the display name for this database type.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::MySQL => "MySQL",
            Self::SQLite => "SQLite",
        }
    }
}

impl std::fmt::Display for DatabaseType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// A (host, port) pair attempted for establishing a connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionTarget {
    pub host: String,
    pub port: u16,
}

impl ConnectionTarget {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// The fixed loopback fallback.
    pub fn fallback() -> Self {
        Self::new(FALLBACK_HOST, FALLBACK_PORT)
    }
}

impl std::fmt::Display for ConnectionTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Connection parameters, immutable for the duration of a request.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    /// Contains sensitive data - never log
    pub password: String,
    pub database: String,
}

impl ConnectionConfig {
    /// Resolve connection parameters, substituting defaults for absent values.
    ///
    /// The port goes through lenient integer coercion; values that are not a valid
    /// TCP port end up as 0 and simply fail to connect. This never fails.
    pub fn resolve(
        host: Option<String>,
        port: Option<String>,
        user: Option<String>,
        password: Option<String>,
        database: Option<String>,
    ) -> Self {
        let port = match port {
            Some(raw) => u16::try_from(leading_int(&raw)).unwrap_or(0),
            None => DEFAULT_DB_PORT,
        };

        Self {
            host: host.unwrap_or_else(|| DEFAULT_DB_HOST.to_string()),
            port,
            user: user.unwrap_or_else(|| DEFAULT_DB_USER.to_string()),
            password: password.unwrap_or_else(|| DEFAULT_DB_PASSWORD.to_string()),
            database: database.unwrap_or_else(|| DEFAULT_DB_NAME.to_string()),
        }
    }

    /// The configured target, before any fallback.
    pub fn primary_target(&self) -> ConnectionTarget {
        ConnectionTarget::new(self.host.clone(), self.port)
    }

    /// Ordered targets to try: the configured one first, then `fallback`.
    pub fn targets(&self, fallback: ConnectionTarget) -> Vec<ConnectionTarget> {
        vec![self.primary_target(), fallback]
    }
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self::resolve(None, None, None, None, None)
    }
}

impl std::fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"****")
            .field("database", &self.database)
            .finish()
    }
}
