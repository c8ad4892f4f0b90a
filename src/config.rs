//! Configuration handling for the probe service.
//!
//! Server settings and database parameters come from CLI flags or environment
//! variables. Everything is resolved once at startup.

use crate::db::ProbeSettings;
use crate::db::connector::DEFAULT_CONNECT_TIMEOUT_SECS;
use crate::models::connection::{FALLBACK_HOST, FALLBACK_PORT};
use crate::models::{ConnectionConfig, ConnectionTarget, DEFAULT_STATEMENT_TIMEOUT_SECS};
use crate::session::DEFAULT_SESSION_TTL_SECS;
use clap::Parser;
use std::time::Duration;

pub const DEFAULT_HTTP_HOST: &str = "127.0.0.1";
pub const DEFAULT_HTTP_PORT: u16 = 8080;
pub const DEFAULT_DRIVER: &str = "mysql";

/// Configuration for the probe service.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "db-crud-probe",
    about = "Database connectivity and CRUD smoke-test pages plus a session-backed grade book",
    version,
    author
)]
pub struct Config {
    /// HTTP host to bind to
    #[arg(long, default_value = DEFAULT_HTTP_HOST, env = "PROBE_HTTP_HOST")]
    pub http_host: String,

    /// HTTP port to bind to
    #[arg(long, default_value_t = DEFAULT_HTTP_PORT, env = "PROBE_HTTP_PORT")]
    pub http_port: u16,

    /// Database driver (mysql, mariadb or sqlite)
    #[arg(long, default_value = DEFAULT_DRIVER, env = "DB_DRIVER")]
    pub driver: String,

    /// Database host
    #[arg(long = "db-host", env = "MYSQL_HOST")]
    pub db_host: Option<String>,

    /// Database port (leading digits are used, anything else becomes 0)
    #[arg(long = "db-port", env = "MYSQL_PORT")]
    pub db_port: Option<String>,

    /// Database user
    #[arg(long = "db-user", env = "MYSQL_USER")]
    pub db_user: Option<String>,

    /// Database password
    #[arg(long = "db-password", env = "MYSQL_PASSWORD", hide_env_values = true)]
    pub db_password: Option<String>,

    /// Database name (file path for sqlite)
    #[arg(long = "db-name", env = "MYSQL_DATABASE")]
    pub db_name: Option<String>,

    /// Host tried after the configured one fails
    #[arg(long, default_value = FALLBACK_HOST, env = "PROBE_FALLBACK_HOST")]
    pub fallback_host: String,

    /// Port tried after the configured one fails
    #[arg(long, default_value_t = FALLBACK_PORT, env = "PROBE_FALLBACK_PORT")]
    pub fallback_port: u16,

    /// Per-target connection timeout in seconds
    #[arg(
        long,
        default_value_t = DEFAULT_CONNECT_TIMEOUT_SECS,
        env = "PROBE_CONNECT_TIMEOUT"
    )]
    pub connect_timeout: u64,

    /// Per-statement timeout in seconds
    #[arg(
        long,
        default_value_t = DEFAULT_STATEMENT_TIMEOUT_SECS,
        env = "PROBE_STATEMENT_TIMEOUT"
    )]
    pub statement_timeout: u64,

    /// Idle lifetime of grade book sessions in seconds
    #[arg(
        long,
        default_value_t = DEFAULT_SESSION_TTL_SECS,
        env = "PROBE_SESSION_TTL"
    )]
    pub session_ttl: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", env = "PROBE_LOG_LEVEL")]
    pub log_level: String,

    /// Enable JSON logging format
    #[arg(long, env = "PROBE_JSON_LOGS")]
    pub json_logs: bool,
}

impl Config {
    /// Create a default configuration (useful for testing).
    pub fn default_config() -> Self {
        Self {
            http_host: DEFAULT_HTTP_HOST.to_string(),
            http_port: DEFAULT_HTTP_PORT,
            driver: DEFAULT_DRIVER.to_string(),
            db_host: None,
            db_port: None,
            db_user: None,
            db_password: None,
            db_name: None,
            fallback_host: FALLBACK_HOST.to_string(),
            fallback_port: FALLBACK_PORT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT_SECS,
            statement_timeout: DEFAULT_STATEMENT_TIMEOUT_SECS,
            session_ttl: DEFAULT_SESSION_TTL_SECS,
            log_level: "info".to_string(),
            json_logs: false,
        }
    }

    /// Get the HTTP bind address.
    pub fn http_bind_addr(&self) -> String {
        format!("{}:{}", self.http_host, self.http_port)
    }

    /// Database parameters with defaults applied.
    pub fn connection_config(&self) -> ConnectionConfig {
        ConnectionConfig::resolve(
            self.db_host.clone(),
            self.db_port.clone(),
            self.db_user.clone(),
            self.db_password.clone(),
            self.db_name.clone(),
        )
    }

    pub fn fallback_target(&self) -> ConnectionTarget {
        ConnectionTarget::new(self.fallback_host.clone(), self.fallback_port)
    }

    /// Everything one probe run needs.
    pub fn probe_settings(&self) -> ProbeSettings {
        ProbeSettings {
            driver: self.driver.clone(),
            connection: self.connection_config(),
            fallback: self.fallback_target(),
            connect_timeout: self.connect_timeout_duration(),
            statement_timeout: self.statement_timeout_duration(),
        }
    }

    /// Get the connection timeout as a Duration.
    pub fn connect_timeout_duration(&self) -> Duration {
        Duration::from_secs(self.connect_timeout)
    }

    /// Get the statement timeout as a Duration.
    pub fn statement_timeout_duration(&self) -> Duration {
        Duration::from_secs(self.statement_timeout)
    }

    pub fn session_ttl_duration(&self) -> Duration {
        Duration::from_secs(self.session_ttl)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::default_config()
    }
}
