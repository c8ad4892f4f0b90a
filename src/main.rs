//! DB CRUD Probe - Main entry point.
//!
//! Serves a database connectivity and CRUD smoke-test page plus a
//! session-backed grade book.

use clap::Parser;
use db_crud_probe::config::Config;
use db_crud_probe::models::DatabaseType;
use db_crud_probe::session::SessionStore;
use db_crud_probe::web::{AppState, HttpServer};
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Initialize the tracing subscriber for logging.
fn init_tracing(config: &Config) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let subscriber = tracing_subscriber::registry().with(filter);

    if config.json_logs {
        subscriber.with(fmt::layer().json()).init();
    } else {
        subscriber
            .with(fmt::layer().with_target(true).with_thread_ids(false))
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse configuration from command line and environment
    let config = Config::parse();

    init_tracing(&config);

    info!("Starting DB CRUD Probe v{}", env!("CARGO_PKG_VERSION"));

    let settings = config.probe_settings();
    if DatabaseType::from_driver_name(&settings.driver).is_none() {
        warn!(driver = %settings.driver, "Unsupported database driver, /db-test will report it");
    }
    info!(
        driver = %settings.driver,
        primary = %settings.connection.primary_target(),
        fallback = %settings.fallback,
        database = %settings.connection.database,
        "Probe configured"
    );

    let sessions = SessionStore::new(config.session_ttl_duration());
    // Start the cleanup task for expired sessions
    sessions.clone().start_cleanup_task();

    let server = HttpServer::new(
        AppState::new(settings, sessions),
        &config.http_host,
        config.http_port,
    );

    if let Err(e) = server.run().await {
        error!(error = %e, "Server error");
        return Err(e.into());
    }

    info!("Server shutdown complete");
    Ok(())
}
