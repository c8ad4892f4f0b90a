//! HTTP server with graceful shutdown.

use crate::error::{DbError, DbResult};
use crate::web::{AppState, router};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::signal;
use tokio_util::task::TaskTracker;
use tracing::{error, info, warn};

/// Time allowed for in-flight responses after a shutdown signal.
const GRACEFUL_TIMEOUT: Duration = Duration::from_secs(30);

/// Time allowed for pending table drops once the server stopped.
const CLEANUP_TIMEOUT: Duration = Duration::from_secs(10);

pub struct HttpServer {
    state: AppState,
    /// Host to bind to
    host: String,
    /// Port to bind to
    port: u16,
}

impl HttpServer {
    pub fn new(state: AppState, host: impl Into<String>, port: u16) -> Self {
        Self {
            state,
            host: host.into(),
            port,
        }
    }

    /// Get the bind address.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Bind and serve until SIGINT or SIGTERM.
    pub async fn run(self) -> DbResult<()> {
        let bind_addr = self.bind_addr();
        let listener = TcpListener::bind(&bind_addr).await.map_err(|e| {
            DbError::connection(
                format!("Failed to bind to {}: {}", bind_addr, e),
                "Check that the port is available",
            )
        })?;
        info!("Listening on http://{}", bind_addr);

        let shutdown_notify = Arc::new(tokio::sync::Notify::new());
        let shutdown_notify_clone = shutdown_notify.clone();
        let shutdown_signal = async move {
            wait_for_signal().await;
            shutdown_notify_clone.notify_one();
        };

        let cleanups = self.state.cleanups.clone();
        let server = serve(listener, self.state, shutdown_signal);

        // Race between: server completing normally vs forced timeout/second signal after shutdown
        tokio::select! {
            result = server => result?,
            _ = async {
                shutdown_notify.notified().await;
                info!(
                    timeout_secs = GRACEFUL_TIMEOUT.as_secs(),
                    "Waiting for connections to close (send signal again to force exit)..."
                );

                tokio::select! {
                    _ = tokio::time::sleep(GRACEFUL_TIMEOUT) => {
                        warn!("Graceful shutdown timeout, forcing exit");
                    }
                    _ = wait_for_signal() => {
                        warn!("Received second signal, forcing immediate exit");
                    }
                }
            } => {}
        }

        wait_for_cleanups(&cleanups, CLEANUP_TIMEOUT).await;
        Ok(())
    }
}

/// Serve the application on an already bound listener until `shutdown` resolves.
pub async fn serve<F>(listener: TcpListener, state: AppState, shutdown: F) -> DbResult<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| {
            error!(error = %e, "HTTP server error");
            DbError::internal(format!("HTTP server error: {}", e))
        })?;
    info!("HTTP server stopped");
    Ok(())
}

/// Stop accepting cleanup tasks and wait for the running ones, up to `limit`.
pub async fn wait_for_cleanups(cleanups: &TaskTracker, limit: Duration) {
    cleanups.close();
    if cleanups.is_empty() {
        return;
    }
    info!(pending = cleanups.len(), "Waiting for pending table drops");
    if tokio::time::timeout(limit, cleanups.wait()).await.is_err() {
        warn!(
            pending = cleanups.len(),
            "Pending table drops did not finish, leftover tables may remain"
        );
    }
}

/// Wait for a shutdown signal (SIGINT or SIGTERM).
async fn wait_for_signal() {
    let ctrl_c = signal::ctrl_c();

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT"),
        _ = terminate => info!("Received SIGTERM"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::ProbeSettings;
    use crate::models::{ConnectionConfig, ConnectionTarget};
    use crate::session::SessionStore;

    fn state() -> AppState {
        AppState::new(
            ProbeSettings {
                driver: "mysql".into(),
                connection: ConnectionConfig::default(),
                fallback: ConnectionTarget::fallback(),
                connect_timeout: Duration::from_secs(1),
                statement_timeout: Duration::from_secs(1),
            },
            SessionStore::default(),
        )
    }

    #[test]
    fn test_bind_addr() {
        let server = HttpServer::new(state(), "0.0.0.0", 8080);
        assert_eq!(server.bind_addr(), "0.0.0.0:8080");
    }

    #[tokio::test]
    async fn test_wait_for_cleanups_waits_for_tasks() {
        let cleanups = TaskTracker::new();
        let (done_tx, done_rx) = tokio::sync::oneshot::channel();
        cleanups.spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            let _ = done_tx.send(());
        });

        wait_for_cleanups(&cleanups, Duration::from_secs(5)).await;
        assert!(cleanups.is_empty());
        assert!(done_rx.await.is_ok());
    }

    #[tokio::test]
    async fn test_wait_for_cleanups_gives_up_after_limit() {
        let cleanups = TaskTracker::new();
        cleanups.spawn(std::future::pending::<()>());

        wait_for_cleanups(&cleanups, Duration::from_millis(20)).await;
        assert_eq!(cleanups.len(), 1);
    }

    #[tokio::test]
    async fn test_serve_stops_on_shutdown() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let result = serve(listener, state(), async {}).await;
        assert!(result.is_ok());
    }
}
