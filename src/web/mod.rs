//! HTTP surface of the service.
//!
//! Two pages are served:
//! - `/db-test`: runs the database probe and renders its report
//! - `/`: the session-backed grade book (GET shows, POST adds a student)

pub mod db_test;
pub mod gradebook;
pub mod render;
pub mod server;

pub use server::HttpServer;

use crate::db::ProbeSettings;
use crate::session::SessionStore;
use axum::Router;
use axum::routing::get;
use std::sync::Arc;
use tokio_util::task::TaskTracker;

/// State shared by all handlers.
#[derive(Clone)]
pub struct AppState {
    pub probe: Arc<ProbeSettings>,
    pub sessions: SessionStore,
    /// Table drops still running after their response went out
    pub cleanups: TaskTracker,
}

impl AppState {
    pub fn new(probe: ProbeSettings, sessions: SessionStore) -> Self {
        Self {
            probe: Arc::new(probe),
            sessions,
            cleanups: TaskTracker::new(),
        }
    }
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/db-test", get(db_test::db_test))
        .route("/", get(gradebook::show).post(gradebook::submit))
        .with_state(state)
}
