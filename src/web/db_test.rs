//! `/db-test` handler.
//!
//! The ephemeral table must outlive the response. The [`DeferredCleanup`]
//! guard rides inside the response body stream and is dropped once the body
//! has been fully written (or abandoned by the client), which triggers the
//! `DROP TABLE`.

use crate::db::{DeferredCleanup, run_probe};
use crate::web::AppState;
use crate::web::render::db_test_page;
use axum::body::{Body, Bytes};
use axum::extract::State;
use axum::http::header;
use axum::response::{IntoResponse, Response};
use futures_util::Stream;
use futures_util::stream;
use std::convert::Infallible;
use tracing::{debug, error};

pub const HTML_CONTENT_TYPE: &str = "text/html; charset=utf-8";

pub async fn db_test(State(state): State<AppState>) -> Response {
    let outcome = match run_probe(&state.probe, &state.cleanups).await {
        Ok(outcome) => outcome,
        Err(e) => {
            error!(error = %e, "Probe could not run");
            return e.into_response();
        }
    };

    let html = db_test_page(&outcome.report);
    let body = match outcome.cleanup {
        Some(cleanup) => {
            debug!(table = ?cleanup.table_name(), "Cleanup attached to response body");
            Body::from_stream(body_then_cleanup(html, cleanup))
        }
        None => Body::from(html),
    };

    ([(header::CONTENT_TYPE, HTML_CONTENT_TYPE)], body).into_response()
}

/// A single-chunk body stream that holds `cleanup` until it is exhausted or dropped.
fn body_then_cleanup(
    html: String,
    cleanup: DeferredCleanup,
) -> impl Stream<Item = Result<Bytes, Infallible>> + Send + 'static {
    stream::unfold((Some(html), cleanup), |(chunk, cleanup)| async move {
        chunk.map(|html| (Ok::<_, Infallible>(Bytes::from(html)), (None, cleanup)))
    })
}
