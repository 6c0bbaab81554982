//! Defines routes for the bucket event ingest service.
//!
//! ## Structure
//! - **Ingest endpoints**
//!   - `POST /minio-event` — validate and store a notification batch
//!   - `POST /event`       — same handler, kept for older notification targets
//!
//! - **Diagnostics**
//!   - `POST /minio-webhook` — log the raw payload, store nothing
//!   - `GET  /hello`, `GET /healthz`, `GET /readyz`

use crate::{
    handlers::{
        debug_handlers::log_event,
        event_handlers::ingest_event,
        health_handlers::{healthz, hello, readyz},
    },
    state::AppState,
};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};

/// Build and return the router.
///
/// `max_body_bytes` caps every request body; notification batches above it
/// are refused by axum with 413 before reaching a handler.
pub fn routes(max_body_bytes: usize) -> Router<AppState> {
    Router::new()
        // health endpoints (mounted at root)
        .route("/hello", get(hello))
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        // ingest
        .route("/minio-event", post(ingest_event))
        .route("/event", post(ingest_event))
        // diagnostics
        .route("/minio-webhook", post(log_event))
        .layer(DefaultBodyLimit::max(max_body_bytes))
}
