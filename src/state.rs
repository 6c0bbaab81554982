//! Shared router state.

use crate::services::ingest_service::IngestService;
use std::path::PathBuf;

/// Cloned into every request. Holds no mutable state of its own; the only
/// shared resource is the connection pool inside `ingest`.
#[derive(Clone)]
pub struct AppState {
    pub ingest: IngestService,

    /// Where `/minio-webhook` appends raw payloads, if anywhere.
    pub event_log_path: Option<PathBuf>,
}

impl AppState {
    pub fn new(ingest: IngestService, event_log_path: Option<PathBuf>) -> Self {
        Self {
            ingest,
            event_log_path,
        }
    }
}
