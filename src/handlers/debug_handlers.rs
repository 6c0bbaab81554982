//! Diagnostic receiver that records raw payloads without touching the store.
//! Handy when wiring up a new bucket notification target.

use crate::{errors::AppError, state::AppState};
use anyhow::Context;
use axum::extract::State;
use bytes::Bytes;
use serde_json::Value;
use tokio::{fs::OpenOptions, io::AsyncWriteExt};
use tracing::info;

pub const LOGGED: &str = "Event logged";

/// `POST /minio-webhook`
///
/// Pretty-prints the payload to the log and, when an event log path is
/// configured, appends it to that file.
pub async fn log_event(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<&'static str, AppError> {
    let payload: Value = serde_json::from_slice(&body)
        .map_err(|err| AppError::bad_request(format!("body is not valid JSON: {}", err)))?;
    let formatted = serde_json::to_string_pretty(&payload).context("formatting payload")?;
    info!(payload = %formatted, "received event payload");

    if let Some(path) = state.event_log_path.as_ref() {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await
            .with_context(|| format!("opening event log {}", path.display()))?;
        file.write_all(format!("{}\n", formatted).as_bytes())
            .await
            .with_context(|| format!("appending to event log {}", path.display()))?;
    }

    Ok(LOGGED)
}
