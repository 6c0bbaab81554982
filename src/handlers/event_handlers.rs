//! HTTP handler for bucket event notifications.
//!
//! The body is taken as raw bytes so envelope problems are reported by the
//! ingest pipeline itself rather than by axum's JSON extractor.

use crate::{
    errors::AppError,
    services::ingest_service::{IngestError, IngestReport},
    state::AppState,
};
use axum::extract::State;
use bytes::Bytes;
use futures::FutureExt;
use std::{any::Any, panic::AssertUnwindSafe};
use tracing::{Instrument, info_span, warn};
use uuid::Uuid;

pub const PROCESSED: &str = "Event processed";

/// `POST /minio-event` and `POST /event`.
///
/// 200 once every record has been attempted, whatever the per-record
/// outcome; 400 for a broken envelope; 500 for anything unexpected,
/// including a panic inside the pipeline.
pub async fn ingest_event(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<&'static str, AppError> {
    let request_id = Uuid::new_v4();
    let span = info_span!("ingest", %request_id, bytes = body.len());

    respond_guarded(request_id, state.ingest.ingest(&body).instrument(span)).await
}

/// Drive one ingest pipeline to completion and map its outcome to a response.
/// A panic inside `pipeline` is caught here and reported as a 500.
async fn respond_guarded<F>(request_id: Uuid, pipeline: F) -> Result<&'static str, AppError>
where
    F: Future<Output = Result<IngestReport, IngestError>>,
{
    let outcome = AssertUnwindSafe(pipeline).catch_unwind().await;

    match outcome {
        Ok(Ok(_report)) => Ok(PROCESSED),
        Ok(Err(IngestError::Envelope(err))) => {
            warn!(%request_id, error = %err, "rejected notification envelope");
            Err(AppError::bad_request(format!(
                "invalid event envelope: {}",
                err
            )))
        }
        Ok(Err(IngestError::Unexpected(err))) => Err(err.into()),
        Err(panic) => Err(AppError::internal(format!(
            "ingest panicked (request {}): {}",
            request_id,
            panic_message(panic.as_ref())
        ))),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        msg
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.as_str()
    } else {
        "non-string panic payload"
    }
}
