//! Splits a request body into raw notification records.
//!
//! Only the envelope is checked here. Individual records are passed on
//! untouched and validated one at a time by `schema`.

use crate::models::notification::NotificationBatch;
use serde_json::Value;
use thiserror::Error;

/// Name of the array field holding the records.
pub const RECORDS_FIELD: &str = "Records";

/// Structural failure of the whole payload. No record is processed.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("body is not valid JSON: {0}")]
    MalformedJson(#[from] serde_json::Error),
    #[error("top-level value must be a JSON object")]
    NotAnObject,
    #[error("missing `Records` array")]
    MissingRecords,
    #[error("`Records` must be an array")]
    RecordsNotArray,
}

pub fn parse(raw_body: &[u8]) -> Result<NotificationBatch, ParseError> {
    let value: Value = serde_json::from_slice(raw_body)?;
    let Value::Object(mut envelope) = value else {
        return Err(ParseError::NotAnObject);
    };

    match envelope.remove(RECORDS_FIELD) {
        Some(Value::Array(records)) => Ok(NotificationBatch { records }),
        Some(_) => Err(ParseError::RecordsNotArray),
        None => Err(ParseError::MissingRecords),
    }
}
