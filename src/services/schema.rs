//! Event schema validation for a single notification record.
//!
//! Records arrive as untyped JSON and are checked field by field so a
//! rejection can name the exact dotted path that failed (`s3.object.key`).
//! Unknown fields are ignored.
//!
//! Two modes share one code path:
//! - **lenient**: only `eventName`, `s3.bucket.name` and `s3.object.key` are
//!   required; `size`, `eTag`, `sequencer` fall back to `0` / `""`.
//! - **strict**: `eventTime` and every nested object (`userIdentity`,
//!   `requestParameters`, `responseElements`, bucket owner/ARN, object
//!   size/eTag/sequencer, `source`) must be fully present.

use crate::models::notification::{NotificationRecord, RecordMetadata};
use chrono::DateTime;
use serde_json::Value;
use std::{fmt, str::FromStr};
use thiserror::Error;

const EVENT_NAME: &[&str] = &["eventName"];
const EVENT_TIME: &[&str] = &["eventTime"];
const BUCKET_NAME: &[&str] = &["s3", "bucket", "name"];
const BUCKET_OWNER: &[&str] = &["s3", "bucket", "ownerIdentity", "principalId"];
const BUCKET_ARN: &[&str] = &["s3", "bucket", "arn"];
const OBJECT_KEY: &[&str] = &["s3", "object", "key"];
const OBJECT_SIZE: &[&str] = &["s3", "object", "size"];
const OBJECT_ETAG: &[&str] = &["s3", "object", "eTag"];
const OBJECT_SEQUENCER: &[&str] = &["s3", "object", "sequencer"];
const PRINCIPAL_ID: &[&str] = &["userIdentity", "principalId"];
const SOURCE_IP: &[&str] = &["requestParameters", "sourceIPAddress"];
const REQUEST_ID: &[&str] = &["responseElements", "x-amz-request-id"];
const HOST_ID: &[&str] = &["responseElements", "x-amz-id-2"];
const SOURCE_HOST: &[&str] = &["source", "host"];
const USER_AGENT: &[&str] = &["source", "userAgent"];

/// How much of the record shape must be present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ValidationMode {
    #[default]
    Lenient,
    Strict,
}

impl FromStr for ValidationMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "lenient" => Ok(Self::Lenient),
            "strict" => Ok(Self::Strict),
            other => Err(format!(
                "unknown validation mode `{}` (expected `lenient` or `strict`)",
                other
            )),
        }
    }
}

impl fmt::Display for ValidationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lenient => f.write_str("lenient"),
            Self::Strict => f.write_str("strict"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RejectionCause {
    #[error("is missing")]
    Missing,
    #[error("must be {expected}")]
    WrongType { expected: &'static str },
    #[error("must not be empty")]
    Empty,
    #[error("is not an RFC 3339 timestamp ({0})")]
    InvalidTimestamp(String),
}

/// Why a record was rejected, with the dotted path of the offending field.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("`{field}` {cause}")]
pub struct RejectionReason {
    pub field: String,
    pub cause: RejectionCause,
}

impl RejectionReason {
    fn new(field: impl Into<String>, cause: RejectionCause) -> Self {
        Self {
            field: field.into(),
            cause,
        }
    }
}

/// Validate one raw record against the notification schema.
pub fn validate(raw: &Value, mode: ValidationMode) -> Result<NotificationRecord, RejectionReason> {
    if !raw.is_object() {
        return Err(RejectionReason::new(
            "record",
            RejectionCause::WrongType { expected: "object" },
        ));
    }
    let strict = mode == ValidationMode::Strict;

    let event_name = require_str(raw, EVENT_NAME)?;
    let event_time = field_str(raw, EVENT_TIME, strict)?;
    if let Some(ts) = event_time.as_deref() {
        DateTime::parse_from_rfc3339(ts).map_err(|err| {
            RejectionReason::new(
                EVENT_TIME.join("."),
                RejectionCause::InvalidTimestamp(err.to_string()),
            )
        })?;
    }

    let bucket_name = require_non_empty(raw, BUCKET_NAME)?;
    let object_key = require_non_empty(raw, OBJECT_KEY)?;
    let size = field_u64(raw, OBJECT_SIZE, strict)?.unwrap_or(0);
    let e_tag = field_str(raw, OBJECT_ETAG, strict)?.unwrap_or_default();
    let sequencer = field_str(raw, OBJECT_SEQUENCER, strict)?.unwrap_or_default();

    let metadata = RecordMetadata {
        principal_id: field_str(raw, PRINCIPAL_ID, strict)?,
        source_ip_address: field_str(raw, SOURCE_IP, strict)?,
        request_id: field_str(raw, REQUEST_ID, strict)?,
        host_id: field_str(raw, HOST_ID, strict)?,
        bucket_owner: field_str(raw, BUCKET_OWNER, strict)?,
        bucket_arn: field_str(raw, BUCKET_ARN, strict)?,
        source_host: field_str(raw, SOURCE_HOST, strict)?,
        user_agent: field_str(raw, USER_AGENT, strict)?,
    };

    Ok(NotificationRecord {
        event_name,
        event_time,
        bucket_name,
        object_key,
        size,
        e_tag,
        sequencer,
        metadata,
    })
}

/// Best-effort `(bucket, key)` of a record that may not be valid, for log context.
pub fn peek_identity(raw: &Value) -> (Option<&str>, Option<&str>) {
    let get = |path: &[&str]| {
        path.iter()
            .try_fold(raw, |current, segment| current.get(*segment))
            .and_then(Value::as_str)
    };
    (get(BUCKET_NAME), get(OBJECT_KEY))
}

/// Walk `path` through nested objects. `null` counts as absent.
fn lookup<'a>(raw: &'a Value, path: &[&str]) -> Result<Option<&'a Value>, RejectionReason> {
    let mut current = raw;
    for (depth, segment) in path.iter().enumerate() {
        let Some(map) = current.as_object() else {
            return Err(RejectionReason::new(
                path[..depth].join("."),
                RejectionCause::WrongType { expected: "object" },
            ));
        };
        match map.get(*segment) {
            None | Some(Value::Null) => return Ok(None),
            Some(next) => current = next,
        }
    }
    Ok(Some(current))
}

fn field_str(
    raw: &Value,
    path: &[&str],
    required: bool,
) -> Result<Option<String>, RejectionReason> {
    match lookup(raw, path)? {
        None if required => Err(RejectionReason::new(path.join("."), RejectionCause::Missing)),
        None => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(RejectionReason::new(
            path.join("."),
            RejectionCause::WrongType { expected: "a string" },
        )),
    }
}

fn field_u64(raw: &Value, path: &[&str], required: bool) -> Result<Option<u64>, RejectionReason> {
    match lookup(raw, path)? {
        None if required => Err(RejectionReason::new(path.join("."), RejectionCause::Missing)),
        None => Ok(None),
        Some(value) => value.as_u64().map(Some).ok_or_else(|| {
            RejectionReason::new(
                path.join("."),
                RejectionCause::WrongType {
                    expected: "a non-negative integer",
                },
            )
        }),
    }
}

fn require_str(raw: &Value, path: &[&str]) -> Result<String, RejectionReason> {
    field_str(raw, path, true)?
        .ok_or_else(|| RejectionReason::new(path.join("."), RejectionCause::Missing))
}

fn require_non_empty(raw: &Value, path: &[&str]) -> Result<String, RejectionReason> {
    let value = require_str(raw, path)?;
    if value.is_empty() {
        return Err(RejectionReason::new(path.join("."), RejectionCause::Empty));
    }
    Ok(value)
}
