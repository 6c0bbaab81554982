//! Represents one deduplicated event row.

use sqlx::FromRow;

/// A persisted event in the `events` table.
///
/// Exactly one row exists per `key`; every later record with the same key
/// replaces `value` wholesale.
#[derive(Clone, FromRow, Debug, PartialEq, Eq)]
pub struct StoredEvent {
    /// Dedup key, `{bucket}/{object_key}`.
    pub key: String,

    /// The validated record serialized as JSON text.
    pub value: String,
}
