//! Represents a bucket notification record after schema validation.

use serde::Serialize;
use serde_json::Value;

/// Raw records of one request body, in the order they were received.
///
/// Records stay untyped until they pass [`crate::services::schema::validate`],
/// so a single malformed entry never poisons the rest of the batch.
#[derive(Debug, Clone, Default)]
pub struct NotificationBatch {
    pub records: Vec<Value>,
}

impl NotificationBatch {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// One object-storage event that passed validation.
///
/// This is also the stored JSON value, so field names follow the
/// notification format (`eventName`, `eTag`, ...).
#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NotificationRecord {
    /// Operation type, e.g. `s3:ObjectCreated:Put`.
    pub event_name: String,

    /// RFC 3339 timestamp as sent by the source.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_time: Option<String>,

    pub bucket_name: String,

    pub object_key: String,

    /// Object size in bytes, 0 when the source omitted it.
    pub size: u64,

    #[serde(rename = "eTag")]
    pub e_tag: String,

    /// Per-object monotonic version token from the source.
    pub sequencer: String,

    #[serde(skip_serializing_if = "RecordMetadata::is_empty")]
    pub metadata: RecordMetadata,
}

/// Identity and correlation details carried by a record.
///
/// Kept for fidelity; none of it participates in deduplication.
#[derive(Serialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RecordMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub principal_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_ip_address: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub host_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub bucket_owner: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub bucket_arn: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_host: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
}

impl RecordMetadata {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}
