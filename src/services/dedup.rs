//! Dedup key derivation.

use crate::models::notification::NotificationRecord;

/// Stable idempotency key for a validated record: `{bucket}/{object_key}`.
///
/// Bucket names cannot contain `/`, so the first separator always splits the
/// pair unambiguously. The event name is deliberately left out: a delete
/// after a create replaces the row for that object.
pub fn key_of(record: &NotificationRecord) -> String {
    format!("{}/{}", record.bucket_name, record.object_key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::notification::RecordMetadata;

    fn record(bucket: &str, key: &str, event: &str) -> NotificationRecord {
        NotificationRecord {
            event_name: event.into(),
            event_time: None,
            bucket_name: bucket.into(),
            object_key: key.into(),
            size: 0,
            e_tag: String::new(),
            sequencer: String::new(),
            metadata: RecordMetadata::default(),
        }
    }

    #[test]
    fn key_combines_bucket_and_object() {
        assert_eq!(key_of(&record("b1", "f1.txt", "s3:ObjectCreated:Put")), "b1/f1.txt");
        assert_eq!(
            key_of(&record("photos", "2024/05/cat.jpg", "s3:ObjectCreated:Put")),
            "photos/2024/05/cat.jpg"
        );
    }

    #[test]
    fn same_object_in_different_buckets_gets_distinct_keys() {
        assert_ne!(
            key_of(&record("b1", "f1.txt", "s3:ObjectCreated:Put")),
            key_of(&record("b2", "f1.txt", "s3:ObjectCreated:Put"))
        );
    }

    #[test]
    fn event_name_does_not_affect_key() {
        assert_eq!(
            key_of(&record("b1", "f1.txt", "s3:ObjectCreated:Put")),
            key_of(&record("b1", "f1.txt", "s3:ObjectRemoved:Delete"))
        );
    }
}
