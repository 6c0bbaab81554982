//! IngestService — runs one notification batch through
//! parse → validate → key → upsert.
//!
//! Records are handled strictly in the order received. A record that fails
//! validation or whose write fails is logged and skipped; the rest of the
//! batch still runs. Only a broken envelope or an unexpected fault fails the
//! whole request.

use crate::services::{
    dedup,
    envelope::{self, ParseError},
    event_store::EventStore,
    schema::{self, ValidationMode},
};
use anyhow::Context;
use thiserror::Error;
use tracing::{debug, error, info, warn};

/// Per-batch outcome counts. Logged, never returned to the caller.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct IngestReport {
    pub received: usize,
    pub written: usize,
    pub rejected: usize,
    pub failed: usize,
}

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("invalid event envelope: {0}")]
    Envelope(#[from] ParseError),
    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

#[derive(Clone)]
pub struct IngestService {
    store: EventStore,
    mode: ValidationMode,
}

impl IngestService {
    pub fn new(store: EventStore, mode: ValidationMode) -> Self {
        Self { store, mode }
    }

    pub fn store(&self) -> &EventStore {
        &self.store
    }

    pub async fn ingest(&self, body: &[u8]) -> Result<IngestReport, IngestError> {
        let batch = envelope::parse(body)?;
        let mut report = IngestReport {
            received: batch.len(),
            ..IngestReport::default()
        };
        if batch.is_empty() {
            debug!("notification batch has no records");
        }

        for (index, raw) in batch.records.iter().enumerate() {
            let record = match schema::validate(raw, self.mode) {
                Ok(record) => record,
                Err(reason) => {
                    let (bucket, key) = schema::peek_identity(raw);
                    warn!(
                        index,
                        bucket = ?bucket,
                        key = ?key,
                        field = %reason.field,
                        cause = %reason.cause,
                        mode = %self.mode,
                        "rejected notification record"
                    );
                    report.rejected += 1;
                    continue;
                }
            };

            let key = dedup::key_of(&record);
            let value = serde_json::to_string(&record)
                .with_context(|| format!("serializing record `{}`", key))?;

            match self.store.upsert(&key, &value).await {
                Ok(ack) => {
                    debug!(
                        index,
                        key = %ack.event.key,
                        event = %record.event_name,
                        sequencer = %record.sequencer,
                        "stored notification record"
                    );
                    report.written += 1;
                }
                Err(err) => {
                    error!(index, key = %key, error = %err, "failed to store notification record");
                    report.failed += 1;
                }
            }
        }

        info!(
            received = report.received,
            written = report.written,
            rejected = report.rejected,
            failed = report.failed,
            "processed notification batch"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::event_store::test_support::{memory_store, poison_key};
    use serde_json::{Value, json};
    use std::time::Duration;

    async fn service(mode: ValidationMode) -> IngestService {
        IngestService::new(memory_store(Duration::from_secs(5)).await, mode)
    }

    fn record(bucket: &str, key: &str, sequencer: &str) -> Value {
        json!({
            "eventName": "s3:ObjectCreated:Put",
            "s3": {
                "bucket": {"name": bucket},
                "object": {"key": key, "size": 10, "eTag": "abc", "sequencer": sequencer}
            }
        })
    }

    fn body(records: Vec<Value>) -> Vec<u8> {
        serde_json::to_vec(&json!({ "Records": records })).unwrap()
    }

    async fn stored(svc: &IngestService, key: &str) -> Value {
        let row = svc.store().fetch(key).await.expect("row exists");
        serde_json::from_str(&row.value).unwrap()
    }

    #[tokio::test]
    async fn stores_one_row_per_object_and_resubmission_is_a_no_op() {
        let svc = service(ValidationMode::Lenient).await;
        let payload = br#"{"Records":[{"eventName":"s3:ObjectCreated:Put","s3":{"bucket":{"name":"b1"},"object":{"key":"f1.txt","size":10,"eTag":"abc","sequencer":"1"}}}]}"#;

        let report = svc.ingest(payload).await.unwrap();
        assert_eq!(report.written, 1);
        let first = svc.store().fetch("b1/f1.txt").await.unwrap();
        let value: Value = serde_json::from_str(&first.value).unwrap();
        assert_eq!(value["eventName"], "s3:ObjectCreated:Put");
        assert_eq!(value["bucketName"], "b1");
        assert_eq!(value["objectKey"], "f1.txt");
        assert_eq!(value["eTag"], "abc");

        svc.ingest(payload).await.unwrap();
        assert_eq!(svc.store().count().await, 1);
        assert_eq!(svc.store().fetch("b1/f1.txt").await.unwrap(), first);
    }

    #[tokio::test]
    async fn later_sequencer_replaces_earlier() {
        let svc = service(ValidationMode::Lenient).await;
        svc.ingest(&body(vec![record("b1", "f1.txt", "1")])).await.unwrap();
        svc.ingest(&body(vec![record("b1", "f1.txt", "2")])).await.unwrap();

        assert_eq!(svc.store().count().await, 1);
        assert_eq!(stored(&svc, "b1/f1.txt").await["sequencer"], "2");
    }

    #[tokio::test]
    async fn later_record_in_same_batch_wins() {
        let svc = service(ValidationMode::Lenient).await;
        let report = svc
            .ingest(&body(vec![
                record("b1", "f1.txt", "1"),
                record("b1", "f1.txt", "3"),
                record("b1", "f1.txt", "2"),
            ]))
            .await
            .unwrap();

        assert_eq!(report.written, 3);
        assert_eq!(stored(&svc, "b1/f1.txt").await["sequencer"], "2");
    }

    #[tokio::test]
    async fn invalid_record_is_skipped_and_the_rest_are_written() {
        let svc = service(ValidationMode::Lenient).await;
        let missing_key = json!({
            "eventName": "s3:ObjectCreated:Put",
            "s3": {"bucket": {"name": "b1"}, "object": {"size": 1}}
        });
        let report = svc
            .ingest(&body(vec![
                record("b1", "a.txt", "1"),
                missing_key,
                json!(17),
                record("b1", "c.txt", "1"),
            ]))
            .await
            .unwrap();

        assert_eq!(
            report,
            IngestReport {
                received: 4,
                written: 2,
                rejected: 2,
                failed: 0
            }
        );
        assert_eq!(svc.store().count().await, 2);
    }

    #[tokio::test]
    async fn write_failure_does_not_abort_the_batch() {
        let svc = service(ValidationMode::Lenient).await;
        poison_key(svc.store(), "b1/bad.txt").await;

        let report = svc
            .ingest(&body(vec![
                record("b1", "a.txt", "1"),
                record("b1", "bad.txt", "1"),
                record("b1", "c.txt", "1"),
            ]))
            .await
            .unwrap();

        assert_eq!(report.written, 2);
        assert_eq!(report.failed, 1);
        assert!(svc.store().fetch("b1/bad.txt").await.is_none());
        assert!(svc.store().fetch("b1/c.txt").await.is_some());
    }

    #[tokio::test]
    async fn same_object_key_in_two_buckets_stays_separate() {
        let svc = service(ValidationMode::Lenient).await;
        svc.ingest(&body(vec![
            record("b1", "f1.txt", "1"),
            record("b2", "f1.txt", "1"),
        ]))
        .await
        .unwrap();
        assert_eq!(svc.store().count().await, 2);
    }

    #[tokio::test]
    async fn missing_records_array_writes_nothing() {
        let svc = service(ValidationMode::Lenient).await;
        let err = svc.ingest(br#"{"records":[]}"#).await.unwrap_err();
        assert!(matches!(err, IngestError::Envelope(ParseError::MissingRecords)));
        assert_eq!(svc.store().count().await, 0);
    }

    #[tokio::test]
    async fn empty_batch_is_a_no_op() {
        let svc = service(ValidationMode::Lenient).await;
        let report = svc.ingest(br#"{"Records":[]}"#).await.unwrap();
        assert_eq!(report, IngestReport::default());
        assert_eq!(svc.store().count().await, 0);
    }

    #[tokio::test]
    async fn strict_mode_rejects_records_lenient_mode_accepts() {
        let svc = service(ValidationMode::Strict).await;
        let report = svc
            .ingest(&body(vec![record("b1", "f1.txt", "1")]))
            .await
            .unwrap();
        assert_eq!(report.rejected, 1);
        assert_eq!(svc.store().count().await, 0);
    }
}
