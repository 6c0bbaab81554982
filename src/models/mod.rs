//! Core data models for the bucket event ingest service.
//!
//! `notification` holds the validated shape of one event record;
//! `stored_event` maps the persisted row via `sqlx::FromRow`.

pub mod notification;
pub mod stored_event;
