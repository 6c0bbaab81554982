//! Ingest pipeline, leaf-first: envelope → schema → dedup → event_store,
//! orchestrated by `ingest_service`.

pub mod dedup;
pub mod envelope;
pub mod event_store;
pub mod ingest_service;
pub mod schema;
