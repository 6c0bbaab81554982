//! src/services/event_store.rs
//!
//! EventStore — the upsert writer. Each record is written in its own SQLite
//! transaction taken from the shared pool, so a failed record rolls back alone
//! and never blocks its siblings.

use crate::models::stored_event::StoredEvent;
use sqlx::SqlitePool;
use std::{sync::Arc, time::Duration};
use thiserror::Error;
use tokio::time::timeout;
use tracing::debug;

/// Schema for the `events` table, embedded so `--migrate` works from any cwd.
const INIT_MIGRATION: &str = include_str!("../../migrations/0001_init.sql");

#[derive(Debug, Error)]
pub enum WriteError {
    #[error("write did not complete within {0:?}")]
    Timeout(Duration),
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

pub type StoreResult<T> = Result<T, WriteError>;

/// Acknowledgement of a committed upsert.
#[derive(Debug, Clone)]
pub struct Ack {
    /// Row as it exists after the commit.
    pub event: StoredEvent,
}

/// EventStore persists `(key, value)` pairs with insert-or-replace semantics.
///
/// Cloning is cheap; every clone shares the same connection pool.
#[derive(Clone)]
pub struct EventStore {
    /// Shared SQLite connection pool.
    pub db: Arc<SqlitePool>,

    /// Upper bound for one record write, including connection acquisition.
    write_timeout: Duration,
}

impl EventStore {
    pub fn new(db: Arc<SqlitePool>, write_timeout: Duration) -> Self {
        Self { db, write_timeout }
    }

    /// Insert `value` under `key`, replacing any existing value entirely.
    ///
    /// The write runs in its own transaction. On error or timeout the
    /// transaction is dropped uncommitted, which rolls it back and returns
    /// the connection to the pool.
    pub async fn upsert(&self, key: &str, value: &str) -> StoreResult<Ack> {
        match timeout(self.write_timeout, self.upsert_in_transaction(key, value)).await {
            Ok(result) => result,
            Err(_) => Err(WriteError::Timeout(self.write_timeout)),
        }
    }

    /// The upsert must be the first statement of the transaction. A leading
    /// read would start it as a reader, and the later lock upgrade fails
    /// with `SQLITE_BUSY` instead of waiting when another writer commits.
    async fn upsert_in_transaction(&self, key: &str, value: &str) -> StoreResult<Ack> {
        let mut tx = self.db.begin().await?;

        let event = sqlx::query_as::<_, StoredEvent>(
            r#"
            INSERT INTO events (key, value) VALUES (?, ?)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value
            RETURNING key, value
            "#,
        )
        .bind(key)
        .bind(value)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        debug!(key, "upsert committed");
        Ok(Ack { event })
    }

    /// Lightweight connectivity check (`SELECT 1`).
    pub async fn ping(&self) -> StoreResult<()> {
        let fut = sqlx::query_scalar::<_, i64>("SELECT 1").fetch_one(&*self.db);
        match timeout(self.write_timeout, fut).await {
            Ok(Ok(1)) => Ok(()),
            Ok(Ok(other)) => Err(WriteError::Sqlx(sqlx::Error::Protocol(format!(
                "unexpected result: {}",
                other
            )))),
            Ok(Err(err)) => Err(err.into()),
            Err(_) => Err(WriteError::Timeout(self.write_timeout)),
        }
    }
}

/// Apply the embedded migration statements. Returns how many ran.
pub async fn run_migrations(db: &SqlitePool) -> Result<usize, sqlx::Error> {
    let statements = INIT_MIGRATION
        .split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>();

    for stmt in &statements {
        debug!("Executing migration SQL: {}", stmt);
        sqlx::query(stmt).execute(db).await?;
    }

    Ok(statements.len())
}

#[cfg(test)]
impl EventStore {
    pub async fn fetch(&self, key: &str) -> Option<StoredEvent> {
        sqlx::query_as::<_, StoredEvent>("SELECT key, value FROM events WHERE key = ?")
            .bind(key)
            .fetch_optional(&*self.db)
            .await
            .unwrap()
    }

    pub async fn count(&self) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM events")
            .fetch_one(&*self.db)
            .await
            .unwrap()
    }
}
