//! Per-session access throttle guarding todo creation.
//!
//! A session may pass at most once per [`THROTTLE_WINDOW_MS`] milliseconds. A rejected
//! request does not refresh the stored time, so a burst keeps comparing
//! against the last permitted access until one lands outside the window.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::error::AppError;

pub const THROTTLE_WINDOW_MS: i64 = 1000;

#[async_trait]
pub trait AccessStore: Send + Sync {
    /// Stores `now_ms` for the session if it has no record yet or its last
    /// permitted access is at least `window_ms` old. Returns whether the
    /// access was recorded (i.e. permitted).
    async fn record_if_elapsed(
        &self,
        session_id: &str,
        now_ms: i64,
        window_ms: i64,
    ) -> Result<bool, AppError>;

    async fn last_access(&self, session_id: &str) -> Result<Option<i64>, AppError>;

    async fn forget(&self, session_id: &str) -> Result<(), AppError>;
}

#[derive(Clone)]
pub struct SqliteAccessStore {
    db: SqlitePool,
}

impl SqliteAccessStore {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl AccessStore for SqliteAccessStore {
    async fn record_if_elapsed(
        &self,
        session_id: &str,
        now_ms: i64,
        window_ms: i64,
    ) -> Result<bool, AppError> {
        // check and write in one statement
        let result = sqlx::query(
            "INSERT INTO access (session_id, time) VALUES (?, ?) \
             ON CONFLICT(session_id) DO UPDATE SET time = excluded.time \
             WHERE excluded.time - access.time >= ?",
        )
        .bind(session_id)
        .bind(now_ms)
        .bind(window_ms)
        .execute(&self.db)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn last_access(&self, session_id: &str) -> Result<Option<i64>, AppError> {
        let time = sqlx::query_scalar::<_, i64>("SELECT time FROM access WHERE session_id = ?")
            .bind(session_id)
            .fetch_optional(&self.db)
            .await?;
        Ok(time)
    }

    async fn forget(&self, session_id: &str) -> Result<(), AppError> {
        sqlx::query("DELETE FROM access WHERE session_id = ?")
            .bind(session_id)
            .execute(&self.db)
            .await?;
        Ok(())
    }
}

#[derive(Clone)]
pub struct AccessThrottle {
    store: Arc<dyn AccessStore>,
    window_ms: i64,
}

impl AccessThrottle {
    pub fn new(store: Arc<dyn AccessStore>) -> Self {
        Self {
            store,
            window_ms: THROTTLE_WINDOW_MS,
        }
    }

    pub async fn check(&self, session_id: &str) -> Result<(), AppError> {
        self.check_at(session_id, Utc::now()).await
    }

    pub async fn check_at(&self, session_id: &str, now: DateTime<Utc>) -> Result<(), AppError> {
        let permitted = self
            .store
            .record_if_elapsed(session_id, now.timestamp_millis(), self.window_ms)
            .await?;

        if permitted {
            Ok(())
        } else {
            tracing::info!(session_id, "access throttled");
            Err(AppError::RateLimited)
        }
    }

    pub async fn forget(&self, session_id: &str) -> Result<(), AppError> {
        self.store.forget(session_id).await
    }

    /// Millisecond timestamp of the last permitted access, if any.
    pub async fn last_access(&self, session_id: &str) -> Result<Option<i64>, AppError> {
        self.store.last_access(session_id).await
    }
}
