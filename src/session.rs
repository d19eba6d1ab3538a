//! Server-side session storage.
//!
//! The session cookie only carries an opaque id; authentication state and
//! the user snapshot live in the `sessions` table behind [`SessionStore`].

use async_trait::async_trait;
use axum_extra::extract::cookie::{Cookie, SameSite};
use base64::{engine::general_purpose, Engine};
use chrono::{DateTime, TimeZone, Utc};
use ring::rand::{SecureRandom, SystemRandom};
use sqlx::SqlitePool;

use crate::{
    error::AppError,
    model::{Session, UserSnapshot},
};

const SESSION_ID_BYTES: usize = 32;

#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Loads a live session; expired or unknown ids yield `None`.
    async fn load(&self, id: &str, now: DateTime<Utc>) -> Result<Option<Session>, AppError>;

    async fn save(&self, session: &Session) -> Result<(), AppError>;

    async fn destroy(&self, id: &str) -> Result<(), AppError>;

    /// Deletes every session cached for `username` and returns their ids.
    async fn destroy_for_user(&self, username: &str) -> Result<Vec<String>, AppError>;

    /// Deletes sessions that expired at or before `now` and returns their ids.
    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<Vec<String>, AppError>;
}

#[derive(Debug, sqlx::FromRow)]
struct SessionRow {
    id: String,
    is_auth: bool,
    user_id: Option<i64>,
    email: Option<String>,
    username: Option<String>,
    expires_at: i64,
}

impl From<SessionRow> for Session {
    fn from(row: SessionRow) -> Self {
        let user_data = match (row.user_id, row.email, row.username) {
            (Some(id), Some(email), Some(username)) => Some(UserSnapshot {
                id,
                email,
                username,
            }),
            _ => None,
        };
        Session {
            id: Some(row.id),
            is_auth: row.is_auth && user_data.is_some(),
            user_data,
            expires_at: Utc
                .timestamp_millis_opt(row.expires_at)
                .single()
                .unwrap_or(DateTime::<Utc>::MIN_UTC),
        }
    }
}

#[derive(Clone)]
pub struct SqliteSessionStore {
    db: SqlitePool,
}

impl SqliteSessionStore {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl SessionStore for SqliteSessionStore {
    async fn load(&self, id: &str, now: DateTime<Utc>) -> Result<Option<Session>, AppError> {
        let row = sqlx::query_as::<_, SessionRow>(
            "SELECT id, is_auth, user_id, email, username, expires_at \
             FROM sessions WHERE id = ? AND expires_at > ?",
        )
        .bind(id)
        .bind(now.timestamp_millis())
        .fetch_optional(&self.db)
        .await?;

        Ok(row.map(Session::from))
    }

    async fn save(&self, session: &Session) -> Result<(), AppError> {
        let id = session
            .id
            .as_deref()
            .ok_or_else(|| AppError::Internal("cannot persist a session without an id".into()))?;
        let user = session.user_data.as_ref();

        sqlx::query(
            "INSERT INTO sessions (id, is_auth, user_id, email, username, expires_at) \
             VALUES (?, ?, ?, ?, ?, ?) \
             ON CONFLICT(id) DO UPDATE SET is_auth = excluded.is_auth, \
             user_id = excluded.user_id, email = excluded.email, \
             username = excluded.username, expires_at = excluded.expires_at",
        )
        .bind(id)
        .bind(session.is_auth)
        .bind(user.map(|u| u.id))
        .bind(user.map(|u| u.email.as_str()))
        .bind(user.map(|u| u.username.as_str()))
        .bind(session.expires_at.timestamp_millis())
        .execute(&self.db)
        .await?;

        Ok(())
    }

    async fn destroy(&self, id: &str) -> Result<(), AppError> {
        sqlx::query("DELETE FROM sessions WHERE id = ?")
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(())
    }

    async fn destroy_for_user(&self, username: &str) -> Result<Vec<String>, AppError> {
        let ids = sqlx::query_scalar::<_, String>(
            "DELETE FROM sessions WHERE username = ? RETURNING id",
        )
        .bind(username)
        .fetch_all(&self.db)
        .await?;
        Ok(ids)
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<Vec<String>, AppError> {
        let ids = sqlx::query_scalar::<_, String>(
            "DELETE FROM sessions WHERE expires_at <= ? RETURNING id",
        )
        .bind(now.timestamp_millis())
        .fetch_all(&self.db)
        .await?;
        Ok(ids)
    }
}

/// 256 bits from the system CSPRNG, URL-safe base64 without padding.
pub fn generate_session_id() -> Result<String, AppError> {
    let mut bytes = [0u8; SESSION_ID_BYTES];
    SystemRandom::new()
        .fill(&mut bytes)
        .map_err(|_| AppError::Internal("failed to generate session id".into()))?;
    Ok(general_purpose::URL_SAFE_NO_PAD.encode(bytes))
}

pub fn session_cookie(name: &str, id: &str) -> Cookie<'static> {
    Cookie::build(name.to_string(), id.to_string())
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .finish()
}

/// Cookie to hand to `CookieJar::remove`; path must match the one set at login.
pub fn removal_cookie(name: &str) -> Cookie<'static> {
    Cookie::build(name.to_string(), String::new())
        .path("/")
        .finish()
}
