//! Session-authenticated todo list service.
//!
//! Users register and log in with a server-side session (cookie carries only
//! the session id) and manage their own todos through JSON endpoints. Every
//! todo route passes the auth gate; creation additionally passes a
//! per-session throttle.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

pub mod config;
pub mod db;
pub mod error;
pub mod handler;
pub mod middleware;
pub mod model;
pub mod pages;
pub mod password;
pub mod repository;
pub mod route;
pub mod schema;
pub mod session;
pub mod throttle;
pub mod validation;

use config::Config;
use repository::{TodoRepository, UserRepository};
use session::{SessionStore, SqliteSessionStore};
use throttle::{AccessThrottle, SqliteAccessStore};

// Struct representing the application state
pub struct AppState {
    pub db: SqlitePool,
    pub config: Config,
    pub sessions: Arc<dyn SessionStore>,
    pub throttle: AccessThrottle,
    pub todos: TodoRepository,
    pub users: UserRepository,
}

impl AppState {
    /// Wires the SQLite-backed stores over one pool.
    pub fn new(db: SqlitePool, config: Config) -> Self {
        Self {
            sessions: Arc::new(SqliteSessionStore::new(db.clone())),
            throttle: AccessThrottle::new(Arc::new(SqliteAccessStore::new(db.clone()))),
            todos: TodoRepository::new(db.clone()),
            users: UserRepository::new(db.clone()),
            config,
            db,
        }
    }

    /// Deletes expired sessions with their access records; returns how many
    /// sessions went.
    pub async fn purge_expired_sessions(
        &self,
        now: DateTime<Utc>,
    ) -> Result<usize, error::AppError> {
        let purged = self.sessions.purge_expired(now).await?;
        for session_id in &purged {
            self.throttle.forget(session_id).await?;
        }
        if !purged.is_empty() {
            tracing::info!(count = purged.len(), "expired sessions purged");
        }
        Ok(purged.len())
    }
}
