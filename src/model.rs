use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// Data model representing a Todo item, owned by a username
#[derive(Debug, Clone, PartialEq, sqlx::FromRow, Serialize, Deserialize)]
pub struct Todo {
    pub id: i64,
    pub text: String,
    pub username: String,
}

// Persisted user record; `password` holds the Argon2 PHC string
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub name: Option<String>,
    pub email: String,
    pub username: String,
    pub password: String,
}

/// Identity captured into the session at login. Not re-validated against
/// the user table on later requests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserSnapshot {
    pub id: i64,
    pub email: String,
    pub username: String,
}

impl From<&User> for UserSnapshot {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            username: user.username.clone(),
        }
    }
}

/// Server-side session state attached to every request.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    /// `None` for a client that has no stored session.
    pub id: Option<String>,
    pub is_auth: bool,
    pub user_data: Option<UserSnapshot>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn anonymous() -> Self {
        Self {
            id: None,
            is_auth: false,
            user_data: None,
            expires_at: DateTime::<Utc>::MIN_UTC,
        }
    }

    pub fn authenticated(id: String, user: UserSnapshot, expires_at: DateTime<Utc>) -> Self {
        Self {
            id: Some(id),
            is_auth: true,
            user_data: Some(user),
            expires_at,
        }
    }
}

// Authenticated caller, inserted into request extensions by the auth gate
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub session_id: String,
    pub user: UserSnapshot,
}

impl CurrentUser {
    pub fn username(&self) -> &str {
        &self.user.username
    }
}
