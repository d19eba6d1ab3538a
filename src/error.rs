//! Error types for the todo service.
//!
//! Every failure a handler can produce is an [`AppError`]. Its
//! [`IntoResponse`] impl renders the uniform `{status, message, error}`
//! envelope, where `error` is a stable [`ErrorKind`] and the HTTP status
//! always matches the envelope `status`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Stable, machine-readable error classification carried in the envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    Conflict,
    NotFound,
    NoItems,
    NoMoreItems,
    InvalidCredentials,
    Unauthenticated,
    Forbidden,
    RateLimited,
    Server,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Todo not found")]
    TodoNotFound,

    #[error("No todo found")]
    NoTodos,

    #[error("No more todo found")]
    NoMoreTodos,

    #[error("User Not Found Invalid Credentials")]
    UserNotFound,

    #[error("Wrong Password")]
    WrongPassword,

    #[error("Session Expired, please login again")]
    Unauthenticated,

    #[error("User not authorized to modify this todo")]
    Forbidden,

    #[error("Too Many Requests")]
    RateLimited,

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("password hashing error: {0}")]
    Password(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::Validation(_) => ErrorKind::Validation,
            AppError::Conflict(_) => ErrorKind::Conflict,
            AppError::TodoNotFound => ErrorKind::NotFound,
            AppError::NoTodos => ErrorKind::NoItems,
            AppError::NoMoreTodos => ErrorKind::NoMoreItems,
            AppError::UserNotFound | AppError::WrongPassword => ErrorKind::InvalidCredentials,
            AppError::Unauthenticated => ErrorKind::Unauthenticated,
            AppError::Forbidden => ErrorKind::Forbidden,
            AppError::RateLimited => ErrorKind::RateLimited,
            AppError::Database(_) | AppError::Password(_) | AppError::Internal(_) => {
                ErrorKind::Server
            }
        }
    }

    pub fn status(&self) -> StatusCode {
        match self.kind() {
            ErrorKind::Validation
            | ErrorKind::Conflict
            | ErrorKind::NotFound
            | ErrorKind::NoItems
            | ErrorKind::NoMoreItems
            | ErrorKind::InvalidCredentials => StatusCode::BAD_REQUEST,
            ErrorKind::Unauthenticated => StatusCode::UNAUTHORIZED,
            ErrorKind::Forbidden => StatusCode::FORBIDDEN,
            ErrorKind::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            ErrorKind::Server => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message shown to the client. Server-side failures never leak their detail.
    pub fn public_message(&self) -> String {
        match self.kind() {
            ErrorKind::Server => "Internal server error".to_string(),
            _ => self.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::debug!(error = %self, kind = ?self.kind(), "request rejected");
        }

        let body = serde_json::json!({
            "status": status.as_u16(),
            "message": self.public_message(),
            "error": self.kind(),
        });
        (status, Json(body)).into_response()
    }
}
