//! Custom error types for the auth service

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Custom error type for authentication flows
#[derive(Error, Debug)]
pub enum AuthError {
    /// Username is already registered
    #[error("Username already exists")]
    UsernameTaken,

    /// Unknown username or wrong password; never distinguishes the two
    #[error("Invalid username or password")]
    InvalidCredentials,

    /// Bad input with message
    #[error("{0}")]
    Validation(String),

    /// Too many failed login attempts for this account
    #[error("Too many attempts, try again later")]
    RateLimited,

    /// Internal server error
    #[error("Internal server error")]
    Internal(anyhow::Error),
}

impl From<anyhow::Error> for AuthError {
    fn from(e: anyhow::Error) -> Self {
        AuthError::Internal(e)
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AuthError::UsernameTaken => (StatusCode::BAD_REQUEST, self.to_string()),
            AuthError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
            AuthError::InvalidCredentials => (StatusCode::UNAUTHORIZED, self.to_string()),
            AuthError::RateLimited => (StatusCode::TOO_MANY_REQUESTS, self.to_string()),
            AuthError::Internal(e) => {
                error!("Internal error: {:#}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}
