//! Custom error types for the photos service

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Custom error type for photo lifecycle operations
#[derive(Error, Debug)]
pub enum PhotoError {
    /// Caller identity does not match the resource owner, or the token
    /// failed validation; no detail on why is ever surfaced
    #[error("Unauthorized")]
    Unauthorized,

    /// Photo does not exist among the user's photos
    #[error("Photo not found")]
    NotFound,

    /// Target photo is already the main photo
    #[error("This photo is already the main photo")]
    AlreadyMain,

    /// The current main photo cannot be deleted
    #[error("The main photo cannot be deleted")]
    MainPhotoUndeletable,

    /// Upload to the remote asset backend failed; nothing was stored locally
    #[error("Photo upload failed")]
    UploadFailed(anyhow::Error),

    /// Remote asset deletion failed; the local record is untouched and the
    /// caller may retry
    #[error("Photo deletion failed")]
    RemoteDeleteFailed(anyhow::Error),

    /// Bad request with message
    #[error("{0}")]
    BadRequest(String),

    /// Internal server error
    #[error("Internal server error")]
    Internal(anyhow::Error),
}

impl From<anyhow::Error> for PhotoError {
    fn from(e: anyhow::Error) -> Self {
        PhotoError::Internal(e)
    }
}

impl IntoResponse for PhotoError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            PhotoError::Unauthorized => (StatusCode::UNAUTHORIZED, self.to_string()),
            PhotoError::NotFound
            | PhotoError::AlreadyMain
            | PhotoError::MainPhotoUndeletable => (StatusCode::BAD_REQUEST, self.to_string()),
            PhotoError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            PhotoError::UploadFailed(e) | PhotoError::RemoteDeleteFailed(e) => {
                error!("Asset backend error: {:#}", e);
                (StatusCode::BAD_GATEWAY, "Asset storage error".to_string())
            }
            PhotoError::Internal(e) => {
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
