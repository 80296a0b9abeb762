//! Error types for ecosort-web
//!
//! Handlers return [`ApiResult`]; the conversion to an HTTP response happens in
//! one place, here.

use crate::db::StorageError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Invalid request (400), e.g. missing upload or disallowed extension
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Upload larger than the configured body limit (413)
    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    /// Resource not found (404)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// History store failure (500)
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Storage(StorageError::InvalidArgument(_)) => StatusCode::BAD_REQUEST,
            ApiError::Storage(_) | ApiError::Internal(_) | ApiError::Io(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (error_code, message) = match &self {
            ApiError::BadRequest(msg) => ("BAD_REQUEST", msg.clone()),
            ApiError::PayloadTooLarge(msg) => ("PAYLOAD_TOO_LARGE", msg.clone()),
            ApiError::NotFound(msg) => ("NOT_FOUND", msg.clone()),
            ApiError::Storage(StorageError::InvalidArgument(msg)) => ("BAD_REQUEST", msg.clone()),
            ApiError::Storage(err) => {
                tracing::error!(error = %err, "Storage failure");
                ("STORAGE_ERROR", "Storage failure".to_string())
            }
            ApiError::Internal(_) | ApiError::Io(_) => {
                tracing::error!(error = %self, "Unhandled error");
                ("INTERNAL_ERROR", "Internal server error".to_string())
            }
        };

        let body = Json(json!({
            "error": {
                "code": error_code,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
