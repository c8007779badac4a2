//! API error types and handling

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use orderpass_shared::StoreError;
use serde_json::json;

/// Application error type for the HTTP routes
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    // Validation errors
    #[error("Invalid request: {0}")]
    BadRequest(String),

    // Resource errors
    #[error("{0}")]
    NotFound(String),

    // Internal errors
    #[error("Database error: {0}")]
    Database(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg),
            ApiError::Database(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "DATABASE_ERROR",
                "Database error".to_string(),
            ),
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(what) => ApiError::NotFound(format!("Not found: {}", what)),
            StoreError::Validation(msg) => ApiError::BadRequest(msg),
            StoreError::Database(msg) => {
                tracing::error!(error = %msg, "Database error");
                ApiError::Database(msg)
            }
        }
    }
}

/// Result type alias for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
