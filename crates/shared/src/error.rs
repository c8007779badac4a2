//! Error types for order and subscription storage

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => StoreError::NotFound("row".to_string()),
            other => StoreError::Database(other.to_string()),
        }
    }
}

/// Result alias for store operations
pub type StoreResult<T> = Result<T, StoreError>;
