//! Error types for the edge cache
//!
//! Provides unified error handling using thiserror. Cache misses are not
//! errors: lookups return `Option` and only the HTTP layer turns a miss into
//! `NotFound`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;

// == Cache Error Enum ==
/// Unified error type for the edge cache.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Rejected configuration, raised at construction time
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The storage backend rejected a read or write
    #[error("Backend error: {0}")]
    Backend(String),

    /// A value generator failed
    #[error("Generator failed for key '{key}': {message}")]
    Generator { key: String, message: String },

    /// A value could not be encoded or decoded for the backend
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid request data (HTTP layer)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Key or region not found (HTTP layer)
    #[error("Not found: {0}")]
    NotFound(String),
}

impl CacheError {
    /// Shorthand for configuration errors.
    pub fn config(message: impl Into<String>) -> Self {
        CacheError::InvalidConfig(message.into())
    }

    /// Shorthand for generator failures.
    pub fn generator(key: impl Into<String>, message: impl ToString) -> Self {
        CacheError::Generator {
            key: key.into(),
            message: message.to_string(),
        }
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let status = match &self {
            CacheError::NotFound(_) => StatusCode::NOT_FOUND,
            CacheError::InvalidRequest(_) | CacheError::InvalidConfig(_) => {
                StatusCode::BAD_REQUEST
            }
            CacheError::Backend(_) => StatusCode::BAD_GATEWAY,
            CacheError::Generator { .. } | CacheError::Serialization(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = Json(ErrorResponse::new(self.to_string()));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the edge cache.
pub type Result<T> = std::result::Result<T, CacheError>;
