//! Error types for the storefront cache
//!
//! Provides unified error handling using thiserror.
//!
//! None of these errors cross the public store API: the store converts them
//! into miss/false/0 sentinels and logs them. They surface only through the
//! ops API (as HTTP responses) and the internal `Result` plumbing.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the storefront cache.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Backend unreachable, auth failure, or database-select failure
    #[error("Connection error: {0}")]
    Connection(String),

    /// Operation exceeded the configured timeout
    #[error("Operation timed out: {0}")]
    Timeout(String),

    /// Value could not be serialized or deserialized
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Backend rejected or failed a command
    #[error("Backend error: {0}")]
    Backend(String),

    /// Invalid request data (ops API)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Key not present (ops API; the store itself reports a plain miss)
    #[error("Key not found: {0}")]
    NotFound(String),
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            CacheError::Connection(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg.clone()),
            CacheError::Timeout(msg) => (StatusCode::GATEWAY_TIMEOUT, msg.clone()),
            CacheError::Serialization(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
            CacheError::Backend(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
            CacheError::InvalidRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            CacheError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the storefront cache.
pub type Result<T> = std::result::Result<T, CacheError>;
