//! Error types for the admission gate and entity cache
//!
//! `ApiError` is the HTTP-facing error (rendered as a JSON body), `StoreError`
//! covers faults in the durable backing store. Neither admission rejection nor
//! a cache miss is an error.

use axum::{
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::admission::AdmissionResult;

// == API Error Enum ==
/// Unified error type for the HTTP surface.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Entity not present in the cache
    #[error("Recipe not found: {0}")]
    NotFound(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Caller exhausted its quota for the current window
    #[error("Too many requests")]
    TooManyRequests(AdmissionResult),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

// == IntoResponse Implementation ==
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, self.to_string()),
            ApiError::InvalidRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::TooManyRequests(_) => (StatusCode::TOO_MANY_REQUESTS, self.to_string()),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
        };

        let body = Json(json!({
            "error": message
        }));

        let mut response = (status, body).into_response();
        if let ApiError::TooManyRequests(result) = &self {
            insert_quota_headers(response.headers_mut(), result);
        }
        response
    }
}

// == Quota Headers ==
/// Writes the `X-RateLimit-*` headers describing `result` into `headers`.
pub fn insert_quota_headers(headers: &mut HeaderMap, result: &AdmissionResult) {
    headers.insert("x-ratelimit-limit", HeaderValue::from(result.limit));
    headers.insert("x-ratelimit-remaining", HeaderValue::from(result.remaining));
    headers.insert(
        "x-ratelimit-reset",
        HeaderValue::from(result.reset_at_unix_ms()),
    );
}

/// Convenience Result type for HTTP handlers.
pub type Result<T> = std::result::Result<T, ApiError>;

// == Store Error Enum ==
/// Faults raised by a durable backing store.
///
/// These never escape the cache: it logs them and degrades to a miss.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Filesystem failure while opening, reading or writing
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Stored document could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// The operation did not finish within the configured timeout
    #[error("Durable store timed out after {0} ms")]
    Timeout(u128),
}
