//! Error types for the SOW API.
//!
//! [`ApiError`] unifies all failure modes into a single enum that is
//! converted into an `{"error", "status"}` JSON response via its
//! [`IntoResponse`](axum::response::IntoResponse) implementation. Callers
//! only ever see validation errors (400), not found (404) or internal
//! errors (500).

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use scribe_core::InvalidEventError;
use scribe_db::StoreError;

/// Errors that can occur in the API layer.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The request event failed validation.
    #[error("invalid event: {0}")]
    InvalidEvent(#[from] InvalidEventError),

    /// The request body is not valid JSON.
    #[error("invalid JSON body: {0}")]
    InvalidBody(#[from] JsonRejection),

    /// The query string could not be deserialized.
    #[error("invalid query string: {0}")]
    InvalidQueryString(#[from] QueryRejection),

    /// A path segment could not be extracted.
    #[error("invalid path: {0}")]
    InvalidPath(#[from] PathRejection),

    /// An invalid path or query parameter was provided.
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// The requested resource was not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// The record store failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Self::InvalidEvent(e) => (StatusCode::BAD_REQUEST, e.to_string()),
            Self::InvalidBody(e) => (StatusCode::BAD_REQUEST, e.body_text()),
            Self::InvalidQueryString(e) => (StatusCode::BAD_REQUEST, e.body_text()),
            Self::InvalidPath(e) => (StatusCode::BAD_REQUEST, e.body_text()),
            Self::InvalidQuery(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            Self::Store(StoreError::InvalidPage(msg)) => (StatusCode::BAD_REQUEST, msg.clone()),
            Self::Store(e) => {
                tracing::error!(error = %e, "store failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    String::from("internal storage error"),
                )
            }
        };

        let body = serde_json::json!({
            "error": message,
            "status": status.as_u16(),
        });

        (status, axum::Json(body)).into_response()
    }
}
