//! Structured errors for the proxy front end.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Errors raised before a request reaches the caching proxy.
#[derive(Debug, thiserror::Error)]
pub enum FrontError {
    /// The request target cannot be turned into an http(s) URL.
    #[error("INVALID_TARGET: {0}")]
    InvalidTarget(String),
}

impl IntoResponse for FrontError {
    fn into_response(self) -> Response {
        let status = match &self {
            FrontError::InvalidTarget(_) => StatusCode::BAD_REQUEST,
        };
        (status, self.to_string()).into_response()
    }
}
