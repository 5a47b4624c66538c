//! Error types for the studio service
//!
//! Provides unified error handling using thiserror. The cache itself never
//! fails; these cover the record store and the HTTP surface.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// == Studio Error Enum ==
/// Unified error type for the studio service.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StudioError {
    /// Record or dataset not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Attempt to modify a built-in record
    #[error("Read-only: {0}")]
    ReadOnly(String),

    /// The record store rejected or failed the call
    #[error("Backend error: {0}")]
    Backend(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

// == IntoResponse Implementation ==
impl IntoResponse for StudioError {
    fn into_response(self) -> Response {
        let status = match &self {
            StudioError::NotFound(_) => StatusCode::NOT_FOUND,
            StudioError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            StudioError::ReadOnly(_) => StatusCode::FORBIDDEN,
            StudioError::Backend(_) => StatusCode::BAD_GATEWAY,
            StudioError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

impl From<serde_json::Error> for StudioError {
    fn from(err: serde_json::Error) -> Self {
        StudioError::Internal(format!("JSON encoding failed: {}", err))
    }
}

// == Result Type Alias ==
/// Convenience Result type for the studio service.
pub type Result<T> = std::result::Result<T, StudioError>;
