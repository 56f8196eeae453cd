//! API error type mapping core errors to HTTP responses.

use crate::errors::{CheckpointError, OverrideParseError, StoreError};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

/// An error surfaced by the control-surface handlers.
#[derive(Debug)]
pub enum ApiError {
    /// The requested checkpoint or session does not exist.
    NotFound(String),
    /// The request was malformed.
    BadRequest(String),
    /// An internal failure (store, engine).
    Internal(String),
}

impl From<CheckpointError> for ApiError {
    fn from(e: CheckpointError) -> Self {
        match e {
            CheckpointError::CheckpointNotFound { .. }
            | CheckpointError::SessionNotFound { .. } => Self::NotFound(e.to_string()),
            CheckpointError::Store(_) | CheckpointError::Codec(_) => {
                Self::Internal(e.to_string())
            }
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        Self::Internal(e.to_string())
    }
}

impl From<OverrideParseError> for ApiError {
    fn from(e: OverrideParseError) -> Self {
        Self::BadRequest(e.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            Self::NotFound(message) => (StatusCode::NOT_FOUND, "NOT_FOUND", message),
            Self::BadRequest(message) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", message),
            Self::Internal(message) => {
                tracing::error!(message, "internal error on control surface");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL",
                    "internal error".to_string(),
                )
            }
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
