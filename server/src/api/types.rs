//! Shared API types

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::seats::SnapshotError;

/// Error body returned by every failing endpoint
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Error category (e.g. `internal_error`)
    pub error: String,
    /// Stable machine-readable code
    pub code: String,
    pub message: String,
}

/// Standard API error response
#[derive(Debug)]
pub enum ApiError {
    NotFound { code: String, message: String },
    Internal { code: String, message: String },
}

impl ApiError {
    pub fn not_found(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::NotFound {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn internal(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Internal {
            code: code.into(),
            message: message.into(),
        }
    }
}

impl From<SnapshotError> for ApiError {
    fn from(e: SnapshotError) -> Self {
        // Details stay in the log; clients get a generic message
        tracing::error!(error = %e, "Snapshot failed");
        let message = match e {
            SnapshotError::Scrape(_) => "Failed to read seat count",
            SnapshotError::Store(_) => "Seat history is unavailable",
        };
        Self::internal("SNAPSHOT_FAILED", message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type, code, message) = match self {
            Self::NotFound { code, message } => (StatusCode::NOT_FOUND, "not_found", code, message),
            Self::Internal { code, message } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                code,
                message,
            ),
        };
        (
            status,
            Json(ErrorResponse {
                error: error_type.to_string(),
                code,
                message,
            }),
        )
            .into_response()
    }
}
