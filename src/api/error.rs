//! API error types with structured JSON responses.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::db::DatabaseError;

/// Structured error response body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: &'static str,
    pub message: String,
}

/// API-level errors with HTTP status mapping.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Invalid request: {0}")]
    BadRequest(String),
    #[error("Version conflict: {0}")]
    VersionConflict(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            ApiError::NotFound(detail) => (StatusCode::NOT_FOUND, "NOT_FOUND", detail),
            ApiError::BadRequest(detail) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", detail),
            ApiError::VersionConflict(detail) => (StatusCode::CONFLICT, "VERSION_CONFLICT", detail),
            ApiError::Conflict(detail) => (StatusCode::CONFLICT, "CONFLICT", detail),
            ApiError::Internal(detail) => {
                tracing::error!(detail, "API internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL",
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = ErrorBody {
            error: ErrorDetail { code, message },
        };
        (status, Json(body)).into_response()
    }
}

impl From<DatabaseError> for ApiError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::NotFound { .. } => ApiError::NotFound(err.to_string()),
            DatabaseError::InvalidEnum { .. }
            | DatabaseError::InvalidQuery(_)
            | DatabaseError::Validation { .. } => ApiError::BadRequest(err.to_string()),
            DatabaseError::VersionConflict { .. } => ApiError::VersionConflict(err.to_string()),
            DatabaseError::ConstraintViolation(_) => ApiError::Conflict(err.to_string()),
            DatabaseError::Sqlite(_)
            | DatabaseError::Json(_)
            | DatabaseError::MigrationFailed { .. }
            | DatabaseError::CorruptDocument { .. }
            | DatabaseError::LockPoisoned => ApiError::Internal(err.to_string()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}
