//! Session service error types.
//!
//! All errors map to HTTP status codes via the `IntoResponse` impl.
//! Lifecycle failures (`InvalidSchedule`, `NotFound`, `AccessDenied`) are
//! reported as structured failures with stable codes; internal details are
//! logged server-side and never returned to clients.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Session service error type.
///
/// Maps to HTTP status codes:
/// - InvalidSchedule, BadRequest: 400 Bad Request
/// - AccessDenied: 403 Forbidden
/// - NotFound: 404 Not Found
/// - Internal: 500 Internal Server Error
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("Invalid schedule: {0}")]
    InvalidSchedule(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// Access Gate denial. Carries the gate's reason verbatim.
    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl SessionError {
    /// Returns the HTTP status code for this error (for metrics recording).
    pub fn status_code(&self) -> u16 {
        match self {
            SessionError::InvalidSchedule(_) | SessionError::BadRequest(_) => 400,
            SessionError::AccessDenied(_) => 403,
            SessionError::NotFound(_) => 404,
            SessionError::Internal(_) => 500,
        }
    }

    /// Bounded label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            SessionError::InvalidSchedule(_) => "invalid_schedule",
            SessionError::NotFound(_) => "not_found",
            SessionError::AccessDenied(_) => "access_denied",
            SessionError::BadRequest(_) => "bad_request",
            SessionError::Internal(_) => "internal",
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

impl IntoResponse for SessionError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            SessionError::InvalidSchedule(reason) => {
                (StatusCode::BAD_REQUEST, "INVALID_SCHEDULE", reason.clone())
            }
            SessionError::NotFound(resource) => {
                (StatusCode::NOT_FOUND, "NOT_FOUND", resource.clone())
            }
            SessionError::AccessDenied(reason) => {
                (StatusCode::FORBIDDEN, "ACCESS_DENIED", reason.clone())
            }
            SessionError::BadRequest(reason) => {
                (StatusCode::BAD_REQUEST, "BAD_REQUEST", reason.clone())
            }
            SessionError::Internal(reason) => {
                // Log actual error server-side, return generic message to client
                tracing::error!(target: "session.errors", reason = %reason, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal error occurred".to_string(),
                )
            }
        };

        let error_response = ErrorResponse {
            error: ErrorDetail {
                code: code.to_string(),
                message,
            },
        };

        (status, Json(error_response)).into_response()
    }
}
