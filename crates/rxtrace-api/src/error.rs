//! # API Error Types
//!
//! Structured error type implementing `axum::response::IntoResponse`.
//! Domain rejections carry their [`ErrorKind`] through to the response code;
//! storage failures and internal errors never expose their message.
//!
//! | Kind | Status |
//! |------|--------|
//! | `NOT_FOUND` | 404 |
//! | `UNAUTHORIZED` | 403 |
//! | `INVALID_TRANSITION` | 409 |
//! | `CONCURRENT_MODIFICATION` | 409 |
//! | `STORAGE_FAILURE` | 500 |
//! | `ALREADY_EXISTS` | 409 |
//! | `VALIDATION_ERROR` | 422 |

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use rxtrace_core::{ErrorKind, ValidationError};
use rxtrace_directory::DirectoryError;
use rxtrace_ledger::ApplyError;
use rxtrace_summary::SummaryError;

/// Message returned in place of storage and internal failure details.
pub const HIDDEN_MESSAGE: &str = "An internal error occurred";

/// Structured JSON error response body.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

/// Inner error detail.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "NOT_FOUND", "INVALID_TRANSITION").
    pub code: String,
    /// Human-readable error message.
    pub message: String,
}

/// Application-level error type that implements [`IntoResponse`] for Axum.
#[derive(Error, Debug)]
pub enum AppError {
    /// A domain rejection, rendered under its kind.
    #[error("{message}")]
    Rejected {
        /// Rejection kind.
        kind: ErrorKind,
        /// Human-readable reason.
        message: String,
    },

    /// Request body could not be parsed (400).
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Missing or invalid bearer token (401).
    #[error("unauthenticated: {0}")]
    Unauthenticated(String),

    /// Summary requested for a batch without alerts (409).
    #[error("{0}")]
    NoAlerts(String),

    /// The summarization collaborator is not configured (503).
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),

    /// The summarization collaborator failed (502).
    #[error("upstream error: {0}")]
    Upstream(String),

    /// Internal server error (500). Message is logged but not returned to client.
    #[error("internal error: {0}")]
    Internal(String),
}

/// HTTP status for a rejection kind.
pub fn kind_status(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Unauthorized => StatusCode::FORBIDDEN,
        ErrorKind::InvalidTransition
        | ErrorKind::ConcurrentModification
        | ErrorKind::AlreadyExists => StatusCode::CONFLICT,
        ErrorKind::StorageFailure => StatusCode::INTERNAL_SERVER_ERROR,
        ErrorKind::Validation => StatusCode::UNPROCESSABLE_ENTITY,
    }
}

impl AppError {
    /// A rejection of the given kind.
    pub fn rejected(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self::Rejected {
            kind,
            message: message.into(),
        }
    }

    /// `NOT_FOUND` rejection.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::rejected(ErrorKind::NotFound, message)
    }

    /// `VALIDATION_ERROR` rejection.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::rejected(ErrorKind::Validation, message)
    }

    /// Return the HTTP status code and machine-readable error code for this error.
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::Rejected { kind, .. } => (kind_status(*kind), kind.as_str()),
            Self::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            Self::Unauthenticated(_) => (StatusCode::UNAUTHORIZED, "UNAUTHENTICATED"),
            Self::NoAlerts(_) => (StatusCode::CONFLICT, "NO_ALERTS"),
            Self::ServiceUnavailable(_) => (StatusCode::SERVICE_UNAVAILABLE, "SERVICE_UNAVAILABLE"),
            Self::Upstream(_) => (StatusCode::BAD_GATEWAY, "UPSTREAM_ERROR"),
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }

    /// Whether the message must be withheld from the client.
    pub fn is_hidden(&self) -> bool {
        matches!(
            self,
            Self::Internal(_)
                | Self::Rejected {
                    kind: ErrorKind::StorageFailure,
                    ..
                }
        )
    }

    /// Message safe to return to the client.
    pub fn public_message(&self) -> String {
        if self.is_hidden() {
            HIDDEN_MESSAGE.to_string()
        } else {
            self.to_string()
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        if self.is_hidden() {
            tracing::error!(error = %self, code, "request failed with a hidden error");
        }

        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message: self.public_message(),
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<ApplyError> for AppError {
    fn from(err: ApplyError) -> Self {
        Self::rejected(err.kind(), err.to_string())
    }
}

impl From<DirectoryError> for AppError {
    fn from(err: DirectoryError) -> Self {
        Self::rejected(err.kind(), err.to_string())
    }
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        Self::validation(err.to_string())
    }
}

impl From<SummaryError> for AppError {
    fn from(err: SummaryError) -> Self {
        match err {
            SummaryError::NoAlerts => Self::NoAlerts("no alerts to summarize".into()),
            SummaryError::Config(e) => Self::ServiceUnavailable(e.to_string()),
            other => {
                tracing::warn!(error = %other, "summarization collaborator failed");
                Self::Upstream(other.to_string())
            }
        }
    }
}
