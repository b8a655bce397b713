//! # Error Types
//!
//! The shared error-kind taxonomy plus the validation errors raised by the
//! constructors in this crate.
//!
//! Every domain error in the workspace exposes `kind() -> ErrorKind`, so a
//! caller can render any rejection as `{kind, message}` without matching on
//! crate-specific variants.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Classification of a rejected operation.
///
/// The first five kinds cover the transition path. `AlreadyExists` and
/// `Validation` are raised only by record-creating operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    /// Unknown batch id or actor.
    NotFound,
    /// The actor/state/role combination is not permitted.
    Unauthorized,
    /// The target status is unreachable from the current status in this mode.
    InvalidTransition,
    /// The record changed between read and write. Safe to retry once.
    ConcurrentModification,
    /// The durable write failed. The transition did not occur.
    StorageFailure,
    /// A record with the requested id already exists.
    AlreadyExists,
    /// The request is malformed.
    Validation,
}

impl ErrorKind {
    /// Machine-readable code, as carried in API and CLI output.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotFound => "NOT_FOUND",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::InvalidTransition => "INVALID_TRANSITION",
            Self::ConcurrentModification => "CONCURRENT_MODIFICATION",
            Self::StorageFailure => "STORAGE_FAILURE",
            Self::AlreadyExists => "ALREADY_EXISTS",
            Self::Validation => "VALIDATION_ERROR",
        }
    }

    /// Whether an immediate retry may succeed.
    ///
    /// Only contention is retryable; the core guarantees no partial write
    /// happened, so replaying the request is safe.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ConcurrentModification)
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validation failures from constructors in this crate.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Identifier is empty after trimming.
    #[error("{kind} must not be empty")]
    EmptyIdentifier {
        /// Identifier namespace ("batch id", "actor id", ...).
        kind: &'static str,
    },

    /// Identifier exceeds the maximum length.
    #[error("{kind} must not exceed {max} characters, got {len}")]
    IdentifierTooLong {
        /// Identifier namespace.
        kind: &'static str,
        /// Maximum permitted length.
        max: usize,
        /// Actual length.
        len: usize,
    },

    /// Identifier contains whitespace or control characters.
    #[error("{kind} {value:?} contains whitespace or control characters")]
    IdentifierCharset {
        /// Identifier namespace.
        kind: &'static str,
        /// The rejected value.
        value: String,
    },

    /// Unknown role name.
    #[error("unknown role {0:?}")]
    UnknownRole(String),

    /// Unknown custody or batch status name.
    #[error("unknown status {0:?}")]
    UnknownStatus(String),

    /// Unknown item kind.
    #[error("unknown item kind {0:?}, expected physical_shipment or regulatory_submission")]
    UnknownKind(String),

    /// Unknown severity name.
    #[error("unknown severity {0:?}")]
    UnknownSeverity(String),

    /// Timestamp could not be parsed or is not UTC.
    #[error("invalid timestamp: {0}")]
    Timestamp(String),

    /// Latitude/longitude out of range.
    #[error("geo-coordinate out of range: lat={lat}, lon={lon}")]
    GeoOutOfRange {
        /// Latitude in degrees.
        lat: f64,
        /// Longitude in degrees.
        lon: f64,
    },

    /// A required text field is blank.
    #[error("{0} must not be blank")]
    BlankField(&'static str),
}

impl ValidationError {
    /// Validation failures are always reported as [`ErrorKind::Validation`].
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::Validation
    }
}

/// Top-level error for this crate.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Input validation failed.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl CoreError {
    /// The error kind this failure is reported under.
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::Validation
    }
}
