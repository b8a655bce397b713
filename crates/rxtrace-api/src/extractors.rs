//! # Custom Extractors & Validation
//!
//! Provides the [`Validate`] trait for request DTOs, a helper to extract
//! and validate JSON bodies in handlers, and path identifier parsing.

use axum::extract::rejection::JsonRejection;
use axum::Json;

use rxtrace_core::{ActorId, BatchId};

use crate::error::AppError;

/// Trait for request types that can validate their business rules
/// beyond what serde deserialization checks.
pub trait Validate {
    /// Validate business rules. Returns an error message on failure.
    fn validate(&self) -> Result<(), String>;
}

/// Extract a JSON body, mapping deserialization errors to [`AppError::BadRequest`].
pub fn extract_json<T>(result: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    result
        .map(|Json(v)| v)
        .map_err(|err| AppError::BadRequest(err.body_text()))
}

/// Extract a JSON body and validate it using the [`Validate`] trait.
pub fn extract_validated_json<T: Validate>(
    result: Result<Json<T>, JsonRejection>,
) -> Result<T, AppError> {
    let value = extract_json(result)?;
    value.validate().map_err(AppError::validation)?;
    Ok(value)
}

/// Parse an item id taken from the request path.
pub fn batch_id(raw: &str) -> Result<BatchId, AppError> {
    Ok(BatchId::new(raw)?)
}

/// Parse an actor id from a path segment or body field.
pub fn actor_id(raw: &str) -> Result<ActorId, AppError> {
    Ok(ActorId::new(raw)?)
}

/// Require a non-blank text field.
pub fn require(field: &str, value: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err(format!("{field} must not be blank"));
    }
    Ok(())
}
