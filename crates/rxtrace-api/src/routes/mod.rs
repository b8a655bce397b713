//! # Route Modules
//!
//! Each module defines an Axum Router for one API surface area.
//! Routers are assembled in `lib.rs` into the application.

pub mod actors;
pub mod alerts;
pub mod batches;
pub mod shipments;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use rxtrace_core::BatchId;
use rxtrace_state::TrackableItem;

use crate::error::AppError;
use crate::extractors::batch_id;
use crate::state::AppState;

/// A full item record as returned by the API.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
#[schema(value_type = Object)]
pub struct ItemBody(pub TrackableItem);

/// Look up an item by its path id.
pub(crate) fn find_item(state: &AppState, raw: &str) -> Result<TrackableItem, AppError> {
    let id = batch_id(raw)?;
    state
        .applier
        .get(&id)
        .ok_or_else(|| AppError::not_found(format!("item {id} not found")))
}

/// A fresh id with the given prefix, e.g. `SHP-3F2A9C41D0B7`.
pub(crate) fn generate_id(prefix: &str) -> Result<BatchId, AppError> {
    let suffix = Uuid::new_v4().simple().to_string()[..12].to_ascii_uppercase();
    Ok(BatchId::new(format!("{prefix}-{suffix}"))?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_are_prefixed_and_distinct() {
        let a = generate_id("SHP").unwrap();
        let b = generate_id("SHP").unwrap();
        assert!(a.as_str().starts_with("SHP-"));
        assert_eq!(a.as_str().len(), 16);
        assert_ne!(a, b);
    }

    #[test]
    fn unknown_item_is_not_found() {
        let state = AppState::new();
        let err = find_item(&state, "B-404").unwrap_err();
        assert_eq!(err.status_and_code().1, "NOT_FOUND");
    }
}
