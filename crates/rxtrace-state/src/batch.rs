//! # Production-Batch Lifecycle
//!
//! ```text
//! IN_PRODUCTION ──▶ READY_FOR_SHIPMENT ──▶ (custody phase, PENDING)
//! ```
//!
//! Only the registering manufacturer may advance or ship its batch. Shipping
//! replaces the item's phase in place: the id is kept, the lot facts move
//! into the custody record, and the batch status reads `SHIPPED` from then on.

use thiserror::Error;

use rxtrace_core::{Actor, BatchId, ErrorKind, Role, Timestamp};

use crate::item::{ItemError, LotDetails, Phase, ProductionBatch, TrackableItem};
use crate::status::BatchStatus;

/// Batch lifecycle refusals.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BatchError {
    /// Only manufacturers register batches; only the owner advances or ships.
    #[error("{actor} may not {action} batch {id}")]
    Unauthorized {
        /// Batch id.
        id: String,
        /// Acting actor name.
        actor: String,
        /// Attempted action.
        action: &'static str,
    },

    /// The batch is not in the status the action needs.
    #[error("batch {id} is {from}, cannot move to {to}")]
    InvalidTransition {
        /// Batch id.
        id: String,
        /// Current batch status.
        from: BatchStatus,
        /// Requested batch status.
        to: BatchStatus,
    },

    /// Invariant failure while building the record.
    #[error(transparent)]
    Item(#[from] ItemError),
}

impl BatchError {
    /// The error kind this refusal is reported under.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Unauthorized { .. } => ErrorKind::Unauthorized,
            Self::InvalidTransition { .. } => ErrorKind::InvalidTransition,
            Self::Item(e) => e.kind(),
        }
    }
}

/// Register a new batch in `IN_PRODUCTION`. Manufacturers only.
pub fn register_batch(
    id: BatchId,
    drug_name: &str,
    manufacturer: &Actor,
    lot: LotDetails,
    now: Timestamp,
) -> Result<TrackableItem, BatchError> {
    if manufacturer.role != Role::Manufacturer {
        return Err(BatchError::Unauthorized {
            id: id.to_string(),
            actor: manufacturer.name.clone(),
            action: "register",
        });
    }
    let batch = ProductionBatch {
        manufacturer: manufacturer.name.clone(),
        status: BatchStatus::InProduction,
        lot,
    };
    Ok(TrackableItem::new_batch(id, drug_name, batch, now)?)
}

/// `IN_PRODUCTION → READY_FOR_SHIPMENT`.
pub fn advance_batch(
    item: &TrackableItem,
    actor: &Actor,
    now: Timestamp,
) -> Result<TrackableItem, BatchError> {
    let batch = owned_batch(item, actor, "advance", BatchStatus::ReadyForShipment)?;
    if batch.status != BatchStatus::InProduction {
        return Err(BatchError::InvalidTransition {
            id: item.id().to_string(),
            from: batch.status,
            to: BatchStatus::ReadyForShipment,
        });
    }
    let next = ProductionBatch {
        status: BatchStatus::ReadyForShipment,
        ..batch.clone()
    };
    Ok(item.with_phase(Phase::PreCustody { batch: next }, now)?)
}

/// `READY_FOR_SHIPMENT →` custody phase at `PENDING`, held by the
/// manufacturer, origin at the manufacturer's location.
pub fn ship_batch(
    item: &TrackableItem,
    actor: &Actor,
    destination: &str,
    now: Timestamp,
) -> Result<TrackableItem, BatchError> {
    let batch = owned_batch(item, actor, "ship", BatchStatus::Shipped)?;
    if batch.status != BatchStatus::ReadyForShipment {
        return Err(BatchError::InvalidTransition {
            id: item.id().to_string(),
            from: batch.status,
            to: BatchStatus::Shipped,
        });
    }
    let custody = TrackableItem::custody_from_batch(actor, destination, batch.lot, now)?;
    Ok(item.with_phase(Phase::InCustody { custody }, now)?)
}

fn owned_batch<'a>(
    item: &'a TrackableItem,
    actor: &Actor,
    action: &'static str,
    to: BatchStatus,
) -> Result<&'a ProductionBatch, BatchError> {
    let batch = item.batch().ok_or(BatchError::InvalidTransition {
        id: item.id().to_string(),
        from: BatchStatus::Shipped,
        to,
    })?;
    if actor.role != Role::Manufacturer || actor.name.trim() != batch.manufacturer.trim() {
        return Err(BatchError::Unauthorized {
            id: item.id().to_string(),
            actor: actor.name.clone(),
            action,
        });
    }
    Ok(batch)
}
