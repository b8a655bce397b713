//! # rxtrace-state — Custody & Status State Machine
//!
//! The rules that govern how a trackable item moves through the custody
//! chain.
//!
//! ## Modules
//!
//! - **Status** (`status.rs`): the two status modes (physical shipment and
//!   regulatory submission) sharing one field, and the batch statuses.
//!
//! - **History** (`history.rs`): the non-empty, append-only,
//!   timestamp-monotone custody ledger.
//!
//! - **Item** (`item.rs`): `TrackableItem`, one record per id across the
//!   pre-custody (batch) and in-custody (shipment) phases, with load-time
//!   invariant checks.
//!
//! - **Custody** (`custody.rs`): the pure `decide` function, the edge
//!   tables, actor positions and next-holder resolution.
//!
//! - **Batch** (`batch.rs`): register, advance and ship a production batch.
//!
//! ## Design
//!
//! Nothing in this crate performs I/O or reads ambient state. The acting
//! actor, the directory snapshot and the clock are explicit parameters, so
//! every (status, position, target) combination can be unit tested.

pub mod batch;
pub mod custody;
pub mod history;
pub mod item;
pub mod status;

pub use batch::{advance_batch, register_batch, ship_batch, BatchError};
pub use custody::{
    advance_holder, available_transitions, decide, edges, find_edge, valid_transitions,
    ActorPosition, CustodyError, Edge, HolderRule, TransitionDecision,
};
pub use history::{CustodyLedger, HistoryEntry, LedgerError};
pub use item::{Custody, ItemError, LotDetails, NewShipment, Phase, ProductionBatch, TrackableItem};
pub use status::{BatchStatus, CustodyStatus, ItemKind};
