//! # rxtrace-ledger — Entity Store and Transition Applier
//!
//! The write side of rxtrace.
//!
//! - **Store** (`store.rs`): thread-safe keyed records, shared by clone.
//! - **Journal** (`journal.rs`): the durable write seam, a version
//!   compare-and-set. [`VolatileJournal`] keeps nothing; the API crate
//!   provides a Postgres implementation.
//! - **Locks** (`locks.rs`): one async mutex per item id.
//! - **Snapshot** (`snapshot.rs`): JSON/YAML world files with atomic save.
//! - **Applier** (`applier.rs`): [`TransitionApplier`], the single writer.

pub mod applier;
pub mod journal;
pub mod locks;
pub mod snapshot;
pub mod store;

pub use applier::{
    ApplyError, Clock, CreateShipment, ForwardShipment, RegisterBatch, ShipBatch,
    TransitionApplier,
};
pub use journal::{Journal, StorageError, VolatileJournal};
pub use locks::{KeyGuard, KeyedLocks};
pub use snapshot::{Snapshot, SnapshotError};
pub use store::Store;
