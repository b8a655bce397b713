//! # rxtrace-core — Foundational Types
//!
//! The leaf of the rxtrace crate graph. Defines the primitives every other
//! crate shares: identifier newtypes, the UTC-only [`Timestamp`], the fixed
//! custodial [`Role`] order, the [`Actor`] and [`Alert`] reference records,
//! and the [`ErrorKind`] taxonomy that every rejection is reported under.
//!
//! ## Key Design Principles
//!
//! 1. **Newtype identifiers.** `BatchId`, `ActorId` and `AlertId` are distinct
//!    types with validated constructors. A batch id cannot be passed where an
//!    actor id is expected.
//!
//! 2. **One custody order.** [`role::CUSTODY_CHAIN`] is the single ordered list
//!    of custodial roles. Successor lookup is an index step into it; nothing
//!    else in the workspace encodes the order.
//!
//! 3. **UTC-only timestamps** truncated to whole seconds, so history entries
//!    written in the same action compare equal.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `rxtrace-*` crates.
//! - No `unsafe` code, no `.unwrap()` outside tests.

pub mod actor;
pub mod alert;
pub mod error;
pub mod identity;
pub mod role;
pub mod temporal;

pub use actor::{same_name, same_place, Actor, GeoPoint};
pub use alert::{Alert, Severity};
pub use error::{CoreError, ErrorKind, ValidationError};
pub use identity::{ActorId, AlertId, BatchId};
pub use role::{Role, CUSTODY_CHAIN};
pub use temporal::Timestamp;
