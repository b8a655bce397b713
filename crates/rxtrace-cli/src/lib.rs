//! # rxtrace-cli — Command-Line Interface
//!
//! Operates on a snapshot file (JSON, or YAML by extension) instead of the
//! HTTP service. Every mutation runs through the same transition applier
//! the service uses, then rewrites the snapshot atomically.
//!
//! ## Subcommands
//!
//! - `validate` — load-time invariant checks over a snapshot
//! - `shipment` — list, show, history, create, transition, forward
//! - `batch` — list, register, advance, ship
//! - `alerts` — list and severity counts
//! - `actors` — directory listing and eligible receivers
//!
//! ## Exit Codes
//!
//! | Code | Meaning |
//! |------|---------|
//! | 0 | success |
//! | 1 | unreadable input, or `STORAGE_FAILURE` on save |
//! | 2 | the operation was refused (`NOT_FOUND`, `UNAUTHORIZED`, ...) |

pub mod actors;
pub mod alerts;
pub mod batch;
pub mod shipment;
pub mod validate;
pub mod world;

/// Exit code for a refused operation.
pub const EXIT_REJECTED: u8 = 2;

/// Exit code for an unreadable input or a failed save.
pub const EXIT_FAILURE: u8 = 1;
