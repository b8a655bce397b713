//! # Durable Journal
//!
//! The write-through seam between the applier and durable storage. The
//! applier calls the journal first and replaces the in-memory record only
//! after the journal accepts the write, so a failed durable write leaves
//! no trace.
//!
//! `commit` is a compare-and-set on `version`: an implementation must
//! refuse the write when the stored version is not `previous_version`.

use std::future::Future;

use thiserror::Error;

use rxtrace_core::ErrorKind;
use rxtrace_state::TrackableItem;

/// Durable write failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// The stored version moved on since the record was read.
    #[error("item {id} was modified concurrently (expected version {expected})")]
    VersionConflict {
        /// Item id.
        id: String,
        /// Version the writer read.
        expected: u64,
    },

    /// `create` found an existing record.
    #[error("item {id} already exists in storage")]
    AlreadyExists {
        /// Item id.
        id: String,
    },

    /// The backend failed.
    #[error("storage backend failure: {0}")]
    Backend(String),
}

impl StorageError {
    /// The error kind this failure is reported under.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::VersionConflict { .. } => ErrorKind::ConcurrentModification,
            Self::AlreadyExists { .. } => ErrorKind::AlreadyExists,
            Self::Backend(_) => ErrorKind::StorageFailure,
        }
    }
}

/// Durable storage for item records.
pub trait Journal: Send + Sync + 'static {
    /// Persist a brand-new record.
    fn create(
        &self,
        item: &TrackableItem,
    ) -> impl Future<Output = Result<(), StorageError>> + Send;

    /// Replace a record whose stored version is `previous_version`.
    fn commit(
        &self,
        previous_version: u64,
        item: &TrackableItem,
    ) -> impl Future<Output = Result<(), StorageError>> + Send;
}

/// A journal that keeps nothing beyond the in-memory store.
///
/// Used by the CLI, which rewrites its snapshot file after each command,
/// and by the API when no database is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct VolatileJournal;

impl Journal for VolatileJournal {
    async fn create(&self, _item: &TrackableItem) -> Result<(), StorageError> {
        Ok(())
    }

    async fn commit(&self, _previous_version: u64, _item: &TrackableItem) -> Result<(), StorageError> {
        Ok(())
    }
}
