//! Snapshot-backed world shared by every subcommand.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};

use rxtrace_alerts::AlertCorrelator;
use rxtrace_ledger::{ApplyError, Snapshot, SnapshotError, TransitionApplier, VolatileJournal};
use rxtrace_state::TrackableItem;

use crate::{EXIT_FAILURE, EXIT_REJECTED};

/// The applier the CLI runs. Durability comes from rewriting the snapshot.
pub type Applier = TransitionApplier<VolatileJournal>;

/// A loaded snapshot.
#[derive(Debug)]
pub struct World {
    path: PathBuf,
    pub applier: Applier,
    pub alerts: AlertCorrelator,
}

impl World {
    /// Load and check the snapshot at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let snapshot =
            Snapshot::load(path).with_context(|| format!("loading {}", path.display()))?;
        Self::from_snapshot(path, snapshot)
    }

    /// Assemble a world from an in-memory snapshot that saves to `path`.
    pub fn from_snapshot(path: &Path, snapshot: Snapshot) -> Result<Self> {
        let (directory, items, alerts) = snapshot
            .into_parts()
            .context("snapshot is inconsistent")?;
        let applier = TransitionApplier::new(Arc::new(directory), items, VolatileJournal)
            .context("snapshot is inconsistent")?;
        Ok(Self {
            path: path.to_path_buf(),
            applier,
            alerts,
        })
    }

    /// The current world as a snapshot document.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            actors: self.applier.directory().all().to_vec(),
            items: self.applier.list(),
            alerts: self.alerts.all().to_vec(),
        }
    }

    /// Rewrite the snapshot file.
    pub fn save(&self) -> Result<(), SnapshotError> {
        self.snapshot().save(&self.path)
    }

    /// Report an applier outcome, saving on success. Returns the exit code.
    pub fn commit(&self, result: Result<TrackableItem, ApplyError>) -> u8 {
        match result {
            Ok(item) => match self.save() {
                Ok(()) => {
                    println!("{}", describe(&item));
                    0
                }
                Err(e) => {
                    tracing::error!(error = %e, "snapshot write failed");
                    eprintln!("STORAGE_FAILURE: {e}");
                    EXIT_FAILURE
                }
            },
            Err(e) => {
                eprintln!("{}: {e}", e.kind().as_str());
                EXIT_REJECTED
            }
        }
    }
}

/// One-line summary of an item.
pub fn describe(item: &TrackableItem) -> String {
    match item.custody() {
        Some(c) => format!(
            "{} {} holder=\"{}\" destination=\"{}\" v{}",
            item.id(),
            c.status(),
            c.current_holder(),
            c.destination(),
            item.version()
        ),
        None => format!(
            "{} {} product=\"{}\" v{}",
            item.id(),
            item.batch_status(),
            item.product_name(),
            item.version()
        ),
    }
}

/// Run a future to completion on a single-threaded runtime.
pub fn block_on<F: Future>(fut: F) -> Result<F::Output> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("starting async runtime")?;
    Ok(runtime.block_on(fut))
}

#[cfg(test)]
pub(crate) mod fixtures {
    use std::path::{Path, PathBuf};

    /// A small world: one manufacturer, one distributor, one pharmacy, one
    /// regulator, and two alerts on `SHP-1`.
    pub const WORLD: &str = r#"{
  "actors": [
    {"id": "a-alice", "name": "Alice Manufacturer", "role": "manufacturer", "location": "Basel"},
    {"id": "a-dan", "name": "Dan Distributor", "role": "distributor", "location": "Frankfurt"},
    {"id": "a-phil", "name": "Phil Pharmacy", "role": "pharmacy", "location": "Berlin"},
    {"id": "a-rita", "name": "Rita Regulator", "role": "regulator", "location": "Silver Spring"}
  ],
  "alerts": [
    {"alertId": "A-1", "batchId": "SHP-1", "timestamp": "2026-03-01T08:00:00Z",
     "type": "Temperature Excursion", "severity": "High", "details": "9.1C for 50 minutes"},
    {"alertId": "A-2", "batchId": "SHP-9", "timestamp": "2026-03-01T09:00:00Z",
     "type": "Shock", "severity": "Low", "details": "2.1g"}
  ]
}"#;

    /// Write the fixture world into `dir` and return its path.
    pub fn write_world(dir: &Path) -> PathBuf {
        let path = dir.join("world.json");
        std::fs::write(&path, WORLD).unwrap();
        path
    }
}
