//! # Snapshot Files
//!
//! A whole-world document of actors, items and alerts. JSON or YAML is
//! chosen by file extension (`.yaml`/`.yml` for YAML, anything else JSON).
//!
//! Every item passes its load-time invariant checks during
//! deserialization, so a snapshot that parses is internally consistent.
//!
//! Saves are atomic: the document is written to a temporary file in the
//! target directory and renamed over the original.

use std::collections::HashSet;
use std::io::Write;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use rxtrace_alerts::{AlertCorrelator, AlertError};
use rxtrace_core::{Actor, Alert, ErrorKind};
use rxtrace_directory::{ActorDirectory, DirectoryError};
use rxtrace_state::TrackableItem;

/// Snapshot load and save failures.
#[derive(Error, Debug)]
pub enum SnapshotError {
    /// The file could not be read or parsed.
    #[error("document load error for '{path}': {reason}")]
    Load {
        /// File path.
        path: String,
        /// Description.
        reason: String,
    },

    /// The file could not be written.
    #[error("document write error for '{path}': {reason}")]
    Write {
        /// File path.
        path: String,
        /// Description.
        reason: String,
    },

    /// Two items share an id.
    #[error("duplicate item id {0:?}")]
    DuplicateItem(String),

    /// The actor list is inconsistent.
    #[error(transparent)]
    Directory(#[from] DirectoryError),

    /// The alert list is inconsistent.
    #[error(transparent)]
    Alerts(#[from] AlertError),
}

impl SnapshotError {
    /// The error kind this failure is reported under.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Load { .. } => ErrorKind::Validation,
            Self::Write { .. } => ErrorKind::StorageFailure,
            Self::DuplicateItem(_) => ErrorKind::AlreadyExists,
            Self::Directory(e) => e.kind(),
            Self::Alerts(e) => e.kind(),
        }
    }
}

/// Serialized world state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub actors: Vec<Actor>,
    #[serde(default)]
    pub items: Vec<TrackableItem>,
    #[serde(default)]
    pub alerts: Vec<Alert>,
}

fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml" | "yml")
    )
}

impl Snapshot {
    /// Read and parse a snapshot file.
    pub fn load(path: &Path) -> Result<Self, SnapshotError> {
        let load_err = |reason: String| SnapshotError::Load {
            path: path.display().to_string(),
            reason,
        };
        let content = std::fs::read_to_string(path)
            .map_err(|e| load_err(format!("cannot read file: {e}")))?;
        if is_yaml(path) {
            serde_yaml::from_str(&content).map_err(|e| load_err(format!("invalid YAML: {e}")))
        } else {
            serde_json::from_str(&content).map_err(|e| load_err(format!("invalid JSON: {e}")))
        }
    }

    /// Atomically write the snapshot to `path`.
    pub fn save(&self, path: &Path) -> Result<(), SnapshotError> {
        let write_err = |reason: String| SnapshotError::Write {
            path: path.display().to_string(),
            reason,
        };
        let body = if is_yaml(path) {
            serde_yaml::to_string(self).map_err(|e| write_err(format!("YAML encode: {e}")))?
        } else {
            let mut s = serde_json::to_string_pretty(self)
                .map_err(|e| write_err(format!("JSON encode: {e}")))?;
            s.push('\n');
            s
        };

        let dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let mut tmp = tempfile::NamedTempFile::new_in(dir)
            .map_err(|e| write_err(format!("cannot create temp file: {e}")))?;
        tmp.write_all(body.as_bytes())
            .and_then(|()| tmp.as_file().sync_all())
            .map_err(|e| write_err(format!("cannot write temp file: {e}")))?;
        tmp.persist(path)
            .map_err(|e| write_err(format!("cannot replace file: {}", e.error)))?;
        tracing::debug!(path = %path.display(), items = self.items.len(), "snapshot saved");
        Ok(())
    }

    /// Check cross-record consistency and build the read models.
    pub fn into_parts(
        self,
    ) -> Result<(ActorDirectory, Vec<TrackableItem>, AlertCorrelator), SnapshotError> {
        let mut seen = HashSet::with_capacity(self.items.len());
        for item in &self.items {
            if !seen.insert(item.id().clone()) {
                return Err(SnapshotError::DuplicateItem(item.id().to_string()));
            }
        }
        let directory = ActorDirectory::new(self.actors)?;
        let alerts = AlertCorrelator::new(self.alerts)?;
        Ok((directory, self.items, alerts))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rxtrace_core::{ActorId, Role, Timestamp};
    use rxtrace_state::{ItemKind, NewShipment};

    fn sample() -> Snapshot {
        let alice = Actor::new(
            ActorId::new("a-alice").unwrap(),
            "Alice Manufacturer",
            Role::Manufacturer,
            "Basel",
        )
        .unwrap();
        let item = TrackableItem::open_shipment(
            NewShipment {
                id: "B-1".parse().unwrap(),
                kind: ItemKind::PhysicalShipment,
                product_name: "Amoxicillin 500mg".into(),
                holder: &alice,
                origin: None,
                destination: "Frankfurt".into(),
                parent: None,
                lot: None,
            },
            Timestamp::parse("2026-03-01T08:00:00Z").unwrap(),
        )
        .unwrap();
        Snapshot {
            actors: vec![alice],
            items: vec![item],
            alerts: vec![],
        }
    }

    #[test]
    fn json_and_yaml_files_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["world.json", "world.yaml"] {
            let path = dir.path().join(name);
            sample().save(&path).unwrap();
            assert_eq!(Snapshot::load(&path).unwrap(), sample());
        }
        let yaml = std::fs::read_to_string(dir.path().join("world.yaml")).unwrap();
        assert!(yaml.contains("currentHolderName: Alice Manufacturer"));
    }

    #[test]
    fn save_replaces_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("world.json");
        std::fs::write(&path, "{}").unwrap();
        sample().save(&path).unwrap();
        assert_eq!(Snapshot::load(&path).unwrap().items.len(), 1);
        let leftovers = std::fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(leftovers, 1);
    }

    #[test]
    fn missing_sections_default_to_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.json");
        std::fs::write(&path, "{}").unwrap();
        assert_eq!(Snapshot::load(&path).unwrap(), Snapshot::default());
    }

    #[test]
    fn inconsistent_item_is_rejected_on_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        let mut json = serde_json::to_value(sample()).unwrap();
        json["items"][0]["custody"]["currentHolderName"] = "Somebody Else".into();
        std::fs::write(&path, json.to_string()).unwrap();
        let err = Snapshot::load(&path).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn duplicate_items_are_rejected() {
        let mut snap = sample();
        snap.items.push(snap.items[0].clone());
        let err = snap.into_parts().unwrap_err();
        assert!(matches!(err, SnapshotError::DuplicateItem(ref id) if id == "B-1"));
    }

    #[test]
    fn unreadable_file_is_a_load_error() {
        let err = Snapshot::load(Path::new("/nonexistent/world.json")).unwrap_err();
        assert!(matches!(err, SnapshotError::Load { .. }));
    }
}
