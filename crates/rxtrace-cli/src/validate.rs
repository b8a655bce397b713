//! # Validate Subcommand
//!
//! Load a snapshot and run every load-time check: actor uniqueness, item
//! invariants (non-empty monotone ledger, cached status and holder matching
//! the last entry), unique item and alert ids. Alerts pointing at no known
//! item are reported but do not fail validation.

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::Args;

use rxtrace_ledger::Snapshot;

use crate::world::World;
use crate::EXIT_FAILURE;

/// Arguments for the validate subcommand.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Snapshot to check. Defaults to `--data`.
    pub path: Option<PathBuf>,
}

/// Execute the validate subcommand.
pub fn run_validate(args: &ValidateArgs, data: &Path) -> Result<u8> {
    let path = args.path.as_deref().unwrap_or(data);
    let snapshot = match Snapshot::load(path) {
        Ok(snapshot) => snapshot,
        Err(e) => {
            eprintln!("{}: {e}", e.kind().as_str());
            return Ok(EXIT_FAILURE);
        }
    };
    let world = match World::from_snapshot(path, snapshot) {
        Ok(world) => world,
        Err(e) => {
            eprintln!("invalid: {e:#}");
            return Ok(EXIT_FAILURE);
        }
    };

    let orphans = world.alerts.orphans(|id| world.applier.contains(id));
    for alert in &orphans {
        tracing::warn!(
            alert_id = %alert.alert_id,
            batch_id = %alert.batch_id,
            "alert references no known item"
        );
    }
    println!(
        "{}: OK ({} actors, {} shipments, {} batches, {} alerts, {} orphaned)",
        path.display(),
        world.applier.directory().len(),
        world.applier.shipments().len(),
        world.applier.batches().len(),
        world.alerts.len(),
        orphans.len()
    );
    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::fixtures::write_world;

    #[test]
    fn fixture_world_is_valid() {
        let dir = tempfile::tempdir().unwrap();
        let data = write_world(dir.path());
        let code = run_validate(&ValidateArgs { path: None }, &data).unwrap();
        assert_eq!(code, 0);
    }

    #[test]
    fn duplicate_actor_names_fail() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dup.yaml");
        std::fs::write(
            &path,
            "actors:\n  - {id: a-1, name: Ann, role: manufacturer, location: Basel}\n  - {id: a-2, name: Ann, role: pharmacy, location: Berlin}\n",
        )
        .unwrap();
        let code = run_validate(&ValidateArgs { path: Some(path) }, Path::new("unused")).unwrap();
        assert_eq!(code, EXIT_FAILURE);
    }

    #[test]
    fn tampered_ledger_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        let doc = serde_json::json!({
            "items": [{
                "id": "SHP-1",
                "kind": "physical_shipment",
                "productName": "X",
                "version": 1,
                "createdAt": "2026-03-01T08:00:00Z",
                "lastUpdateAt": "2026-03-01T08:00:00Z",
                "phase": "in_custody",
                "custody": {
                    "status": "DELIVERED",
                    "currentHolderName": "Dan",
                    "originLocation": "Basel",
                    "destinationLocation": "Frankfurt",
                    "history": [
                        {"status": "PENDING", "holder": "Ann", "timestamp": "2026-03-01T08:00:00Z"}
                    ]
                }
            }]
        });
        std::fs::write(&path, doc.to_string()).unwrap();
        let code = run_validate(&ValidateArgs { path: Some(path) }, Path::new("unused")).unwrap();
        assert_eq!(code, EXIT_FAILURE);
    }

    #[test]
    fn missing_file_fails() {
        let args = ValidateArgs {
            path: Some("/nonexistent/world.json".into()),
        };
        assert_eq!(run_validate(&args, Path::new("unused")).unwrap(), EXIT_FAILURE);
    }
}
