//! # Startup Bootstrap
//!
//! Assembles [`AppState`] from the configured sources:
//!
//! 1. Load the seed snapshot from `RXTRACE_SEED`, if set.
//! 2. With a database, hydrate from its tables. Empty tables are seeded
//!    from the snapshot first; non-empty tables win over the seed file.
//! 3. Without a database, serve the seed snapshot from memory.

use sqlx::PgPool;
use thiserror::Error;

use rxtrace_ledger::{Snapshot, SnapshotError};
use rxtrace_summary::SummaryClient;

use crate::db::{self, ItemJournal};
use crate::state::{AppConfig, AppState, StateError};

/// Bootstrap failures.
#[derive(Error, Debug)]
pub enum BootstrapError {
    /// The seed file could not be read.
    #[error("seed snapshot: {0}")]
    Seed(#[from] SnapshotError),
    /// Database hydration or seeding failed.
    #[error("database: {0}")]
    Database(#[from] sqlx::Error),
    /// The loaded world is inconsistent.
    #[error("state: {0}")]
    State(#[from] StateError),
}

fn is_empty(snapshot: &Snapshot) -> bool {
    snapshot.actors.is_empty() && snapshot.items.is_empty() && snapshot.alerts.is_empty()
}

/// Build application state from configuration, an optional pool and an
/// optional summary client.
pub async fn bootstrap(
    config: AppConfig,
    pool: Option<PgPool>,
    summary: Option<SummaryClient>,
) -> Result<AppState, BootstrapError> {
    let seed = match &config.seed_path {
        Some(path) => {
            let snapshot = Snapshot::load(path)?;
            tracing::info!(
                path = %path.display(),
                actors = snapshot.actors.len(),
                items = snapshot.items.len(),
                alerts = snapshot.alerts.len(),
                "seed snapshot loaded"
            );
            Some(snapshot)
        }
        None => None,
    };

    let (snapshot, journal) = match pool {
        Some(pool) => {
            let stored = db::load_snapshot(&pool).await?;
            let snapshot = match seed {
                Some(seed) if is_empty(&stored) => {
                    db::seed(&pool, &seed).await?;
                    seed
                }
                Some(_) => {
                    tracing::warn!("database already populated, ignoring seed snapshot");
                    stored
                }
                None => stored,
            };
            (snapshot, ItemJournal::Postgres(pool))
        }
        None => (seed.unwrap_or_default(), ItemJournal::Volatile),
    };

    let state = AppState::from_snapshot(config, snapshot, journal, summary)?;
    tracing::info!(
        actors = state.applier.directory().len(),
        items = state.applier.list().len(),
        alerts = state.alerts.len(),
        "application state ready"
    );
    Ok(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEED: &str = r#"
actors:
  - id: a-alice
    name: Alice Manufacturer
    role: manufacturer
    location: Basel
  - id: a-dan
    name: Dan Distributor
    role: distributor
    location: Frankfurt
alerts:
  - alertId: A-1
    batchId: B-1
    timestamp: "2026-03-01T08:00:00Z"
    type: Temperature Excursion
    severity: High
    details: 9.1C for 50 minutes
"#;

    #[tokio::test]
    async fn in_memory_bootstrap_from_yaml_seed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("seed.yaml");
        std::fs::write(&path, SEED).unwrap();
        let config = AppConfig {
            seed_path: Some(path),
            ..AppConfig::default()
        };
        let state = bootstrap(config, None, None).await.unwrap();
        assert_eq!(state.applier.directory().len(), 2);
        assert_eq!(state.alerts.len(), 1);
        assert!(matches!(state.applier.journal(), ItemJournal::Volatile));
    }

    #[tokio::test]
    async fn no_seed_means_empty_world() {
        let state = bootstrap(AppConfig::default(), None, None).await.unwrap();
        assert!(state.applier.directory().is_empty());
    }

    #[tokio::test]
    async fn missing_seed_file_fails() {
        let config = AppConfig {
            seed_path: Some("/nonexistent/seed.yaml".into()),
            ..AppConfig::default()
        };
        let err = bootstrap(config, None, None).await.unwrap_err();
        assert!(matches!(err, BootstrapError::Seed(_)));
    }
}
