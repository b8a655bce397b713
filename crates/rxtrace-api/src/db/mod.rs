//! # Database Persistence Layer
//!
//! Optional Postgres persistence via SQLx. When `DATABASE_URL` is set,
//! every committed item write goes through [`ItemJournal::Postgres`] before
//! the in-memory store changes, and the world is hydrated from the database
//! at boot. When absent, the API runs in-memory only.
//!
//! ## Tables
//!
//! - `trackable_items`: one JSON document per item, with its full history,
//!   plus the `version` column used for compare-and-set.
//! - `actors`, `alerts`: reference data, written only when seeding.

pub mod items;
pub mod reference;

use sqlx::postgres::{PgPool, PgPoolOptions};

use rxtrace_ledger::{Journal, Snapshot, StorageError};
use rxtrace_state::TrackableItem;

/// Initialize the database connection pool and run migrations.
///
/// Returns `None` if `url` is `None` (in-memory-only mode).
/// Returns `Err` if the URL is set but the connection or migration fails.
pub async fn init_pool(url: Option<&str>) -> Result<Option<PgPool>, sqlx::Error> {
    let Some(url) = url else {
        tracing::warn!(
            "DATABASE_URL not set: running in-memory only mode. \
             State will not survive restarts."
        );
        return Ok(None);
    };

    let pool = PgPoolOptions::new()
        .max_connections(20)
        .min_connections(2)
        .acquire_timeout(std::time::Duration::from_secs(5))
        .connect(url)
        .await?;

    tracing::info!("Connected to PostgreSQL");

    sqlx::migrate!("./migrations").run(&pool).await?;
    tracing::info!("Database migrations applied");

    Ok(Some(pool))
}

/// Load every table into a snapshot.
pub async fn load_snapshot(pool: &PgPool) -> Result<Snapshot, sqlx::Error> {
    Ok(Snapshot {
        actors: reference::load_actors(pool).await?,
        items: items::load_all(pool).await?,
        alerts: reference::load_alerts(pool).await?,
    })
}

/// Write a seed snapshot into empty tables, in one transaction.
pub async fn seed(pool: &PgPool, snapshot: &Snapshot) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;
    for actor in &snapshot.actors {
        reference::insert_actor(&mut *tx, actor).await?;
    }
    for alert in &snapshot.alerts {
        reference::insert_alert(&mut *tx, alert).await?;
    }
    for item in &snapshot.items {
        items::insert(&mut *tx, item).await?;
    }
    tx.commit().await?;
    tracing::info!(
        actors = snapshot.actors.len(),
        items = snapshot.items.len(),
        alerts = snapshot.alerts.len(),
        "database seeded"
    );
    Ok(())
}

/// The journal behind the applier: nothing, or Postgres.
#[derive(Debug, Clone)]
pub enum ItemJournal {
    /// In-memory only.
    Volatile,
    /// Versioned writes to `trackable_items`.
    Postgres(PgPool),
}

fn backend(err: sqlx::Error) -> StorageError {
    tracing::error!(error = %err, "item journal write failed");
    StorageError::Backend(err.to_string())
}

impl Journal for ItemJournal {
    async fn create(&self, item: &TrackableItem) -> Result<(), StorageError> {
        let Self::Postgres(pool) = self else {
            return Ok(());
        };
        if items::insert(pool, item).await.map_err(backend)? {
            Ok(())
        } else {
            Err(StorageError::AlreadyExists {
                id: item.id().to_string(),
            })
        }
    }

    async fn commit(&self, previous_version: u64, item: &TrackableItem) -> Result<(), StorageError> {
        let Self::Postgres(pool) = self else {
            return Ok(());
        };
        if items::compare_and_set(pool, previous_version, item)
            .await
            .map_err(backend)?
        {
            Ok(())
        } else {
            Err(StorageError::VersionConflict {
                id: item.id().to_string(),
                expected: previous_version,
            })
        }
    }
}
