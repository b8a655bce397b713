//! # Application State
//!
//! Shared state handed to every handler. Cloning is cheap: the applier and
//! the alert snapshot sit behind `Arc`, and the summary client is itself a
//! shared handle.

use std::path::PathBuf;
use std::sync::Arc;

use rxtrace_alerts::AlertCorrelator;
use rxtrace_ledger::{ApplyError, Snapshot, SnapshotError, TransitionApplier};
use rxtrace_summary::SummaryClient;
use thiserror::Error;

use crate::db::ItemJournal;

/// The applier type the API runs.
pub type Applier = TransitionApplier<ItemJournal>;

/// Application configuration.
#[derive(Clone)]
pub struct AppConfig {
    /// Port to bind the HTTP server to.
    pub port: u16,
    /// Static bearer token. If `None`, authentication is disabled.
    pub auth_token: Option<String>,
    /// Snapshot file loaded at boot.
    pub seed_path: Option<PathBuf>,
    /// Postgres connection string. If `None`, state is in-memory only.
    pub database_url: Option<String>,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("port", &self.port)
            .field("auth_token", &self.auth_token.as_ref().map(|_| "[REDACTED]"))
            .field("seed_path", &self.seed_path)
            .field(
                "database_url",
                &self.database_url.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            auth_token: None,
            seed_path: None,
            database_url: None,
        }
    }
}

impl AppConfig {
    /// Build configuration from `PORT`, `AUTH_TOKEN`, `RXTRACE_SEED` and
    /// `DATABASE_URL`. Empty values count as unset.
    pub fn from_env() -> Self {
        let var = |name: &str| std::env::var(name).ok().filter(|v| !v.trim().is_empty());
        let port = match var("PORT").map(|p| p.parse::<u16>()) {
            Some(Ok(port)) => port,
            Some(Err(e)) => {
                tracing::warn!(error = %e, "invalid PORT, using 8080");
                8080
            }
            None => 8080,
        };
        Self {
            port,
            auth_token: var("AUTH_TOKEN"),
            seed_path: var("RXTRACE_SEED").map(PathBuf::from),
            database_url: var("DATABASE_URL"),
        }
    }
}

/// Failure to assemble the application state.
#[derive(Error, Debug)]
pub enum StateError {
    /// The snapshot is inconsistent.
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
    /// The item set could not be loaded into the applier.
    #[error(transparent)]
    Apply(#[from] ApplyError),
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// The single writer over items.
    pub applier: Arc<Applier>,
    /// Read-only alert snapshot.
    pub alerts: Arc<AlertCorrelator>,
    /// Summarization collaborator, when configured.
    pub summary: Option<SummaryClient>,
    /// Runtime configuration.
    pub config: AppConfig,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("applier", &self.applier)
            .field("alerts", &self.alerts.len())
            .field("summary", &self.summary.is_some())
            .field("config", &self.config)
            .finish()
    }
}

impl AppState {
    /// Empty world, in-memory, default config.
    pub fn new() -> Self {
        Self::with_config(AppConfig::default())
    }

    /// Empty world, in-memory, with the given config.
    pub fn with_config(config: AppConfig) -> Self {
        Self {
            applier: Arc::new(TransitionApplier::empty(
                Arc::default(),
                ItemJournal::Volatile,
            )),
            alerts: Arc::new(AlertCorrelator::default()),
            summary: None,
            config,
        }
    }

    /// Build state from a snapshot.
    pub fn from_snapshot(
        config: AppConfig,
        snapshot: Snapshot,
        journal: ItemJournal,
        summary: Option<SummaryClient>,
    ) -> Result<Self, StateError> {
        let (directory, items, alerts) = snapshot.into_parts()?;
        let applier = TransitionApplier::new(Arc::new(directory), items, journal)?;
        Ok(Self {
            applier: Arc::new(applier),
            alerts: Arc::new(alerts),
            summary,
            config,
        })
    }

    /// Replace the summarization client.
    pub fn with_summary(mut self, client: SummaryClient) -> Self {
        self.summary = Some(client);
        self
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
