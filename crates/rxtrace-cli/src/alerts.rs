//! # Alerts Subcommand
//!
//! Read-only queries over the alert snapshot.

use std::path::Path;

use anyhow::Result;
use clap::{Args, Subcommand};

use rxtrace_core::{Alert, BatchId, Severity};

use crate::world::World;
use crate::EXIT_REJECTED;

/// Arguments for the alerts subcommand.
#[derive(Args, Debug)]
pub struct AlertsArgs {
    #[command(subcommand)]
    pub command: AlertsCommand,
}

/// Alert queries.
#[derive(Subcommand, Debug)]
pub enum AlertsCommand {
    /// List alerts, oldest first for one batch, load order otherwise.
    List {
        /// Only alerts for this batch id.
        #[arg(long, conflicts_with = "orphaned")]
        batch: Option<String>,
        /// Only alerts whose batch id matches no known item.
        #[arg(long)]
        orphaned: bool,
    },
    /// Severity counts for one item.
    Counts {
        /// Item id.
        id: String,
    },
}

/// Execute the alerts subcommand.
pub fn run_alerts(args: &AlertsArgs, data: &Path) -> Result<u8> {
    let world = World::load(data)?;
    match &args.command {
        AlertsCommand::List { batch, orphaned } => {
            let alerts: Vec<&Alert> = match batch {
                Some(id) => world.alerts.for_batch(&BatchId::new(id.as_str())?),
                None if *orphaned => world.alerts.orphans(|id| world.applier.contains(id)),
                None => world.alerts.all().iter().collect(),
            };
            for alert in alerts {
                println!(
                    "{}  {:<10} {:<6} {:<24} {}",
                    alert.timestamp.to_iso8601(),
                    alert.alert_id.as_str(),
                    alert.severity.as_str(),
                    alert.batch_id.as_str(),
                    alert.alert_type
                );
            }
            Ok(0)
        }
        AlertsCommand::Counts { id } => {
            let id = BatchId::new(id.as_str())?;
            if !world.applier.contains(&id) {
                eprintln!("NOT_FOUND: item {id} not found");
                return Ok(EXIT_REJECTED);
            }
            let counts = world.alerts.batch_severity_counts(&id);
            for severity in Severity::ALL.iter().rev() {
                println!("{:<6} {}", severity.as_str(), counts.get(*severity));
            }
            println!("total  {}", counts.total());
            if world.alerts.summary_offered(&id) {
                println!("summary available via POST /v1/shipments/{id}/alerts/summary");
            }
            Ok(0)
        }
    }
}
