//! # Shipment Subcommand
//!
//! Custody-phase items: list, inspect, open, transition and forward.

use std::path::Path;

use anyhow::{Context, Result};
use clap::{Args, Subcommand};

use rxtrace_core::{same_name, ActorId, BatchId};
use rxtrace_ledger::{CreateShipment, ForwardShipment};
use rxtrace_state::{CustodyStatus, ItemKind};

use crate::world::{block_on, World};
use crate::EXIT_REJECTED;

/// Arguments for the shipment subcommand.
#[derive(Args, Debug)]
pub struct ShipmentArgs {
    #[command(subcommand)]
    pub command: ShipmentCommand,
}

/// Shipment operations.
#[derive(Subcommand, Debug)]
pub enum ShipmentCommand {
    /// List shipments with their alert counts.
    List {
        /// Only shipments in this status.
        #[arg(long)]
        status: Option<String>,
        /// Only shipments held by this actor name.
        #[arg(long)]
        holder: Option<String>,
    },
    /// Print one item as JSON.
    Show {
        /// Item id.
        id: String,
    },
    /// Print the custody ledger, oldest first.
    History {
        /// Item id.
        id: String,
    },
    /// Open a new shipment held by the acting actor.
    Create {
        /// Item id.
        #[arg(long)]
        id: String,
        /// Acting actor id.
        #[arg(long)]
        actor: String,
        /// Product or dossier name.
        #[arg(long)]
        product: String,
        /// Destination location.
        #[arg(long)]
        destination: String,
        /// Origin location. Defaults to the actor's location.
        #[arg(long)]
        origin: Option<String>,
        /// `physical_shipment` or `regulatory_submission`.
        #[arg(long, default_value = "physical_shipment")]
        kind: String,
        /// Record IN_TRANSIT in the same write.
        #[arg(long)]
        ship_now: bool,
        /// Explicit next holder when shipping now.
        #[arg(long)]
        recipient: Option<String>,
    },
    /// Request a status change.
    Transition {
        /// Item id.
        id: String,
        /// Acting actor id.
        #[arg(long)]
        actor: String,
        /// Target status, e.g. IN_TRANSIT or In-Transit.
        #[arg(long)]
        status: String,
        /// Explicit next holder for a hand-over.
        #[arg(long)]
        recipient: Option<String>,
    },
    /// Open the next hop from a delivered shipment.
    Forward {
        /// Delivered item id.
        parent: String,
        /// Id for the new item.
        #[arg(long)]
        id: String,
        /// Acting actor id; must hold the delivered item.
        #[arg(long)]
        actor: String,
        /// Destination of the new hop.
        #[arg(long)]
        destination: String,
        /// Record IN_TRANSIT in the same write.
        #[arg(long)]
        ship_now: bool,
        /// Explicit next holder when shipping now.
        #[arg(long)]
        recipient: Option<String>,
    },
}

/// Execute the shipment subcommand.
pub fn run_shipment(args: &ShipmentArgs, data: &Path) -> Result<u8> {
    let world = World::load(data)?;
    match &args.command {
        ShipmentCommand::List { status, holder } => {
            let status = status
                .as_deref()
                .map(CustodyStatus::parse)
                .transpose()
                .context("--status")?;
            list(&world, status, holder.as_deref());
            Ok(0)
        }
        ShipmentCommand::Show { id } => {
            let Some(item) = world.applier.get(&BatchId::new(id.as_str())?) else {
                return Ok(not_found(id));
            };
            println!("{}", serde_json::to_string_pretty(&item)?);
            Ok(0)
        }
        ShipmentCommand::History { id } => {
            let Some(item) = world.applier.get(&BatchId::new(id.as_str())?) else {
                return Ok(not_found(id));
            };
            match item.custody() {
                Some(custody) => {
                    for entry in custody.history().entries() {
                        println!(
                            "{}  {:<18} {}",
                            entry.timestamp.to_iso8601(),
                            entry.status.as_str(),
                            entry.holder
                        );
                    }
                }
                None => println!("{id} has not entered the custody chain"),
            }
            Ok(0)
        }
        ShipmentCommand::Create {
            id,
            actor,
            product,
            destination,
            origin,
            kind,
            ship_now,
            recipient,
        } => {
            let req = CreateShipment {
                id: BatchId::new(id.as_str())?,
                kind: kind.parse::<ItemKind>().context("--kind")?,
                actor_id: ActorId::new(actor.as_str())?,
                product_name: product.clone(),
                destination: destination.clone(),
                origin: origin.clone(),
                ship_now: *ship_now,
                recipient: recipient.clone(),
            };
            let result = block_on(world.applier.create_shipment(req))?;
            Ok(world.commit(result))
        }
        ShipmentCommand::Transition {
            id,
            actor,
            status,
            recipient,
        } => {
            let id = BatchId::new(id.as_str())?;
            let actor = ActorId::new(actor.as_str())?;
            let status = CustodyStatus::parse(status).context("--status")?;
            let result = block_on(world.applier.apply(&id, &actor, status, recipient.as_deref()))?;
            Ok(world.commit(result))
        }
        ShipmentCommand::Forward {
            parent,
            id,
            actor,
            destination,
            ship_now,
            recipient,
        } => {
            let req = ForwardShipment {
                parent_id: BatchId::new(parent.as_str())?,
                id: BatchId::new(id.as_str())?,
                actor_id: ActorId::new(actor.as_str())?,
                destination: destination.clone(),
                ship_now: *ship_now,
                recipient: recipient.clone(),
            };
            let result = block_on(world.applier.forward(req))?;
            Ok(world.commit(result))
        }
    }
}

fn list(world: &World, status: Option<CustodyStatus>, holder: Option<&str>) {
    let counts = world.alerts.counts_by_batch();
    println!(
        "{:<16} {:<18} {:<24} {:<16} {:>6}",
        "ID", "STATUS", "HOLDER", "DESTINATION", "ALERTS"
    );
    for item in world.applier.shipments() {
        let Some(custody) = item.custody() else {
            continue;
        };
        if status.is_some_and(|s| s != custody.status()) {
            continue;
        }
        if holder.is_some_and(|h| !same_name(h, custody.current_holder())) {
            continue;
        }
        println!(
            "{:<16} {:<18} {:<24} {:<16} {:>6}",
            item.id().as_str(),
            custody.status().as_str(),
            custody.current_holder(),
            custody.destination(),
            counts.get(item.id()).copied().unwrap_or(0)
        );
    }
}

fn not_found(id: &str) -> u8 {
    eprintln!("NOT_FOUND: item {id} not found");
    EXIT_REJECTED
}
