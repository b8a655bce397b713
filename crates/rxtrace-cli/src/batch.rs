//! # Batch Subcommand
//!
//! Production batches: register, mark ready, and ship into custody.

use std::path::Path;

use anyhow::Result;
use chrono::NaiveDate;
use clap::{Args, Subcommand};

use rxtrace_core::{ActorId, BatchId};
use rxtrace_ledger::{RegisterBatch, ShipBatch};
use rxtrace_state::LotDetails;

use crate::world::{block_on, World};

/// Arguments for the batch subcommand.
#[derive(Args, Debug)]
pub struct BatchArgs {
    #[command(subcommand)]
    pub command: BatchCommand,
}

/// Batch operations.
#[derive(Subcommand, Debug)]
pub enum BatchCommand {
    /// List batches still in production.
    List,
    /// Register a lot as IN_PRODUCTION.
    Register {
        /// Lot id.
        #[arg(long)]
        id: String,
        /// Registering manufacturer's actor id.
        #[arg(long)]
        actor: String,
        /// Drug name.
        #[arg(long)]
        drug: String,
        /// Units in the lot.
        #[arg(long)]
        quantity: u32,
        /// Manufacture date (YYYY-MM-DD).
        #[arg(long)]
        manufactured: NaiveDate,
        /// Expiry date (YYYY-MM-DD).
        #[arg(long)]
        expires: NaiveDate,
    },
    /// Mark production complete.
    Advance {
        /// Lot id.
        id: String,
        /// Acting actor id.
        #[arg(long)]
        actor: String,
    },
    /// Move a ready batch into the custody chain.
    Ship {
        /// Lot id.
        id: String,
        /// Acting actor id.
        #[arg(long)]
        actor: String,
        /// Destination location.
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

/// Execute the batch subcommand.
pub fn run_batch(args: &BatchArgs, data: &Path) -> Result<u8> {
    let world = World::load(data)?;
    match &args.command {
        BatchCommand::List => {
            println!(
                "{:<16} {:<20} {:<24} {:>8} {:<10}",
                "ID", "STATUS", "DRUG", "QTY", "EXPIRES"
            );
            for item in world.applier.batches() {
                let Some(batch) = item.batch() else {
                    continue;
                };
                println!(
                    "{:<16} {:<20} {:<24} {:>8} {:<10}",
                    item.id().as_str(),
                    batch.status.as_str(),
                    item.product_name(),
                    batch.lot.quantity,
                    batch.lot.expiry_date.to_string()
                );
            }
            Ok(0)
        }
        BatchCommand::Register {
            id,
            actor,
            drug,
            quantity,
            manufactured,
            expires,
        } => {
            let req = RegisterBatch {
                id: BatchId::new(id.as_str())?,
                actor_id: ActorId::new(actor.as_str())?,
                drug_name: drug.clone(),
                lot: LotDetails {
                    quantity: *quantity,
                    manufacture_date: *manufactured,
                    expiry_date: *expires,
                },
            };
            let result = block_on(world.applier.register_batch(req))?;
            Ok(world.commit(result))
        }
        BatchCommand::Advance { id, actor } => {
            let id = BatchId::new(id.as_str())?;
            let actor = ActorId::new(actor.as_str())?;
            let result = block_on(world.applier.advance_batch(&id, &actor))?;
            Ok(world.commit(result))
        }
        BatchCommand::Ship {
            id,
            actor,
            destination,
            ship_now,
            recipient,
        } => {
            let req = ShipBatch {
                id: BatchId::new(id.as_str())?,
                actor_id: ActorId::new(actor.as_str())?,
                destination: destination.clone(),
                ship_now: *ship_now,
                recipient: recipient.clone(),
            };
            let result = block_on(world.applier.ship_batch(req))?;
            Ok(world.commit(result))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::fixtures::write_world;
    use crate::EXIT_REJECTED;
    use rxtrace_state::{BatchStatus, CustodyStatus};

    fn run(data: &Path, command: BatchCommand) -> u8 {
        run_batch(&BatchArgs { command }, data).unwrap()
    }

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn register(actor: &str) -> BatchCommand {
        BatchCommand::Register {
            id: "LOT-7".into(),
            actor: actor.into(),
            drug: "Amoxicillin 500mg".into(),
            quantity: 1200,
            manufactured: date("2026-01-10"),
            expires: date("2028-01-10"),
        }
    }

    fn load(data: &Path) -> rxtrace_state::TrackableItem {
        World::load(data)
            .unwrap()
            .applier
            .get(&BatchId::new("LOT-7").unwrap())
            .unwrap()
    }

    #[test]
    fn register_advance_ship() {
        let dir = tempfile::tempdir().unwrap();
        let data = write_world(dir.path());

        assert_eq!(run(&data, register("a-alice")), 0);
        assert_eq!(load(&data).batch_status(), BatchStatus::InProduction);

        let advance = BatchCommand::Advance {
            id: "LOT-7".into(),
            actor: "a-alice".into(),
        };
        assert_eq!(run(&data, advance), 0);
        assert_eq!(load(&data).batch_status(), BatchStatus::ReadyForShipment);

        let ship = BatchCommand::Ship {
            id: "LOT-7".into(),
            actor: "a-alice".into(),
            destination: "Frankfurt".into(),
            ship_now: true,
            recipient: None,
        };
        assert_eq!(run(&data, ship), 0);
        let item = load(&data);
        let custody = item.custody().unwrap();
        assert_eq!(custody.status(), CustodyStatus::InTransit);
        assert_eq!(custody.lot().unwrap().quantity, 1200);
    }

    #[test]
    fn non_manufacturer_cannot_register() {
        let dir = tempfile::tempdir().unwrap();
        let data = write_world(dir.path());
        assert_eq!(run(&data, register("a-dan")), EXIT_REJECTED);
    }

    #[test]
    fn shipping_before_ready_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        let data = write_world(dir.path());
        run(&data, register("a-alice"));
        let ship = BatchCommand::Ship {
            id: "LOT-7".into(),
            actor: "a-alice".into(),
            destination: "Frankfurt".into(),
            ship_now: false,
            recipient: None,
        };
        assert_eq!(run(&data, ship), EXIT_REJECTED);
    }
}
