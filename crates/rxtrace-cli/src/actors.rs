//! # Actors Subcommand
//!
//! Directory listing and eligible receivers.

use std::path::Path;

use anyhow::{Context, Result};
use clap::{Args, Subcommand};

use rxtrace_core::{Actor, ActorId, Role};

use crate::world::World;
use crate::EXIT_REJECTED;

/// Arguments for the actors subcommand.
#[derive(Args, Debug)]
pub struct ActorsArgs {
    #[command(subcommand)]
    pub command: ActorsCommand,
}

/// Directory queries.
#[derive(Subcommand, Debug)]
pub enum ActorsCommand {
    /// List actors in directory order.
    List {
        /// Only actors with this role.
        #[arg(long)]
        role: Option<String>,
    },
    /// Actors the given actor may hand custody to.
    Receivers {
        /// Actor id.
        id: String,
    },
}

fn print_actors<'a>(actors: impl IntoIterator<Item = &'a Actor>) {
    for actor in actors {
        println!(
            "{:<12} {:<24} {:<20} {}",
            actor.id.as_str(),
            actor.name,
            actor.role.as_str(),
            actor.location
        );
    }
}

/// Execute the actors subcommand.
pub fn run_actors(args: &ActorsArgs, data: &Path) -> Result<u8> {
    let world = World::load(data)?;
    let directory = world.applier.directory();
    match &args.command {
        ActorsCommand::List { role } => {
            match role {
                Some(role) => {
                    let role = Role::from_name(role).context("--role")?;
                    print_actors(directory.by_role(role));
                }
                None => print_actors(directory.all()),
            }
            Ok(0)
        }
        ActorsCommand::Receivers { id } => {
            let actor = match directory.by_id(&ActorId::new(id.as_str())?) {
                Ok(actor) => actor,
                Err(e) => {
                    eprintln!("{}: {e}", e.kind().as_str());
                    return Ok(EXIT_REJECTED);
                }
            };
            print_actors(directory.receivers_for(actor));
            Ok(0)
        }
    }
}
