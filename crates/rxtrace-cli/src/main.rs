//! # rxtrace CLI entry point
//!
//! Parses command-line arguments and dispatches to subcommand handlers.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use rxtrace_cli::actors::{run_actors, ActorsArgs};
use rxtrace_cli::alerts::{run_alerts, AlertsArgs};
use rxtrace_cli::batch::{run_batch, BatchArgs};
use rxtrace_cli::shipment::{run_shipment, ShipmentArgs};
use rxtrace_cli::validate::{run_validate, ValidateArgs};
use rxtrace_cli::EXIT_FAILURE;

/// rxtrace: pharmaceutical chain-of-custody tracking over a snapshot file.
#[derive(Parser, Debug)]
#[command(name = "rxtrace", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Snapshot file (JSON, or YAML for .yaml/.yml).
    #[arg(long, global = true, default_value = "rxtrace.json")]
    data: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Check a snapshot's invariants.
    Validate(ValidateArgs),

    /// Shipment custody operations (list, show, history, create, transition, forward).
    Shipment(ShipmentArgs),

    /// Production batch operations (list, register, advance, ship).
    Batch(BatchArgs),

    /// Alert queries (list, counts).
    Alerts(AlertsArgs),

    /// Actor directory queries (list, receivers).
    Actors(ActorsArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!(data = %cli.data.display(), "rxtrace CLI starting");

    let result = match &cli.command {
        Commands::Validate(args) => run_validate(args, &cli.data),
        Commands::Shipment(args) => run_shipment(args, &cli.data),
        Commands::Batch(args) => run_batch(args, &cli.data),
        Commands::Alerts(args) => run_alerts(args, &cli.data),
        Commands::Actors(args) => run_actors(args, &cli.data),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::from(EXIT_FAILURE)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rxtrace_cli::batch::BatchCommand;
    use rxtrace_cli::shipment::ShipmentCommand;

    #[test]
    fn cli_parse_validate_default_data() {
        let cli = Cli::try_parse_from(["rxtrace", "validate"]).unwrap();
        assert_eq!(cli.data, PathBuf::from("rxtrace.json"));
        assert!(matches!(cli.command, Commands::Validate(ValidateArgs { path: None })));
    }

    #[test]
    fn cli_parse_global_flags_after_subcommand() {
        let cli =
            Cli::try_parse_from(["rxtrace", "shipment", "list", "--data", "w.yaml", "-vv"]).unwrap();
        assert_eq!(cli.data, PathBuf::from("w.yaml"));
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn cli_parse_transition() {
        let cli = Cli::try_parse_from([
            "rxtrace",
            "shipment",
            "transition",
            "SHP-1",
            "--actor",
            "a-dan",
            "--status",
            "DELIVERED",
        ])
        .unwrap();
        let Commands::Shipment(args) = cli.command else {
            panic!("expected shipment");
        };
        match args.command {
            ShipmentCommand::Transition {
                id,
                actor,
                status,
                recipient,
            } => {
                assert_eq!(id, "SHP-1");
                assert_eq!(actor, "a-dan");
                assert_eq!(status, "DELIVERED");
                assert!(recipient.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn cli_parse_create_with_ship_now() {
        let cli = Cli::try_parse_from([
            "rxtrace",
            "shipment",
            "create",
            "--id",
            "SHP-9",
            "--actor",
            "a-alice",
            "--product",
            "Amoxicillin",
            "--destination",
            "Frankfurt",
            "--ship-now",
        ])
        .unwrap();
        let Commands::Shipment(args) = cli.command else {
            panic!("expected shipment");
        };
        assert!(matches!(
            args.command,
            ShipmentCommand::Create { ship_now: true, ref kind, .. } if kind == "physical_shipment"
        ));
    }

    #[test]
    fn cli_parse_batch_register_dates() {
        let cli = Cli::try_parse_from([
            "rxtrace",
            "batch",
            "register",
            "--id",
            "LOT-1",
            "--actor",
            "a-alice",
            "--drug",
            "Ibuprofen",
            "--quantity",
            "500",
            "--manufactured",
            "2026-01-10",
            "--expires",
            "2028-01-10",
        ])
        .unwrap();
        let Commands::Batch(args) = cli.command else {
            panic!("expected batch");
        };
        assert!(matches!(
            args.command,
            BatchCommand::Register { quantity: 500, .. }
        ));
    }

    #[test]
    fn cli_rejects_bad_date() {
        let result = Cli::try_parse_from([
            "rxtrace",
            "batch",
            "register",
            "--id",
            "LOT-1",
            "--actor",
            "a-alice",
            "--drug",
            "Ibuprofen",
            "--quantity",
            "500",
            "--manufactured",
            "10/01/2026",
            "--expires",
            "2028-01-10",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn cli_rejects_batch_with_orphaned() {
        let result = Cli::try_parse_from([
            "rxtrace", "alerts", "list", "--batch", "SHP-1", "--orphaned",
        ]);
        assert!(result.is_err());
    }
}
