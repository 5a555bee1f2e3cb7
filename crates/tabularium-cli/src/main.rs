//! # tabularium CLI entry point
//!
//! Parses command-line arguments, installs the tracing subscriber, and
//! dispatches to subcommand handlers.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use tabularium_cli::config::{Config, LogFormat};
use tabularium_cli::decode::{run_decode, DecodeArgs};
use tabularium_cli::entity::{
    run_key, run_normalize, run_reconcile, KeyArgs, NormalizeArgs, ReconcileArgs, Reconciliation,
};
use tabularium_cli::kinds::{run_kinds, KindsArgs};

/// Tabularium entity identity and reconciliation toolkit.
///
/// Normalizes entity envelopes, computes canonical keys, replays merge and
/// visit reconciliation, and decodes stored payloads.
#[derive(Parser, Debug)]
#[command(name = "tabularium", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to a YAML configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Key-value partition for `--emit kv` output.
    #[arg(long, global = true)]
    partition: Option<String>,

    /// Log line format.
    #[arg(long, value_enum, global = true)]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Decode an envelope and run its hook pipeline.
    Normalize(NormalizeArgs),

    /// Print the canonical key of an envelope.
    Key(KeyArgs),

    /// Apply an authoritative update to a stored entity.
    Merge(ReconcileArgs),

    /// Apply a passive observation to a stored entity.
    Visit(ReconcileArgs),

    /// Decode stored JSON, key-value, or binary payloads.
    Decode(DecodeArgs),

    /// List registered discriminators.
    Kinds(KindsArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let loaded = Config::load(cli.config.as_deref());
    let log_format = cli
        .log_format
        .or_else(|| loaded.as_ref().ok().map(|c| c.log_format))
        .unwrap_or_default();
    init_tracing(cli.verbose, log_format);

    let config = match loaded {
        Ok(config) => config.with_overrides(cli.partition.as_deref(), cli.log_format),
        Err(e) => {
            tracing::error!("{e:#}");
            return ExitCode::from(1);
        }
    };
    tracing::debug!(partition = %config.partition, "tabularium CLI starting");

    let result = match &cli.command {
        Commands::Normalize(args) => run_normalize(args, &config),
        Commands::Key(args) => run_key(args),
        Commands::Merge(args) => run_reconcile(args, Reconciliation::Merge, &config),
        Commands::Visit(args) => run_reconcile(args, Reconciliation::Visit, &config),
        Commands::Decode(args) => run_decode(args),
        Commands::Kinds(args) => run_kinds(args),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}

/// `RUST_LOG` wins over `-v` when set.
fn init_tracing(verbose: u8, format: LogFormat) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}
