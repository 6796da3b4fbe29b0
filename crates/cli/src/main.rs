//! # wtt
//!
//! Command-line front end for `wtt-io`: inspect, convert, slice, combine and
//! deduplicate single-cycle wavetables stored as tagged `.wav` or `.wt`
//! files.

mod commands;
mod files;

use anyhow::Result;
use clap::Parser;
use commands::Commands;
use tracing_subscriber::EnvFilter;

/// Wavetable conversion and cleanup tool
#[derive(Parser)]
#[command(name = "wtt")]
#[command(about = "Convert, slice, combine and deduplicate wavetables")]
#[command(version)]
struct Cli {
    /// More log output (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Install the stderr subscriber. `RUST_LOG` wins over the flags.
fn init_logging(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => "warn",
        (false, 0) => "info",
        (false, 1) => "debug",
        (false, _) => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);
    commands::execute(cli.command)
}
