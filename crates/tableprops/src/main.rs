//! table-properties CLI
//!
//! Compares keyspace, table and role properties against a desired
//! definition and prints the CQL statements that remove the drift.

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::{debug, info};

use tableprops::commands::{self, DiffCommand, DumpCommand};
use tableprops::logging;

/// Keyspace and table property drift detection.
#[derive(Parser)]
#[command(name = "table-properties")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Write log output to this file instead of stderr.
    #[arg(long, global = true)]
    log: Option<PathBuf>,

    /// Enable verbose output.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the statements that turn the current config into the desired one.
    Diff(DiffCommand),

    /// Normalize a row export into a snapshot file.
    Dump(DumpCommand),
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    logging::init(cli.verbose, cli.log.as_deref())?;

    match cli.command {
        Commands::Diff(cmd) => {
            let statements = commands::diff(&cmd)?;
            commands::print_statements(&mut io::stdout().lock(), &statements)?;
            if cmd.quiet && !statements.is_empty() {
                debug!(pending = statements.len(), "check failed");
                return Ok(ExitCode::FAILURE);
            }
        }

        Commands::Dump(cmd) => {
            if let Some(path) = commands::dump(&cmd, &mut io::stdout().lock())? {
                info!(path = %path.display(), "snapshot written");
                println!("{}", path.display());
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}
