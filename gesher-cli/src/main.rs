//! Gesher CLI - Command-line interface
//!
//! Provides command-line access to the Gesher server and media tooling.

mod commands;

use clap::Parser;
use gesher_core::tracing_setup::{CliLogLevel, init_tracing};

#[derive(Parser)]
#[command(name = "gesher")]
#[command(about = "Media readiness and contact fan-out backend")]
struct Cli {
    /// Console log level (full debug log is always written to disk)
    #[arg(long, global = true, default_value = "info")]
    log_level: CliLogLevel,

    #[command(subcommand)]
    command: commands::Commands,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.log_level.as_tracing_level(), None)?;

    commands::handle_command(cli.command).await?;

    Ok(())
}
