//! Sharepool CLI - replays pool scenarios against in-memory collaborators.

mod commands;
mod scenario;
mod telemetry;

use clap::Parser;

fn main() -> anyhow::Result<()> {
    let cli = commands::Cli::parse();

    if let Err(e) = commands::execute(cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}
