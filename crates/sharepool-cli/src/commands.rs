//! CLI command implementations.

use clap::{Parser, Subcommand};
use sharepool_core::PoolConfig;
use std::path::PathBuf;

use crate::scenario::{self, Scenario};
use crate::telemetry;

/// Main CLI.
#[derive(Parser)]
#[command(name = "sharepool")]
#[command(about = "Sharepool - replay revenue-sharing pool scenarios")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    /// Log filter (e.g. "info", "sharepool_core=debug")
    #[arg(long, global = true, env = "SHAREPOOL_LOG", default_value = "warn")]
    pub log_level: String,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Replay a scenario and print the resulting pool state and events
    Run {
        /// Pool configuration (TOML)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Scenario script (TOML)
        #[arg(short, long)]
        scenario: PathBuf,

        /// Exit with an error if any step was rejected
        #[arg(long)]
        strict: bool,
    },
    /// Print the default pool configuration
    InitConfig,
}

/// Execute a parsed command line.
pub fn execute(cli: Cli) -> anyhow::Result<()> {
    telemetry::init_telemetry(&cli.log_level, cli.json)?;

    match cli.command {
        Commands::Run { config, scenario, strict } => run(config, scenario, strict),
        Commands::InitConfig => {
            print!("{}", PoolConfig::default().to_toml_string()?);
            Ok(())
        }
    }
}

fn run(config: Option<PathBuf>, scenario: PathBuf, strict: bool) -> anyhow::Result<()> {
    let config = load_config(config)?;
    let scenario = Scenario::from_file(&scenario)?;

    tracing::info!(steps = scenario.steps.len(), "replaying scenario");
    let report = scenario::run(config, &scenario)?;

    println!("{}", serde_json::to_string_pretty(&report)?);

    if strict && report.rejected() > 0 {
        anyhow::bail!("{} of {} steps were rejected", report.rejected(), report.steps.len());
    }
    Ok(())
}

fn load_config(path: Option<PathBuf>) -> anyhow::Result<PoolConfig> {
    match path {
        Some(path) => Ok(PoolConfig::from_file(&path)?),
        None => Ok(PoolConfig::default()),
    }
}
