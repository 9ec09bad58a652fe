//! latchkey - barrier controller administration and simulation

mod commands;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use commands::{cards, check_config, log, simulate};
use latchkey_controller::Config;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "latchkey",
    version,
    about = "Latchkey - credential-gated barrier controller"
)]
struct Cli {
    /// Configuration file (TOML). Defaults apply when omitted.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Override the storage data directory
    #[arg(long, global = true, value_name = "DIR")]
    data_dir: Option<PathBuf>,

    /// Debug-level diagnostics (RUST_LOG still wins when set)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Credential store management
    Cards(cards::CardsArgs),
    /// Print the audit log
    Log(log::LogArgs),
    /// Load and validate the configuration
    CheckConfig,
    /// Run the controller against a simulated board
    Simulate(simulate::SimulateArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = load_config(cli.config.as_ref(), cli.data_dir)?;

    match cli.command {
        Commands::Cards(args) => cards::handle(args.command, &config)?,
        Commands::Log(args) => log::handle(&args, &config)?,
        Commands::CheckConfig => check_config::handle(&config)?,
        Commands::Simulate(args) => simulate::handle(&args, &config).await?,
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn load_config(path: Option<&PathBuf>, data_dir: Option<PathBuf>) -> Result<Config> {
    let mut config = match path {
        Some(path) => Config::load(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => Config::default(),
    };
    if let Some(dir) = data_dir {
        config.storage.data_dir = dir;
    }
    Ok(config)
}
