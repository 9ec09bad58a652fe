//! `latchkey log` - Print the audit log

use anyhow::{Context, Result};
use clap::Args;
use latchkey_controller::Config;

#[derive(Args)]
pub struct LogArgs {
    /// Show only the last N entries
    #[arg(long, value_name = "N")]
    pub tail: Option<usize>,
}

pub fn handle(args: &LogArgs, config: &Config) -> Result<()> {
    let log = config
        .storage
        .open_log()
        .context("failed to open event log")?;
    let entries = match args.tail {
        Some(n) => log.tail(n)?,
        None => log.read_all()?,
    };

    if entries.is_empty() {
        println!("Log is empty");
    }
    for entry in &entries {
        println!("{entry}");
    }
    Ok(())
}
