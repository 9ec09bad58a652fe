//! `latchkey check-config` - Validate and summarize the configuration

use anyhow::{Context, Result};
use latchkey_controller::Config;

pub fn handle(config: &Config) -> Result<()> {
    config.validate().context("configuration is invalid")?;

    let formats: Vec<String> = config
        .wiegand
        .formats
        .iter()
        .map(ToString::to_string)
        .collect();

    println!("Configuration OK");
    println!("  profile:  {}", config.profile.kind());
    println!("  tick:     {}ms", config.tick_ms);
    println!(
        "  timers:   initial {}ms, button {}ms, sanity {}ms",
        config.timers.initial_ms, config.timers.button_ms, config.timers.sanity_ms
    );
    println!(
        "  wiegand:  {} on D0={} D1={}",
        formats.join(", "),
        config.wiegand.d0_pin,
        config.wiegand.d1_pin
    );
    println!("  data dir: {}", config.storage.data_dir.display());
    Ok(())
}
