//! Controller configuration file.
//!
//! Every section and field is optional; an empty file is the reference
//! magnetic-lock board with the firmware's timer values.
//!
//! ```toml
//! tick_ms = 10
//!
//! [timers]
//! initial_ms = 10000
//! button_ms = 5000
//! sanity_ms = 30000
//! feedback_ms = 1000
//!
//! [wiegand]
//! formats = ["wiegand26", "wiegand34"]
//!
//! [storage]
//! data_dir = "/var/lib/latchkey"
//!
//! [profile]
//! kind = "roller-shutter"
//! ```

use latchkey_core::constants::{
    DEFAULT_BUTTON_TIMER_MS, DEFAULT_FEEDBACK_MS, DEFAULT_INITIAL_TIMER_MS,
    DEFAULT_SANITY_TIMER_MS, DEFAULT_TICK_MS,
};
use latchkey_core::{Error, Result};
use latchkey_hardware::ProfileConfig;
use latchkey_hardware::config::check_unique_pins;
use latchkey_storage::StorageConfig;
use latchkey_wiegand::WiegandConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::debug;

/// Barrier timer durations (`[timers]` section).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimerConfig {
    /// Unlocked time after a grant when nobody touches the button.
    pub initial_ms: u64,
    /// Unlocked time after the button is released.
    pub button_ms: u64,
    /// Hard ceiling on one unlock cycle.
    pub sanity_ms: u64,
    /// How long `granted`/`denied`/`fault` feedback stays on the indicator.
    pub feedback_ms: u64,
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            initial_ms: DEFAULT_INITIAL_TIMER_MS,
            button_ms: DEFAULT_BUTTON_TIMER_MS,
            sanity_ms: DEFAULT_SANITY_TIMER_MS,
            feedback_ms: DEFAULT_FEEDBACK_MS,
        }
    }
}

impl TimerConfig {
    #[must_use]
    pub fn initial(&self) -> Duration {
        Duration::from_millis(self.initial_ms)
    }

    #[must_use]
    pub fn button(&self) -> Duration {
        Duration::from_millis(self.button_ms)
    }

    #[must_use]
    pub fn sanity(&self) -> Duration {
        Duration::from_millis(self.sanity_ms)
    }

    #[must_use]
    pub fn feedback(&self) -> Duration {
        Duration::from_millis(self.feedback_ms)
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Control loop period.
    pub tick_ms: u64,
    pub timers: TimerConfig,
    pub wiegand: WiegandConfig,
    pub storage: StorageConfig,
    pub profile: ProfileConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tick_ms: DEFAULT_TICK_MS,
            timers: TimerConfig::default(),
            wiegand: WiegandConfig::default(),
            storage: StorageConfig::default(),
            profile: ProfileConfig::default(),
        }
    }
}

impl Config {
    /// Read, parse and validate a configuration file.
    ///
    /// # Errors
    ///
    /// `Io` if the file cannot be read, `ConfigParse` for TOML errors and
    /// `Config` for values that fail validation.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&text)?;
        debug!(path = %path.display(), "Configuration loaded");
        Ok(config)
    }

    /// Parse and validate configuration text.
    ///
    /// # Errors
    ///
    /// `ConfigParse` or `Config`.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    #[must_use]
    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }

    /// Check cross-field constraints.
    ///
    /// # Errors
    ///
    /// `Error::Config` describing the first violation.
    pub fn validate(&self) -> Result<()> {
        let durations = [
            ("tick_ms", self.tick_ms),
            ("timers.initial_ms", self.timers.initial_ms),
            ("timers.button_ms", self.timers.button_ms),
            ("timers.sanity_ms", self.timers.sanity_ms),
            ("timers.feedback_ms", self.timers.feedback_ms),
            ("wiegand.inter_bit_timeout_ms", self.wiegand.inter_bit_timeout_ms),
            ("wiegand.max_frame_ms", self.wiegand.max_frame_ms),
        ];
        if let Some((name, _)) = durations.iter().find(|(_, ms)| *ms == 0) {
            return Err(Error::Config(format!("{name} must be greater than zero")));
        }

        if self.tick_ms >= self.wiegand.inter_bit_timeout_ms {
            return Err(Error::Config(format!(
                "tick_ms ({}) must be shorter than wiegand.inter_bit_timeout_ms ({})",
                self.tick_ms, self.wiegand.inter_bit_timeout_ms
            )));
        }
        if self.wiegand.formats.is_empty() {
            return Err(Error::Config(
                "wiegand.formats must list at least one format".to_string(),
            ));
        }
        if self.storage.credentials_file == self.storage.staging_file {
            return Err(Error::Config(format!(
                "storage.staging_file must differ from storage.credentials_file ({})",
                self.storage.credentials_file
            )));
        }
        if self.timers.sanity_ms < self.timers.initial_ms.max(self.timers.button_ms) {
            return Err(Error::Config(format!(
                "timers.sanity_ms ({}) must not be shorter than initial_ms ({}) or button_ms ({})",
                self.timers.sanity_ms, self.timers.initial_ms, self.timers.button_ms
            )));
        }

        let mut roles = vec![
            ("wiegand.d0", self.wiegand.d0_pin),
            ("wiegand.d1", self.wiegand.d1_pin),
        ];
        roles.extend(self.profile.roles());
        check_unique_pins(roles).map_err(|e| Error::Config(e.to_string()))
    }
}
