//! Profile configuration (`[profile]` section).
//!
//! Each physical role is bound to a pin with its polarity:
//!
//! ```toml
//! [profile]
//! kind = "magnetic-lock"
//! debounce_ms = 30
//! lock_drive = { pin = 16 }
//! door_led = { pin = 5, active_low = true }
//! buzzer = { pin = 4, active_low = true }
//! ```
//!
//! Absent roles take the defaults of the reference boards.

use crate::error::{HardwareError, Result};
use crate::types::ProfileKind;
use latchkey_core::constants::DEFAULT_DEBOUNCE_MS;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// A role's pin and polarity.
///
/// `active_low` means the role is asserted when the line is low.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PinBinding {
    pub pin: u8,
    #[serde(default)]
    pub active_low: bool,
}

impl PinBinding {
    /// Active-high binding.
    #[must_use]
    pub const fn new(pin: u8) -> Self {
        Self {
            pin,
            active_low: false,
        }
    }

    /// Active-low binding.
    #[must_use]
    pub const fn active_low(pin: u8) -> Self {
        Self {
            pin,
            active_low: true,
        }
    }
}

/// Magnetic lock wiring.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MagneticLockConfig {
    pub debounce_ms: u64,
    /// MOSFET driving the lock. Asserted = lock open.
    pub lock_drive: PinBinding,
    /// Reader LED. Asserted = green, otherwise red.
    pub door_led: PinBinding,
    pub buzzer: PinBinding,
    /// Door position sensor. Asserted = door open.
    pub door_sense: PinBinding,
    pub emergency_release: PinBinding,
    /// Request-to-exit button, if fitted.
    pub exit_button: Option<PinBinding>,
}

impl Default for MagneticLockConfig {
    fn default() -> Self {
        Self {
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            lock_drive: PinBinding::new(16),
            door_led: PinBinding::active_low(5),
            buzzer: PinBinding::active_low(4),
            door_sense: PinBinding::new(14),
            emergency_release: PinBinding::new(15),
            exit_button: None,
        }
    }
}

/// Roller shutter wiring.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RollerShutterConfig {
    pub debounce_ms: u64,
    /// Relay connecting the operator switch to the motor circuit.
    pub button_relay: PinBinding,
    pub raise: PinBinding,
    pub lower: PinBinding,
    /// Backlight of the operator switch, lit while the controls are live.
    pub switch_led: PinBinding,
    /// Reader status LED.
    pub status_led: PinBinding,
    pub button_sense: PinBinding,
    pub remote_raise: PinBinding,
    pub remote_lower: PinBinding,
}

impl Default for RollerShutterConfig {
    fn default() -> Self {
        Self {
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            button_relay: PinBinding::new(7),
            raise: PinBinding::new(2),
            lower: PinBinding::new(3),
            switch_led: PinBinding::new(6),
            status_led: PinBinding::new(5),
            button_sense: PinBinding::new(4),
            remote_raise: PinBinding::new(0),
            remote_lower: PinBinding::new(1),
        }
    }
}

/// Which profile to build and how it is wired.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum ProfileConfig {
    MagneticLock(MagneticLockConfig),
    RollerShutter(RollerShutterConfig),
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self::MagneticLock(MagneticLockConfig::default())
    }
}

impl ProfileConfig {
    #[must_use]
    pub fn kind(&self) -> ProfileKind {
        match self {
            Self::MagneticLock(_) => ProfileKind::MagneticLock,
            Self::RollerShutter(_) => ProfileKind::RollerShutter,
        }
    }

    #[must_use]
    pub fn debounce(&self) -> Duration {
        let ms = match self {
            Self::MagneticLock(c) => c.debounce_ms,
            Self::RollerShutter(c) => c.debounce_ms,
        };
        Duration::from_millis(ms)
    }

    /// Every bound role with its pin, in declaration order.
    #[must_use]
    pub fn roles(&self) -> Vec<(&'static str, u8)> {
        match self {
            Self::MagneticLock(c) => {
                let mut roles = vec![
                    ("lock_drive", c.lock_drive.pin),
                    ("door_led", c.door_led.pin),
                    ("buzzer", c.buzzer.pin),
                    ("door_sense", c.door_sense.pin),
                    ("emergency_release", c.emergency_release.pin),
                ];
                if let Some(exit) = c.exit_button {
                    roles.push(("exit_button", exit.pin));
                }
                roles
            }
            Self::RollerShutter(c) => vec![
                ("button_relay", c.button_relay.pin),
                ("raise", c.raise.pin),
                ("lower", c.lower.pin),
                ("switch_led", c.switch_led.pin),
                ("status_led", c.status_led.pin),
                ("button_sense", c.button_sense.pin),
                ("remote_raise", c.remote_raise.pin),
                ("remote_lower", c.remote_lower.pin),
            ],
        }
    }

    /// Check that no pin is bound to two roles.
    ///
    /// # Errors
    ///
    /// Returns `HardwareError::ConfigurationError` naming both roles.
    pub fn validate(&self) -> Result<()> {
        check_unique_pins(self.roles())
    }
}

/// Reject any pin that appears under more than one role.
///
/// # Errors
///
/// Returns `HardwareError::ConfigurationError` naming the first clash.
pub fn check_unique_pins(
    roles: impl IntoIterator<Item = (&'static str, u8)>,
) -> Result<()> {
    let mut seen: HashMap<u8, &'static str> = HashMap::new();
    for (role, pin) in roles {
        if let Some(previous) = seen.insert(pin, role) {
            return Err(HardwareError::configuration(format!(
                "Pin {pin} is bound to both {previous} and {role}"
            )));
        }
    }
    Ok(())
}
