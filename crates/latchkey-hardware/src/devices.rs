//! Enum wrapper for hardware profile dispatch.
//!
//! The controller is generic over [`HardwareProfile`]; [`AnyProfile`] lets
//! the binary pick the variant from configuration at startup and still hand
//! the controller one concrete type.
//!
//! # Examples
//!
//! ```
//! use latchkey_hardware::devices::AnyProfile;
//! use latchkey_hardware::mock::SimulatedBoard;
//! use latchkey_hardware::{HardwareProfile, ProfileConfig, ProfileKind};
//!
//! let mut board = SimulatedBoard::new();
//! let profile = AnyProfile::from_config(&ProfileConfig::default(), &mut board).unwrap();
//! assert_eq!(profile.kind(), ProfileKind::MagneticLock);
//! ```

use crate::config::ProfileConfig;
use crate::profiles::{MagneticLockProfile, RollerShutterProfile};
use crate::traits::{HardwareProfile, LineProvider};
use crate::types::{Command, IndicatorState, InputSnapshot, ProfileKind};
use crate::Result;
use latchkey_core::Timestamp;
use tracing::info;

/// Any supported hardware profile.
#[derive(Debug)]
#[non_exhaustive]
pub enum AnyProfile {
    MagneticLock(MagneticLockProfile),
    RollerShutter(RollerShutterProfile),
}

impl AnyProfile {
    /// Validate the wiring and build the configured profile.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for clashing pins, or whatever the
    /// provider returns when a pin cannot be claimed.
    pub fn from_config<P: LineProvider + ?Sized>(
        config: &ProfileConfig,
        provider: &mut P,
    ) -> Result<Self> {
        config.validate()?;
        let profile = match config {
            ProfileConfig::MagneticLock(c) => {
                Self::MagneticLock(MagneticLockProfile::new(c, provider)?)
            }
            ProfileConfig::RollerShutter(c) => {
                Self::RollerShutter(RollerShutterProfile::new(c, provider)?)
            }
        };
        info!(kind = %profile.kind(), "Hardware profile ready");
        Ok(profile)
    }
}

impl HardwareProfile for AnyProfile {
    fn kind(&self) -> ProfileKind {
        match self {
            Self::MagneticLock(p) => p.kind(),
            Self::RollerShutter(p) => p.kind(),
        }
    }

    fn apply_command(&mut self, command: Command) -> Result<()> {
        match self {
            Self::MagneticLock(p) => p.apply_command(command),
            Self::RollerShutter(p) => p.apply_command(command),
        }
    }

    fn poll_inputs(&mut self, now: Timestamp) -> Result<InputSnapshot> {
        match self {
            Self::MagneticLock(p) => p.poll_inputs(now),
            Self::RollerShutter(p) => p.poll_inputs(now),
        }
    }

    fn set_indicator(&mut self, state: IndicatorState) -> Result<()> {
        match self {
            Self::MagneticLock(p) => p.set_indicator(state),
            Self::RollerShutter(p) => p.set_indicator(state),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{MagneticLockConfig, PinBinding, RollerShutterConfig};
    use crate::mock::SimulatedBoard;
    use crate::HardwareError;

    #[test]
    fn test_builds_roller_shutter() {
        let mut board = SimulatedBoard::new();
        let config = ProfileConfig::RollerShutter(RollerShutterConfig::default());
        let mut profile = AnyProfile::from_config(&config, &mut board).unwrap();

        assert_eq!(profile.kind(), ProfileKind::RollerShutter);
        profile.apply_command(Command::Raise).unwrap();
        assert_eq!(board.claimed().count(), 8);
    }

    #[test]
    fn test_rejects_clashing_pins_before_claiming() {
        let mut board = SimulatedBoard::new();
        let config = ProfileConfig::MagneticLock(MagneticLockConfig {
            buzzer: PinBinding::new(5),
            ..MagneticLockConfig::default()
        });
        let error = AnyProfile::from_config(&config, &mut board).unwrap_err();
        assert!(matches!(error, HardwareError::ConfigurationError { .. }));
        assert_eq!(board.claimed().count(), 0);
    }

    #[test]
    fn test_pin_already_claimed_elsewhere() {
        let mut board = SimulatedBoard::new();
        board.output(16).unwrap();
        let error = AnyProfile::from_config(&ProfileConfig::default(), &mut board).unwrap_err();
        assert!(matches!(error, HardwareError::PinUnavailable { pin: 16, .. }));
    }
}
