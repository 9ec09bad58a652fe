//! Solenoid / magnetic lock profile.
//!
//! One MOSFET holds the lock open while asserted. The reader carries a
//! two-colour LED (one line: asserted = green, otherwise red) and a buzzer.
//! A door position sensor and an emergency release switch are reported on
//! every poll; an optional request-to-exit button acts as the local button.

use crate::button::ButtonTracker;
use crate::config::MagneticLockConfig;
use crate::pins::{BoundInput, BoundOutput};
use crate::profiles::blink_phase;
use crate::traits::{HardwareProfile, LineProvider};
use crate::types::{ButtonSource, Command, IndicatorState, InputSnapshot, ProfileKind};
use crate::{HardwareError, Result};
use latchkey_core::Timestamp;
use tracing::debug;

#[derive(Debug)]
pub struct MagneticLockProfile {
    lock_drive: BoundOutput,
    door_led: BoundOutput,
    buzzer: BoundOutput,
    door_sense: BoundInput,
    emergency_release: BoundInput,
    exit_button: Option<BoundInput>,
    buttons: ButtonTracker,
    indicator: IndicatorState,
}

impl MagneticLockProfile {
    /// Claim every role from `provider` and drive outputs to the locked,
    /// idle state.
    ///
    /// # Errors
    ///
    /// Fails if a pin cannot be claimed or the initial writes fail.
    pub fn new<P: LineProvider + ?Sized>(
        config: &MagneticLockConfig,
        provider: &mut P,
    ) -> Result<Self> {
        let debounce = std::time::Duration::from_millis(config.debounce_ms);
        let exit_button = config
            .exit_button
            .map(|binding| BoundInput::claim(provider, binding, debounce))
            .transpose()?;

        let mut profile = Self {
            lock_drive: BoundOutput::claim(provider, "lock_drive", config.lock_drive)?,
            door_led: BoundOutput::claim(provider, "door_led", config.door_led)?,
            buzzer: BoundOutput::claim(provider, "buzzer", config.buzzer)?,
            door_sense: BoundInput::claim(provider, config.door_sense, debounce)?,
            emergency_release: BoundInput::claim(provider, config.emergency_release, debounce)?,
            exit_button,
            buttons: ButtonTracker::new(),
            indicator: IndicatorState::Idle,
        };
        profile.set_indicator(IndicatorState::Idle)?;
        Ok(profile)
    }

    /// Whether the lock is currently driven open.
    #[must_use]
    pub fn is_energized(&self) -> bool {
        self.lock_drive.is_asserted()
    }
}

impl HardwareProfile for MagneticLockProfile {
    fn kind(&self) -> ProfileKind {
        ProfileKind::MagneticLock
    }

    fn apply_command(&mut self, command: Command) -> Result<()> {
        debug!(%command, "Magnetic lock command");
        match command {
            Command::Energize => self.lock_drive.set(true),
            Command::Release => self.lock_drive.set(false),
            Command::Raise | Command::Lower | Command::Stop => Err(HardwareError::unsupported(
                format!("{command} on magnetic lock"),
            )),
        }
    }

    fn poll_inputs(&mut self, now: Timestamp) -> Result<InputSnapshot> {
        if self.indicator == IndicatorState::Fault {
            self.door_led.set_if_changed(blink_phase(now))?;
        }

        let door = self.door_sense.sample(now);
        let emergency = self.emergency_release.sample(now);

        let mut changes = Vec::new();
        let mut exit_fault = Ok(());
        if let Some(exit) = self.exit_button.as_mut() {
            match exit.sample(now) {
                Ok(Some(pressed)) => changes.push((ButtonSource::Local, pressed)),
                Ok(None) => {}
                Err(e) => exit_fault = Err(e),
            }
        }

        if let Err(e) = door.and(emergency).map(drop).and(exit_fault) {
            self.buttons.defer(&changes);
            return Err(e);
        }

        Ok(InputSnapshot {
            button: self.buttons.update(&changes),
            door_open: Some(self.door_sense.is_asserted()),
            emergency: Some(self.emergency_release.is_asserted()),
        })
    }

    fn set_indicator(&mut self, state: IndicatorState) -> Result<()> {
        let (green, buzz) = match state {
            IndicatorState::Granted | IndicatorState::Emergency => (true, false),
            IndicatorState::Idle | IndicatorState::Fault => (false, false),
            IndicatorState::Denied => (false, true),
        };
        self.door_led.set(green)?;
        self.buzzer.set(buzz)?;
        self.indicator = state;
        Ok(())
    }
}
