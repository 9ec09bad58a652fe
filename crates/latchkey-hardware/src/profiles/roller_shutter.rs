//! Roller shutter profile.
//!
//! The shutter motor is driven by two logic outputs (raise, lower). The
//! operator switch beside the shutter is wired through `button_relay`, so it
//! only moves the motor while the controller has the relay energized; the
//! controller sees the switch through `button_sense`. Two remote trigger
//! inputs ask for raise or lower and count as button presses for timers.

use crate::button::ButtonTracker;
use crate::config::RollerShutterConfig;
use crate::pins::{BoundInput, BoundOutput};
use crate::profiles::blink_phase;
use crate::traits::{HardwareProfile, LineProvider};
use crate::types::{ButtonSource, Command, IndicatorState, InputSnapshot, ProfileKind};
use crate::Result;
use latchkey_core::Timestamp;
use std::time::Duration;
use tracing::debug;

#[derive(Debug)]
pub struct RollerShutterProfile {
    button_relay: BoundOutput,
    raise: BoundOutput,
    lower: BoundOutput,
    switch_led: BoundOutput,
    status_led: BoundOutput,
    button_sense: BoundInput,
    remote_raise: BoundInput,
    remote_lower: BoundInput,
    buttons: ButtonTracker,
    indicator: IndicatorState,
}

impl RollerShutterProfile {
    /// Claim every role from `provider`; all outputs start deasserted.
    ///
    /// # Errors
    ///
    /// Fails if a pin cannot be claimed or the initial writes fail.
    pub fn new<P: LineProvider + ?Sized>(
        config: &RollerShutterConfig,
        provider: &mut P,
    ) -> Result<Self> {
        let debounce = Duration::from_millis(config.debounce_ms);
        let mut profile = Self {
            button_relay: BoundOutput::claim(provider, "button_relay", config.button_relay)?,
            raise: BoundOutput::claim(provider, "raise", config.raise)?,
            lower: BoundOutput::claim(provider, "lower", config.lower)?,
            switch_led: BoundOutput::claim(provider, "switch_led", config.switch_led)?,
            status_led: BoundOutput::claim(provider, "status_led", config.status_led)?,
            button_sense: BoundInput::claim(provider, config.button_sense, debounce)?,
            remote_raise: BoundInput::claim(provider, config.remote_raise, debounce)?,
            remote_lower: BoundInput::claim(provider, config.remote_lower, debounce)?,
            buttons: ButtonTracker::new(),
            indicator: IndicatorState::Idle,
        };
        profile.set_indicator(IndicatorState::Idle)?;
        Ok(profile)
    }

    /// Whether the operator switch is connected to the motor.
    #[must_use]
    pub fn is_energized(&self) -> bool {
        self.button_relay.is_asserted()
    }

    /// Current motor drive, if any.
    #[must_use]
    pub fn motion(&self) -> Option<Command> {
        match (self.raise.is_asserted(), self.lower.is_asserted()) {
            (true, _) => Some(Command::Raise),
            (_, true) => Some(Command::Lower),
            _ => None,
        }
    }

    fn stop(&mut self) -> Result<()> {
        self.raise.set(false)?;
        self.lower.set(false)
    }
}

impl HardwareProfile for RollerShutterProfile {
    fn kind(&self) -> ProfileKind {
        ProfileKind::RollerShutter
    }

    fn apply_command(&mut self, command: Command) -> Result<()> {
        debug!(%command, "Roller shutter command");
        match command {
            Command::Energize => {
                self.button_relay.set(true)?;
                self.switch_led.set(true)
            }
            Command::Release => {
                self.stop()?;
                self.button_relay.set(false)?;
                self.switch_led.set(false)
            }
            // The opposite direction is always dropped first.
            Command::Raise => {
                self.lower.set(false)?;
                self.raise.set(true)
            }
            Command::Lower => {
                self.raise.set(false)?;
                self.lower.set(true)
            }
            Command::Stop => self.stop(),
        }
    }

    fn poll_inputs(&mut self, now: Timestamp) -> Result<InputSnapshot> {
        if self.indicator == IndicatorState::Fault {
            self.status_led.set_if_changed(blink_phase(now))?;
        }

        let mut changes = Vec::new();
        let mut fault = None;
        for (source, input) in [
            (ButtonSource::Local, &mut self.button_sense),
            (ButtonSource::RemoteRaise, &mut self.remote_raise),
            (ButtonSource::RemoteLower, &mut self.remote_lower),
        ] {
            match input.sample(now) {
                Ok(Some(pressed)) => changes.push((source, pressed)),
                Ok(None) => {}
                Err(e) => {
                    fault.get_or_insert(e);
                }
            }
        }

        if let Some(e) = fault {
            self.buttons.defer(&changes);
            return Err(e);
        }

        Ok(InputSnapshot {
            button: self.buttons.update(&changes),
            door_open: None,
            emergency: None,
        })
    }

    fn set_indicator(&mut self, state: IndicatorState) -> Result<()> {
        let lit = matches!(state, IndicatorState::Granted | IndicatorState::Emergency);
        self.status_led.set(lit)?;
        self.indicator = state;
        Ok(())
    }
}
