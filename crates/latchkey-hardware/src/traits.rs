//! Line and profile traits.
//!
//! Two layers:
//!
//! - [`OutputLine`] / [`InputLine`] are single GPIO-style lines. They know
//!   nothing about polarity or roles and are handed out by a
//!   [`LineProvider`] (the board bootstrap).
//! - [`HardwareProfile`] is the capability set the barrier controller is
//!   written against: abstract commands in, abstract input snapshots out.
//!
//! All traits are synchronous. The control loop is a single cooperative
//! tick, and line access on the target is a register write, so there is
//! nothing to await.

use crate::Result;
use crate::types::{Command, IndicatorState, InputSnapshot, Level, ProfileKind};
use latchkey_core::Timestamp;
use std::fmt;

/// A digital output line.
pub trait OutputLine: Send + fmt::Debug {
    /// Drive the line to `level`.
    ///
    /// # Errors
    ///
    /// Returns `HardwareError::LineFault` if the write did not take.
    fn set(&mut self, level: Level) -> Result<()>;
}

/// A digital input line.
pub trait InputLine: Send + fmt::Debug {
    /// Sample the current level. Debouncing happens above this layer.
    ///
    /// # Errors
    ///
    /// Returns `HardwareError::LineFault` if the line cannot be read.
    fn read(&mut self) -> Result<Level>;
}

/// Hands out lines by pin number.
///
/// Each pin may be claimed once; a second claim fails with
/// `HardwareError::PinUnavailable`.
pub trait LineProvider {
    /// Claim `pin` as an output.
    fn output(&mut self, pin: u8) -> Result<Box<dyn OutputLine>>;

    /// Claim `pin` as an input.
    fn input(&mut self, pin: u8) -> Result<Box<dyn InputLine>>;
}

/// Abstract barrier hardware.
///
/// The controller never learns which variant it is driving beyond
/// [`kind`](Self::kind), which is used for diagnostics only.
///
/// # Examples
///
/// ```
/// use latchkey_core::Timestamp;
/// use latchkey_hardware::{Command, HardwareProfile, IndicatorState, Result};
///
/// fn open_briefly<P: HardwareProfile>(profile: &mut P, now: Timestamp) -> Result<()> {
///     profile.apply_command(Command::Energize)?;
///     profile.set_indicator(IndicatorState::Granted)?;
///     let _inputs = profile.poll_inputs(now)?;
///     Ok(())
/// }
/// ```
pub trait HardwareProfile: Send {
    /// Which variant this is.
    fn kind(&self) -> ProfileKind;

    /// Perform an actuation command.
    ///
    /// # Errors
    ///
    /// Returns `HardwareError::Unsupported` for commands the variant has no
    /// actuator for, or a line error if an output write failed.
    fn apply_command(&mut self, command: Command) -> Result<()>;

    /// Sample and debounce inputs, and advance time-based outputs such as
    /// the fault blink. Called once per tick.
    ///
    /// # Errors
    ///
    /// Returns a line error if an input could not be read.
    fn poll_inputs(&mut self, now: Timestamp) -> Result<InputSnapshot>;

    /// Show an indicator state until the next call.
    ///
    /// # Errors
    ///
    /// Returns a line error if an output write failed.
    fn set_indicator(&mut self, state: IndicatorState) -> Result<()>;
}
