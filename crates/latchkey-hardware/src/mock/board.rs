//! A board whose every pin is a mock line.

use super::line::{MockInput, MockLineHandle, MockOutput};
use crate::traits::{InputLine, LineProvider, OutputLine};
use crate::types::Level;
use crate::{HardwareError, Result};
use std::collections::BTreeMap;

/// [`LineProvider`] backed by mock lines.
///
/// Claims are recorded so tests can reach any pin after a profile has been
/// built from the board, and so a pin cannot be claimed twice.
///
/// # Examples
///
/// ```
/// use latchkey_hardware::mock::SimulatedBoard;
/// use latchkey_hardware::{Level, LineProvider, OutputLine};
///
/// let mut board = SimulatedBoard::new();
/// let mut lock = board.output(16).unwrap();
/// lock.set(Level::High).unwrap();
///
/// assert_eq!(board.level(16), Some(Level::High));
/// assert!(board.output(16).is_err());
/// ```
#[derive(Debug, Default, Clone)]
pub struct SimulatedBoard {
    pins: BTreeMap<u8, MockLineHandle>,
}

impl SimulatedBoard {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle for a claimed pin.
    #[must_use]
    pub fn handle(&self, pin: u8) -> Option<MockLineHandle> {
        self.pins.get(&pin).cloned()
    }

    /// Current level of a claimed pin.
    #[must_use]
    pub fn level(&self, pin: u8) -> Option<Level> {
        self.pins.get(&pin).map(MockLineHandle::level)
    }

    /// Drive a claimed input pin.
    ///
    /// # Errors
    ///
    /// Returns `HardwareError::PinUnavailable` if nothing claimed `pin`.
    pub fn drive(&self, pin: u8, level: Level) -> Result<()> {
        let handle = self
            .pins
            .get(&pin)
            .ok_or_else(|| HardwareError::pin_unavailable(pin, "not claimed"))?;
        handle.set_level(level);
        Ok(())
    }

    /// Pins claimed so far.
    pub fn claimed(&self) -> impl Iterator<Item = u8> + '_ {
        self.pins.keys().copied()
    }

    fn claim(&mut self, pin: u8) -> Result<MockLineHandle> {
        if self.pins.contains_key(&pin) {
            return Err(HardwareError::pin_unavailable(pin, "already claimed"));
        }
        let handle = MockLineHandle::new(pin);
        self.pins.insert(pin, handle.clone());
        Ok(handle)
    }
}

impl LineProvider for SimulatedBoard {
    fn output(&mut self, pin: u8) -> Result<Box<dyn OutputLine>> {
        Ok(Box::new(MockOutput::from_handle(self.claim(pin)?)))
    }

    fn input(&mut self, pin: u8) -> Result<Box<dyn InputLine>> {
        Ok(Box::new(MockInput::from_handle(self.claim(pin)?)))
    }
}
