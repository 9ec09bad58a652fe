//! Mock output and input lines.

use crate::traits::{InputLine, OutputLine};
use crate::types::Level;
use crate::{HardwareError, Result};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

#[derive(Debug, Default)]
struct LineState {
    high: AtomicBool,
    writes: AtomicU32,
    fail_next: AtomicBool,
}

/// Shared view of a mock line.
///
/// For an output the handle observes what the profile wrote; for an input
/// it sets the level the profile will read. Clones share the same line.
///
/// # Examples
///
/// ```
/// use latchkey_hardware::mock::MockOutput;
/// use latchkey_hardware::{Level, OutputLine};
///
/// let (mut line, handle) = MockOutput::new(16);
/// line.set(Level::High).unwrap();
/// assert_eq!(handle.level(), Level::High);
/// assert_eq!(handle.writes(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct MockLineHandle {
    pin: u8,
    state: Arc<LineState>,
}

impl MockLineHandle {
    pub(crate) fn new(pin: u8) -> Self {
        Self {
            pin,
            state: Arc::new(LineState::default()),
        }
    }

    #[must_use]
    pub fn pin(&self) -> u8 {
        self.pin
    }

    /// Current electrical level.
    #[must_use]
    pub fn level(&self) -> Level {
        Level::from(self.state.high.load(Ordering::SeqCst))
    }

    /// Drive the level seen by an input.
    pub fn set_level(&self, level: Level) {
        self.state.high.store(level.is_high(), Ordering::SeqCst);
    }

    /// Number of successful writes to an output.
    #[must_use]
    pub fn writes(&self) -> u32 {
        self.state.writes.load(Ordering::SeqCst)
    }

    /// Make the next read or write on this line fail.
    pub fn fail_next(&self) {
        self.state.fail_next.store(true, Ordering::SeqCst);
    }

    fn take_failure(&self) -> Result<()> {
        if self.state.fail_next.swap(false, Ordering::SeqCst) {
            return Err(HardwareError::line_fault(self.pin, "injected fault"));
        }
        Ok(())
    }
}

/// Mock output line.
#[derive(Debug)]
pub struct MockOutput {
    handle: MockLineHandle,
}

impl MockOutput {
    /// Create an output on `pin`, initially low.
    #[must_use]
    pub fn new(pin: u8) -> (Self, MockLineHandle) {
        let handle = MockLineHandle::new(pin);
        (
            Self {
                handle: handle.clone(),
            },
            handle,
        )
    }

    pub(crate) fn from_handle(handle: MockLineHandle) -> Self {
        Self { handle }
    }
}

impl OutputLine for MockOutput {
    fn set(&mut self, level: Level) -> Result<()> {
        self.handle.take_failure()?;
        self.handle.set_level(level);
        self.handle.state.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Mock input line.
#[derive(Debug)]
pub struct MockInput {
    handle: MockLineHandle,
}

impl MockInput {
    /// Create an input on `pin`, initially low.
    #[must_use]
    pub fn new(pin: u8) -> (Self, MockLineHandle) {
        let handle = MockLineHandle::new(pin);
        (
            Self {
                handle: handle.clone(),
            },
            handle,
        )
    }

    pub(crate) fn from_handle(handle: MockLineHandle) -> Self {
        Self { handle }
    }
}

impl InputLine for MockInput {
    fn read(&mut self) -> Result<Level> {
        self.handle.take_failure()?;
        Ok(self.handle.level())
    }
}
