//! Input debouncing.

use latchkey_core::Timestamp;
use std::time::Duration;

/// Accepts a level change only after it has been stable for `window`.
///
/// Starts deasserted, so an input that is already asserted at power-up
/// produces a rising edge once it has been seen for one window.
#[derive(Debug, Clone)]
pub struct Debouncer {
    window: Duration,
    stable: bool,
    candidate: bool,
    since: Timestamp,
}

impl Debouncer {
    #[must_use]
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            stable: false,
            candidate: false,
            since: Timestamp::ZERO,
        }
    }

    /// Feed a raw sample. Returns the new stable level when it changes.
    pub fn update(&mut self, raw: bool, now: Timestamp) -> Option<bool> {
        if raw != self.candidate {
            self.candidate = raw;
            self.since = now;
        }
        if self.candidate != self.stable
            && now.saturating_duration_since(self.since) >= self.window
        {
            self.stable = self.candidate;
            return Some(self.stable);
        }
        None
    }

    /// Current debounced level.
    #[must_use]
    pub fn is_asserted(&self) -> bool {
        self.stable
    }
}
