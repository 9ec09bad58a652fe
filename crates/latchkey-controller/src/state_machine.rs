//! Barrier state machine and its three timers.
//!
//! # States
//!
//! - `Locked`: barrier closed, no timers running
//! - `Unlocking`: actuation in progress (transient, within one tick)
//! - `Unlocked`: barrier open, initial or button timer running
//! - `HoldOpen`: button held, only the sanity timer runs
//! - `Locking`: release in progress (transient, within one tick)
//!
//! # Valid Transitions
//!
//! - Locked → Unlocking → Unlocked
//! - Unlocking → Locking (actuation failed)
//! - Unlocked ⇄ HoldOpen
//! - Unlocked | HoldOpen → Locking → Locked
//!
//! # Timers
//!
//! An unlock cycle arms the *sanity* deadline once and never moves it.
//! The *initial* deadline runs from the unlock until the first button
//! press. Each button release arms the *button* deadline. Entering
//! `Locked` clears all three.
//!
//! # Examples
//!
//! ```
//! use latchkey_controller::{BarrierState, LockState, TimerConfig};
//! use latchkey_core::Timestamp;
//! use latchkey_storage::TimerKind;
//!
//! let timers = TimerConfig::default();
//! let mut state = BarrierState::new();
//! let t0 = Timestamp::from_millis(1_000);
//!
//! state.transition_to(LockState::Unlocking, t0).unwrap();
//! state.transition_to(LockState::Unlocked, t0).unwrap();
//! state.arm_unlock(t0, &timers, false);
//!
//! assert_eq!(state.expired_timer(Timestamp::from_millis(10_999)), None);
//! assert_eq!(
//!     state.expired_timer(Timestamp::from_millis(11_000)),
//!     Some(TimerKind::Initial)
//! );
//! ```

use crate::config::TimerConfig;
use latchkey_core::{Error, Result, Timestamp};
use latchkey_storage::TimerKind;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;

/// Maximum number of state transitions to keep in history.
const MAX_HISTORY_SIZE: usize = 100;

/// Barrier state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LockState {
    #[default]
    Locked,
    Unlocking,
    Unlocked,
    HoldOpen,
    Locking,
}

impl fmt::Display for LockState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LockState::Locked => "Locked",
            LockState::Unlocking => "Unlocking",
            LockState::Unlocked => "Unlocked",
            LockState::HoldOpen => "HoldOpen",
            LockState::Locking => "Locking",
        };
        write!(f, "{}", name)
    }
}

impl LockState {
    /// Check if transition to `target` is legal from this state.
    ///
    /// ```
    /// use latchkey_controller::LockState;
    ///
    /// assert!(LockState::Locked.can_transition_to(LockState::Unlocking));
    /// assert!(!LockState::Locked.can_transition_to(LockState::Unlocked));
    /// ```
    #[must_use]
    pub fn can_transition_to(self, target: LockState) -> bool {
        matches!(
            (self, target),
            (LockState::Locked, LockState::Unlocking)
                | (LockState::Unlocking, LockState::Unlocked | LockState::Locking)
                | (LockState::Unlocked, LockState::HoldOpen | LockState::Locking)
                | (LockState::HoldOpen, LockState::Unlocked | LockState::Locking)
                | (LockState::Locking, LockState::Locked)
        )
    }

    /// Whether the barrier is open (or being held open).
    #[must_use]
    pub fn is_open(self) -> bool {
        matches!(self, LockState::Unlocked | LockState::HoldOpen)
    }
}

/// One recorded state change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateTransition {
    pub from: LockState,
    pub to: LockState,
    /// Monotonic microseconds at which the transition happened.
    pub at: Timestamp,
}

/// Outcome of the most recent credential presentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Verdict {
    Granted,
    Denied,
    UnknownCredential,
    DecodeError,
}

/// The controller's own state: current [`LockState`], timer deadlines and
/// a bounded transition history.
///
/// Not thread-safe; owned by exactly one controller.
#[derive(Debug, Clone)]
pub struct BarrierState {
    current: LockState,
    entered_at: Timestamp,
    history: VecDeque<StateTransition>,
    initial_deadline: Option<Timestamp>,
    button_deadline: Option<Timestamp>,
    sanity_deadline: Option<Timestamp>,
    /// The button has been pressed at least once in this unlock cycle.
    button_activity: bool,
    /// This unlock cycle was entered (or taken over) by emergency release.
    emergency: bool,
    last_verdict: Option<Verdict>,
}

impl BarrierState {
    /// A locked barrier with no history.
    #[must_use]
    pub fn new() -> Self {
        Self {
            current: LockState::Locked,
            entered_at: Timestamp::ZERO,
            history: VecDeque::with_capacity(MAX_HISTORY_SIZE),
            initial_deadline: None,
            button_deadline: None,
            sanity_deadline: None,
            button_activity: false,
            emergency: false,
            last_verdict: None,
        }
    }

    #[must_use]
    pub fn current(&self) -> LockState {
        self.current
    }

    /// When the current state was entered.
    #[must_use]
    pub fn entered_at(&self) -> Timestamp {
        self.entered_at
    }

    /// Recent transitions, oldest first.
    #[must_use]
    pub fn history(&self) -> &VecDeque<StateTransition> {
        &self.history
    }

    #[must_use]
    pub fn last_verdict(&self) -> Option<Verdict> {
        self.last_verdict
    }

    pub fn record_verdict(&mut self, verdict: Verdict) {
        self.last_verdict = Some(verdict);
    }

    #[must_use]
    pub fn is_emergency(&self) -> bool {
        self.emergency
    }

    #[must_use]
    pub fn has_button_activity(&self) -> bool {
        self.button_activity
    }

    #[must_use]
    pub fn deadline(&self, timer: TimerKind) -> Option<Timestamp> {
        match timer {
            TimerKind::Initial => self.initial_deadline,
            TimerKind::Button => self.button_deadline,
            TimerKind::Sanity => self.sanity_deadline,
        }
    }

    /// Move to `target`, validating the transition.
    ///
    /// Entering `Locked` clears every timer and the cycle flags.
    ///
    /// # Errors
    ///
    /// `Error::InvalidStateTransition` if `target` is not reachable from
    /// the current state. Nothing changes in that case.
    pub fn transition_to(&mut self, target: LockState, now: Timestamp) -> Result<StateTransition> {
        if !self.current.can_transition_to(target) {
            return Err(Error::InvalidStateTransition {
                from: self.current.to_string(),
                to: target.to_string(),
            });
        }

        let transition = StateTransition {
            from: self.current,
            to: target,
            at: now,
        };
        self.current = target;
        self.entered_at = now;
        if target == LockState::Locked {
            self.clear_cycle();
        }

        self.history.push_back(transition);
        if self.history.len() > MAX_HISTORY_SIZE {
            self.history.pop_front();
        }
        Ok(transition)
    }

    /// Start an unlock cycle at `now`.
    ///
    /// The sanity deadline is fixed here for the whole cycle. An emergency
    /// cycle gets no initial deadline.
    pub fn arm_unlock(&mut self, now: Timestamp, timers: &TimerConfig, emergency: bool) {
        self.sanity_deadline = Some(now + timers.sanity());
        self.initial_deadline = (!emergency).then(|| now + timers.initial());
        self.button_deadline = None;
        self.button_activity = false;
        self.emergency = emergency;
    }

    /// A grant arrived while already open: restart the initial timer if the
    /// cycle has not seen the button.
    pub fn regrant(&mut self, now: Timestamp, timers: &TimerConfig) {
        if self.current == LockState::Unlocked && !self.button_activity && !self.emergency {
            self.initial_deadline = Some(now + timers.initial());
        }
    }

    /// Emergency release asserted while already open.
    pub fn enter_emergency(&mut self) {
        self.emergency = true;
        self.initial_deadline = None;
        self.button_deadline = None;
    }

    /// Button pressed: suspend the initial and button timers.
    pub fn press(&mut self) {
        self.button_activity = true;
        self.initial_deadline = None;
        self.button_deadline = None;
    }

    /// Button released at `now`: start the button timer.
    pub fn release(&mut self, now: Timestamp, timers: &TimerConfig) {
        if !self.emergency {
            self.button_deadline = Some(now + timers.button());
        }
    }

    /// The timer that should lock the barrier at `now`, if any.
    ///
    /// When several deadlines have passed, the earliest one is reported.
    /// The sanity timer wins ties.
    #[must_use]
    pub fn expired_timer(&self, now: Timestamp) -> Option<TimerKind> {
        if !self.current.is_open() {
            return None;
        }
        let mut expired: Option<(TimerKind, Timestamp)> = None;
        for timer in [TimerKind::Sanity, TimerKind::Initial, TimerKind::Button] {
            if let Some(deadline) = self.deadline(timer)
                && now.has_reached(deadline)
                && expired.is_none_or(|(_, earliest)| deadline < earliest)
            {
                expired = Some((timer, deadline));
            }
        }
        expired.map(|(timer, _)| timer)
    }

    /// Earliest pending deadline, for diagnostics and the runtime.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Timestamp> {
        [
            self.sanity_deadline,
            self.initial_deadline,
            self.button_deadline,
        ]
        .into_iter()
        .flatten()
        .min()
    }

    fn clear_cycle(&mut self) {
        self.initial_deadline = None;
        self.button_deadline = None;
        self.sanity_deadline = None;
        self.button_activity = false;
        self.emergency = false;
    }
}

impl Default for BarrierState {
    fn default() -> Self {
        Self::new()
    }
}
