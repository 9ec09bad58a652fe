//! Abstract commands, indicator states and input snapshots.
//!
//! These are the only hardware vocabulary the barrier controller sees. The
//! mapping onto physical lines lives in the profiles.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Electrical level of a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    #[default]
    Low,
    High,
}

impl Level {
    #[inline]
    #[must_use]
    pub fn is_high(self) -> bool {
        matches!(self, Level::High)
    }
}

impl From<bool> for Level {
    fn from(high: bool) -> Self {
        if high { Level::High } else { Level::Low }
    }
}

/// Actuation command issued by the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    /// Open the barrier (drive the lock open, or connect the operator button).
    Energize,
    /// Close the barrier. Implies `Stop` on profiles with motion.
    Release,
    /// Drive the shutter up.
    Raise,
    /// Drive the shutter down.
    Lower,
    /// Stop any shutter motion.
    Stop,
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Energize => write!(f, "energize"),
            Self::Release => write!(f, "release"),
            Self::Raise => write!(f, "raise"),
            Self::Lower => write!(f, "lower"),
            Self::Stop => write!(f, "stop"),
        }
    }
}

/// What the operator indicator should show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndicatorState {
    #[default]
    Idle,
    Granted,
    Denied,
    Emergency,
    /// Degraded logging or corrupt store. Blinks.
    Fault,
}

impl fmt::Display for IndicatorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Granted => write!(f, "granted"),
            Self::Denied => write!(f, "denied"),
            Self::Emergency => write!(f, "emergency"),
            Self::Fault => write!(f, "fault"),
        }
    }
}

/// Which physical input produced a button edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ButtonSource {
    /// Exit button (magnetic lock) or the operator switch (roller shutter).
    Local,
    /// Remote trigger asking the shutter to go up.
    RemoteRaise,
    /// Remote trigger asking the shutter to go down.
    RemoteLower,
}

/// Button activity since the previous poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ButtonEdge {
    #[default]
    None,
    Pressed(ButtonSource),
    Released,
}

/// Per-tick input report from a profile.
///
/// `door_open` and `emergency` are `None` on profiles without those inputs.
/// When present they carry the current debounced level, not an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InputSnapshot {
    pub button: ButtonEdge,
    pub door_open: Option<bool>,
    pub emergency: Option<bool>,
}

/// Which barrier variant a profile drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProfileKind {
    MagneticLock,
    RollerShutter,
}

impl fmt::Display for ProfileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MagneticLock => write!(f, "magnetic-lock"),
            Self::RollerShutter => write!(f, "roller-shutter"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_from_bool() {
        assert_eq!(Level::from(true), Level::High);
        assert_eq!(Level::from(false), Level::Low);
        assert!(Level::High.is_high());
    }

    #[test]
    fn test_default_snapshot_is_quiet() {
        let snapshot = InputSnapshot::default();
        assert_eq!(snapshot.button, ButtonEdge::None);
        assert_eq!(snapshot.door_open, None);
        assert_eq!(snapshot.emergency, None);
    }

    #[test]
    fn test_indicator_serialization() {
        let json = serde_json::to_string(&IndicatorState::Fault).unwrap();
        assert_eq!(json, "\"fault\"");
        let state: IndicatorState = serde_json::from_str("\"granted\"").unwrap();
        assert_eq!(state, IndicatorState::Granted);
    }

    #[test]
    fn test_profile_kind_display() {
        assert_eq!(ProfileKind::MagneticLock.to_string(), "magnetic-lock");
        assert_eq!(ProfileKind::RollerShutter.to_string(), "roller-shutter");
    }
}
