//! Timestamped line edges.

use latchkey_core::Timestamp;
use std::time::Duration;

/// One of the two Wiegand data lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataLine {
    /// DATA0: a pulse is a `0` bit.
    D0,
    /// DATA1: a pulse is a `1` bit.
    D1,
}

impl DataLine {
    /// The line that carries `bit`.
    #[inline]
    #[must_use]
    pub const fn for_bit(bit: bool) -> Self {
        if bit { DataLine::D1 } else { DataLine::D0 }
    }

    /// The bit value a pulse on this line represents.
    #[inline]
    #[must_use]
    pub const fn bit(self) -> bool {
        matches!(self, DataLine::D1)
    }
}

/// A falling edge on a data line, stamped by the interrupt that saw it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edge {
    pub line: DataLine,
    pub at: Timestamp,
}

impl Edge {
    #[must_use]
    pub const fn new(line: DataLine, at: Timestamp) -> Self {
        Self { line, at }
    }
}

/// Lay out a pulse sequence as edges `interval` apart, starting at `start`.
///
/// Used by the simulator and tests to stand in for a physical reader.
#[must_use]
pub fn frame_edges(lines: &[DataLine], start: Timestamp, interval: Duration) -> Vec<Edge> {
    let mut at = start;
    lines
        .iter()
        .map(|&line| {
            let edge = Edge::new(line, at);
            at = at + interval;
            edge
        })
        .collect()
}
