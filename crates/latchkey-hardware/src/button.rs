//! Aggregation of several button inputs into one hold.

use crate::types::{ButtonEdge, ButtonSource};
use std::collections::VecDeque;

/// Tracks which sources are held.
///
/// The first source pressed owns the hold and is the one reported in
/// [`ButtonEdge::Pressed`]. Further presses while held are absorbed, and
/// [`ButtonEdge::Released`] is reported only once nothing is held.
///
/// Edges from a poll that failed part-way are [deferred](Self::defer) and
/// reported, in order, by the following updates.
#[derive(Debug, Clone, Default)]
pub struct ButtonTracker {
    held: Vec<ButtonSource>,
    deferred: VecDeque<ButtonEdge>,
}

impl ButtonTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one poll's worth of debounced changes.
    ///
    /// Presses are applied before releases, so a hand-over between two
    /// sources within one poll keeps the hold without an edge.
    pub fn update(&mut self, changes: &[(ButtonSource, bool)]) -> ButtonEdge {
        let edge = self.apply(changes);
        if self.deferred.is_empty() {
            return edge;
        }
        if edge != ButtonEdge::None {
            self.deferred.push_back(edge);
        }
        self.deferred.pop_front().unwrap_or_default()
    }

    /// Apply changes from a poll that is being reported as failed. The
    /// resulting edge comes out of the next [`update`](Self::update).
    pub fn defer(&mut self, changes: &[(ButtonSource, bool)]) {
        let edge = self.apply(changes);
        if edge != ButtonEdge::None {
            self.deferred.push_back(edge);
        }
    }

    fn apply(&mut self, changes: &[(ButtonSource, bool)]) -> ButtonEdge {
        let was_held = !self.held.is_empty();

        for &(source, pressed) in changes {
            if pressed && !self.held.contains(&source) {
                self.held.push(source);
            }
        }
        for &(source, pressed) in changes {
            if !pressed {
                self.held.retain(|s| *s != source);
            }
        }

        match (was_held, self.held.first()) {
            (false, Some(&owner)) => ButtonEdge::Pressed(owner),
            (true, None) => ButtonEdge::Released,
            _ => ButtonEdge::None,
        }
    }

    #[must_use]
    pub fn is_held(&self) -> bool {
        !self.held.is_empty()
    }
}
