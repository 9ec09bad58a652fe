//! Frame assembly and validation.

use crate::edge::{DataLine, Edge};
use crate::error::DecodeError;
use crate::format::WiegandFormat;
use crate::frame::WiegandFrame;
use crate::queue::EdgeReceiver;
use latchkey_core::constants::{
    DEFAULT_D0_PIN, DEFAULT_D1_PIN, DEFAULT_INTER_BIT_TIMEOUT_MS, DEFAULT_MAX_FRAME_MS,
};
use latchkey_core::{CredentialId, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::time::Duration;
use tracing::{debug, warn};

/// Decoder configuration (`[wiegand]` section).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WiegandConfig {
    /// Frame formats accepted. Frames of any other length are rejected.
    pub formats: Vec<WiegandFormat>,
    /// Idle gap after which an open frame is closed.
    pub inter_bit_timeout_ms: u64,
    /// Longest a frame may stay open before it is abandoned.
    pub max_frame_ms: u64,
    /// Input pin for DATA0.
    pub d0_pin: u8,
    /// Input pin for DATA1.
    pub d1_pin: u8,
}

impl Default for WiegandConfig {
    fn default() -> Self {
        Self {
            formats: WiegandFormat::ALL.to_vec(),
            inter_bit_timeout_ms: DEFAULT_INTER_BIT_TIMEOUT_MS,
            max_frame_ms: DEFAULT_MAX_FRAME_MS,
            d0_pin: DEFAULT_D0_PIN,
            d1_pin: DEFAULT_D1_PIN,
        }
    }
}

impl WiegandConfig {
    #[must_use]
    pub fn inter_bit_timeout(&self) -> Duration {
        Duration::from_millis(self.inter_bit_timeout_ms)
    }

    #[must_use]
    pub fn max_frame(&self) -> Duration {
        Duration::from_millis(self.max_frame_ms)
    }

    /// Widest accepted frame, which bounds how many bits a frame may hold.
    #[must_use]
    pub fn frame_capacity(&self) -> usize {
        self.formats
            .iter()
            .map(|f| f.bit_length())
            .max()
            .unwrap_or(0)
    }
}

/// A successfully decoded credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CredentialRead {
    pub id: CredentialId,
    pub format: WiegandFormat,
    /// When the frame was closed.
    pub completed_at: Timestamp,
}

/// Outcome of one closed frame.
pub type DecodeResult = Result<CredentialRead, DecodeError>;

/// Running counters for diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecoderStats {
    pub frames_decoded: u64,
    pub decode_errors: u64,
    /// Edges ignored because the frame was full or they collided.
    pub noise_edges: u64,
}

/// Turns timestamped edges into credential reads.
///
/// Feed edges in arrival order with [`feed`](Self::feed) and call
/// [`poll`](Self::poll) once per tick so idle and overlong frames get
/// closed. Results queue up until taken with
/// [`next_result`](Self::next_result).
#[derive(Debug)]
pub struct WiegandDecoder {
    config: WiegandConfig,
    capacity: usize,
    frame: Option<WiegandFrame>,
    /// Previous edge, for same-instant collision detection.
    last_edge: Option<Edge>,
    /// Whether `last_edge` added a bit that a collision may take back.
    last_appended: bool,
    ready: VecDeque<DecodeResult>,
    stats: DecoderStats,
}

impl WiegandDecoder {
    #[must_use]
    pub fn new(config: WiegandConfig) -> Self {
        let capacity = config.frame_capacity();
        Self {
            config,
            capacity,
            frame: None,
            last_edge: None,
            last_appended: false,
            ready: VecDeque::new(),
            stats: DecoderStats::default(),
        }
    }

    #[must_use]
    pub fn config(&self) -> &WiegandConfig {
        &self.config
    }

    /// Process one edge.
    pub fn feed(&mut self, edge: Edge) {
        self.expire(edge.at);

        if let Some(prev) = self.last_edge
            && self.frame.is_some()
            && prev.at == edge.at
        {
            self.collide(prev.line, edge.line);
            return;
        }
        self.last_edge = Some(edge);

        let capacity = self.capacity;
        let frame = self
            .frame
            .get_or_insert_with(|| WiegandFrame::open(edge.at, capacity));
        self.last_appended = frame.push(edge.line.bit(), edge.at);
        if !self.last_appended {
            self.stats.noise_edges += 1;
        }
    }

    /// Feed every edge waiting in `rx`. Returns how many were consumed.
    pub fn drain_from<const N: usize>(&mut self, rx: &mut EdgeReceiver<N>) -> usize {
        let mut count = 0;
        while let Some(edge) = rx.pop() {
            self.feed(edge);
            count += 1;
        }
        count
    }

    /// Close or abandon the open frame if `now` says it is over.
    pub fn poll(&mut self, now: Timestamp) {
        self.expire(now);
    }

    /// Take the oldest completed result.
    pub fn next_result(&mut self) -> Option<DecodeResult> {
        self.ready.pop_front()
    }

    /// Whether a frame is currently being received.
    #[must_use]
    pub fn is_receiving(&self) -> bool {
        self.frame.is_some()
    }

    #[must_use]
    pub fn stats(&self) -> DecoderStats {
        self.stats
    }

    /// Drop any open frame and pending results.
    pub fn reset(&mut self) {
        self.frame = None;
        self.last_edge = None;
        self.last_appended = false;
        self.ready.clear();
    }

    fn collide(&mut self, first: DataLine, second: DataLine) {
        self.stats.noise_edges += 1;
        if first == second {
            return;
        }
        if self.last_appended
            && let Some(frame) = self.frame.as_mut()
        {
            frame.pop();
            self.stats.noise_edges += 1;
        }
        self.last_appended = false;
        debug!("Discarded simultaneous edges on both data lines");
    }

    fn expire(&mut self, now: Timestamp) {
        let Some(frame) = &self.frame else {
            return;
        };
        if now.saturating_duration_since(frame.last_bit_at()) >= self.config.inter_bit_timeout() {
            self.close(now);
        } else if now.saturating_duration_since(frame.started_at()) >= self.config.max_frame() {
            self.abandon(now);
        }
    }

    fn close(&mut self, now: Timestamp) {
        let Some(frame) = self.frame.take() else {
            return;
        };
        self.last_edge = None;
        self.last_appended = false;
        if frame.is_empty() {
            return;
        }

        let bits = frame.len();
        let result = self
            .config
            .formats
            .iter()
            .copied()
            .find(|f| f.bit_length() == bits)
            .ok_or(DecodeError::UnsupportedLength { bits })
            .and_then(|format| {
                format.decode(frame.raw()).map(|id| CredentialRead {
                    id,
                    format,
                    completed_at: now,
                })
            });

        match &result {
            Ok(read) => {
                self.stats.frames_decoded += 1;
                debug!(id = %read.id, format = %read.format, "Decoded Wiegand frame");
            }
            Err(e) => {
                self.stats.decode_errors += 1;
                warn!(bits, "Rejected Wiegand frame: {}", e);
            }
        }
        self.ready.push_back(result);
    }

    fn abandon(&mut self, now: Timestamp) {
        let Some(frame) = self.frame.take() else {
            return;
        };
        self.last_edge = None;
        self.last_appended = false;

        let elapsed_ms =
            u64::try_from(now.saturating_duration_since(frame.started_at()).as_millis())
                .unwrap_or(u64::MAX);
        let error = DecodeError::FrameTimeout {
            bits: frame.len(),
            elapsed_ms,
        };
        warn!("{}", error);
        self.stats.decode_errors += 1;
        self.ready.push_back(Err(error));
    }
}
