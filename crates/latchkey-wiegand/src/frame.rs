//! Bit accumulator for a frame in progress.

use latchkey_core::Timestamp;

/// Bits received since the first edge of a frame.
///
/// Bits are shifted in most significant first, so after `len` bits the low
/// `len` bits of [`raw`](Self::raw) are the frame in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WiegandFrame {
    raw: u64,
    len: usize,
    capacity: usize,
    started_at: Timestamp,
    last_bit_at: Timestamp,
}

impl WiegandFrame {
    /// Open a frame at its first edge.
    ///
    /// `capacity` is clamped to 64 bits.
    #[must_use]
    pub fn open(at: Timestamp, capacity: usize) -> Self {
        Self {
            raw: 0,
            len: 0,
            capacity: capacity.min(64),
            started_at: at,
            last_bit_at: at,
        }
    }

    /// Append a bit. Returns `false` if the frame is already full, in which
    /// case the bit is dropped and the idle timer is not refreshed.
    pub fn push(&mut self, bit: bool, at: Timestamp) -> bool {
        if self.len >= self.capacity {
            return false;
        }
        self.raw = (self.raw << 1) | u64::from(bit);
        self.len += 1;
        self.last_bit_at = at;
        true
    }

    /// Remove the most recent bit, if any.
    pub fn pop(&mut self) -> Option<bool> {
        if self.len == 0 {
            return None;
        }
        let bit = self.raw & 1 == 1;
        self.raw >>= 1;
        self.len -= 1;
        Some(bit)
    }

    #[must_use]
    pub fn raw(&self) -> u64 {
        self.raw
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[must_use]
    pub fn is_full(&self) -> bool {
        self.len >= self.capacity
    }

    #[must_use]
    pub fn started_at(&self) -> Timestamp {
        self.started_at
    }

    #[must_use]
    pub fn last_bit_at(&self) -> Timestamp {
        self.last_bit_at
    }
}
