//! Lock-free edge handoff from interrupt context to the main loop.
//!
//! A fixed-capacity single-producer/single-consumer ring. The producer is
//! whatever stamps line edges (an interrupt handler on hardware, a
//! simulator thread in tests); the consumer is the control loop. Neither
//! side ever blocks or allocates after [`channel`] returns.
//!
//! Each slot is one `AtomicU64`: the line in bit 63, the timestamp in
//! microseconds in the low 63 bits. Head and tail are free-running
//! counters, so `N` must be a power of two.
//!
//! # Examples
//!
//! ```
//! use latchkey_core::Timestamp;
//! use latchkey_wiegand::{DataLine, Edge, channel};
//!
//! let (mut tx, mut rx) = channel::<8>();
//! assert!(tx.push(Edge::new(DataLine::D1, Timestamp::from_micros(40))));
//!
//! let edge = rx.pop().unwrap();
//! assert_eq!(edge.line, DataLine::D1);
//! assert!(rx.pop().is_none());
//! ```

use crate::edge::{DataLine, Edge};
use latchkey_core::Timestamp;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, AtomicU64, AtomicUsize, Ordering};

const LINE_BIT: u64 = 1 << 63;
const MICROS_MASK: u64 = LINE_BIT - 1;

struct Shared<const N: usize> {
    slots: [AtomicU64; N],
    /// Next slot to read. Written only by the receiver.
    head: AtomicUsize,
    /// Next slot to write. Written only by the sender.
    tail: AtomicUsize,
    overflows: AtomicU32,
}

/// Create a connected sender/receiver pair with capacity `N`.
///
/// `N` must be a power of two; anything else is rejected at compile time.
#[must_use]
pub fn channel<const N: usize>() -> (EdgeSender<N>, EdgeReceiver<N>) {
    const { assert!(N.is_power_of_two(), "edge queue capacity must be a power of two") };

    let shared = Arc::new(Shared {
        slots: std::array::from_fn(|_| AtomicU64::new(0)),
        head: AtomicUsize::new(0),
        tail: AtomicUsize::new(0),
        overflows: AtomicU32::new(0),
    });
    (
        EdgeSender {
            shared: Arc::clone(&shared),
        },
        EdgeReceiver { shared },
    )
}

/// Producer half. Not `Clone`: there is exactly one producer.
pub struct EdgeSender<const N: usize> {
    shared: Arc<Shared<N>>,
}

impl<const N: usize> EdgeSender<N> {
    /// Enqueue an edge. Never blocks.
    ///
    /// Returns `false` and counts an overflow if the ring is full; the edge
    /// is lost and the frame it belonged to will fail validation.
    pub fn push(&mut self, edge: Edge) -> bool {
        let tail = self.shared.tail.load(Ordering::Relaxed);
        let head = self.shared.head.load(Ordering::Acquire);
        if tail.wrapping_sub(head) >= N {
            self.shared.overflows.fetch_add(1, Ordering::Relaxed);
            return false;
        }
        self.shared.slots[tail % N].store(pack(edge), Ordering::Relaxed);
        self.shared.tail.store(tail.wrapping_add(1), Ordering::Release);
        true
    }

    /// Edges dropped because the ring was full.
    #[must_use]
    pub fn overflows(&self) -> u32 {
        self.shared.overflows.load(Ordering::Relaxed)
    }
}

/// Consumer half, owned by the control loop.
pub struct EdgeReceiver<const N: usize> {
    shared: Arc<Shared<N>>,
}

impl<const N: usize> EdgeReceiver<N> {
    /// Dequeue the oldest edge, if any.
    pub fn pop(&mut self) -> Option<Edge> {
        let head = self.shared.head.load(Ordering::Relaxed);
        let tail = self.shared.tail.load(Ordering::Acquire);
        if head == tail {
            return None;
        }
        let packed = self.shared.slots[head % N].load(Ordering::Relaxed);
        self.shared.head.store(head.wrapping_add(1), Ordering::Release);
        Some(unpack(packed))
    }

    /// Iterate over everything enqueued so far, oldest first.
    pub fn drain(&mut self) -> impl Iterator<Item = Edge> + '_ {
        std::iter::from_fn(move || self.pop())
    }

    /// Number of edges waiting.
    #[must_use]
    pub fn len(&self) -> usize {
        let head = self.shared.head.load(Ordering::Relaxed);
        let tail = self.shared.tail.load(Ordering::Acquire);
        tail.wrapping_sub(head)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Edges the sender had to drop because the ring was full.
    #[must_use]
    pub fn overflows(&self) -> u32 {
        self.shared.overflows.load(Ordering::Relaxed)
    }
}

impl<const N: usize> fmt::Debug for EdgeSender<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EdgeSender")
            .field("capacity", &N)
            .field("overflows", &self.overflows())
            .finish()
    }
}

impl<const N: usize> fmt::Debug for EdgeReceiver<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EdgeReceiver")
            .field("capacity", &N)
            .field("pending", &self.len())
            .field("overflows", &self.overflows())
            .finish()
    }
}

#[inline]
fn pack(edge: Edge) -> u64 {
    let line = if edge.line.bit() { LINE_BIT } else { 0 };
    line | (edge.at.as_micros() & MICROS_MASK)
}

#[inline]
fn unpack(packed: u64) -> Edge {
    Edge::new(
        DataLine::for_bit(packed & LINE_BIT != 0),
        Timestamp::from_micros(packed & MICROS_MASK),
    )
}
