//! Core constants for the latchkey barrier controller.
//!
//! Defaults here mirror the firmware this controller replaces: a reader on
//! two Wiegand data lines, a barrier that stays open ten seconds after a
//! grant, five more seconds after a button is released, and never more than
//! thirty seconds in total.
//!
//! # Timer Semantics
//!
//! ```text
//! grant ──┬── initial timer (A) ──────────────► lock, unless a button was used
//!         │
//!         │      press ── hold ── release ── button timer (B) ──► lock
//!         │
//!         └── sanity timer (C) ──────────────────────────────────► lock, always
//! ```
//!
//! Every value can be overridden by the configuration file; the constants are
//! only the values used when a field is absent.

// ============================================================================
// Barrier Timers
// ============================================================================

/// How long the barrier stays unlocked after a grant if no button is pressed
/// (milliseconds).
///
/// # Value: 10000ms (10 seconds)
pub const DEFAULT_INITIAL_TIMER_MS: u64 = 10_000;

/// How much longer the barrier stays unlocked after a button is released
/// (milliseconds).
///
/// # Value: 5000ms (5 seconds)
pub const DEFAULT_BUTTON_TIMER_MS: u64 = 5_000;

/// Hard ceiling on a single unlock cycle, regardless of button activity
/// (milliseconds).
///
/// The sanity deadline is fixed when the barrier unlocks and is never
/// extended.
///
/// # Value: 30000ms (30 seconds)
pub const DEFAULT_SANITY_TIMER_MS: u64 = 30_000;

/// How long transient indicator states (granted, denied, fault) are shown
/// before the indicator returns to its base state (milliseconds).
///
/// # Value: 1000ms (1 second)
pub const DEFAULT_FEEDBACK_MS: u64 = 1_000;

/// Control loop period (milliseconds).
///
/// Must be shorter than [`DEFAULT_INTER_BIT_TIMEOUT_MS`] so a finished frame
/// is noticed within one bit gap.
///
/// # Value: 10ms
pub const DEFAULT_TICK_MS: u64 = 10;

// ============================================================================
// Wiegand Framing
// ============================================================================

/// Idle time on both data lines after which an open frame is closed
/// (milliseconds).
///
/// Readers pulse a bit roughly every 2ms, so 25ms of silence reliably marks
/// the end of a transmission.
///
/// # Value: 25ms
pub const DEFAULT_INTER_BIT_TIMEOUT_MS: u64 = 25;

/// Longest a single frame may stay open before it is abandoned
/// (milliseconds).
///
/// A 34-bit frame takes well under 100ms on the wire; anything still open
/// after this is a chattering or stuck line.
///
/// # Value: 250ms
pub const DEFAULT_MAX_FRAME_MS: u64 = 250;

/// Default GPIO for the DATA0 line.
pub const DEFAULT_D0_PIN: u8 = 12;

/// Default GPIO for the DATA1 line.
pub const DEFAULT_D1_PIN: u8 = 13;

/// Capacity of the interrupt-to-main-loop edge queue.
///
/// Holds a little over seven 34-bit frames, so one slow tick never loses a
/// transmission.
///
/// # Value: 256 edges
pub const EDGE_QUEUE_CAPACITY: usize = 256;

// ============================================================================
// Hardware Inputs
// ============================================================================

/// Time an input level must be stable before a change is accepted
/// (milliseconds).
///
/// # Value: 30ms
pub const DEFAULT_DEBOUNCE_MS: u64 = 30;

/// Half-period of the fault blink pattern (milliseconds).
///
/// # Value: 250ms (2 Hz blink)
pub const FAULT_BLINK_HALF_PERIOD_MS: u64 = 250;

// ============================================================================
// Storage
// ============================================================================

/// Default data directory for the credential store and the event log.
pub const DEFAULT_DATA_DIR: &str = "/var/lib/latchkey";

/// Canonical credential snapshot file name.
pub const DEFAULT_CREDENTIALS_FILE: &str = "cards.dat";

/// Staging file the next credential snapshot is written to before it
/// replaces the canonical file.
pub const DEFAULT_STAGING_FILE: &str = "cards.tmp";

/// Append-only audit log file name.
pub const DEFAULT_LOG_FILE: &str = "log.dat";

/// Suffix appended to a credential file found corrupt at startup when it is
/// moved aside.
pub const CORRUPT_SUFFIX: &str = ".corrupt";

// ============================================================================
// Credentials
// ============================================================================

/// Maximum label length in bytes after trimming.
///
/// # Value: 64 bytes
pub const MAX_LABEL_LENGTH: usize = 64;

/// Minimum number of hex digits used when displaying a credential id.
///
/// Six digits covers the 24-bit identifier of the common 26-bit format.
pub const CREDENTIAL_DISPLAY_DIGITS: usize = 6;
