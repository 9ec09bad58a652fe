//! Core types shared by every latchkey crate.
//!
//! This crate holds the vocabulary the rest of the workspace speaks:
//! credential identifiers and records, the monotonic [`Timestamp`] used by
//! every timer, the root [`Error`] type, and protocol and policy constants.
//!
//! Nothing in here touches hardware or storage; it is a leaf crate.

pub mod constants;
pub mod error;
pub mod time;
pub mod types;

pub use error::{Error, Result};
pub use time::{Clock, ManualClock, MonotonicClock, Timestamp};
pub use types::*;

/// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
