//! Decode errors.
//!
//! Every variant means "this transmission is not a credential". The
//! controller treats all of them as a denial.

use crate::format::WiegandFormat;
use std::fmt;

/// Result type alias for frame decoding.
pub type Result<T> = std::result::Result<T, DecodeError>;

/// Which parity bit failed its check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParityHalf {
    /// Leading even-parity bit over the first half of the data.
    Leading,
    /// Trailing odd-parity bit over the second half of the data.
    Trailing,
}

impl fmt::Display for ParityHalf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParityHalf::Leading => write!(f, "leading even"),
            ParityHalf::Trailing => write!(f, "trailing odd"),
        }
    }
}

/// Errors produced when a closed frame is not a valid credential.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    /// Frame length matches no enabled format (short, long or garbled).
    #[error("Unsupported frame length: {bits} bits")]
    UnsupportedLength { bits: usize },

    /// Frame has the right length but a parity bit does not match its data.
    #[error("Parity check failed: {half} parity of {format} frame")]
    Parity {
        format: WiegandFormat,
        half: ParityHalf,
    },

    /// Frame stayed open past the maximum frame duration and was abandoned.
    #[error("Frame abandoned after {elapsed_ms}ms with {bits} bits")]
    FrameTimeout { bits: usize, elapsed_ms: u64 },

    /// Identifier does not fit the data width of the format.
    #[error("Credential {id:#X} does not fit in {format}")]
    IdentifierTooWide { id: u32, format: WiegandFormat },
}
