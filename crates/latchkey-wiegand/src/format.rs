//! Wiegand frame formats and their parity rules.

use crate::edge::DataLine;
use crate::error::{DecodeError, ParityHalf, Result};
use latchkey_core::CredentialId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A supported Wiegand frame layout.
///
/// Every format is `P | data | P`: a leading parity bit making the first
/// half of the data even, the data bits most significant first, and a
/// trailing parity bit making the second half of the data odd.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WiegandFormat {
    /// 26-bit frame, 24 data bits (facility code and card number).
    Wiegand26,
    /// 34-bit frame, 32 data bits.
    Wiegand34,
}

impl WiegandFormat {
    /// All formats, shortest first.
    pub const ALL: [WiegandFormat; 2] = [WiegandFormat::Wiegand26, WiegandFormat::Wiegand34];

    /// Total frame length in bits, parity included.
    #[must_use]
    pub const fn bit_length(self) -> usize {
        match self {
            WiegandFormat::Wiegand26 => 26,
            WiegandFormat::Wiegand34 => 34,
        }
    }

    /// Number of data bits between the two parity bits.
    #[must_use]
    pub const fn data_bits(self) -> usize {
        self.bit_length() - 2
    }

    /// Look a format up by frame length.
    #[must_use]
    pub fn from_bit_length(bits: usize) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.bit_length() == bits)
    }

    /// Validate parity on a raw frame and extract the identifier.
    ///
    /// `raw` holds the frame bits right-aligned, first received bit most
    /// significant. Only the low [`bit_length`](Self::bit_length) bits are
    /// looked at.
    ///
    /// # Errors
    /// Returns `DecodeError::Parity` naming the half whose parity failed.
    /// The leading bit is checked first.
    pub fn decode(self, raw: u64) -> Result<CredentialId> {
        let len = self.bit_length();
        let data = (raw >> 1) & mask(self.data_bits());
        let (upper, lower) = self.split(data);

        let leading = (raw >> (len - 1)) & 1;
        let trailing = raw & 1;

        if (leading + u64::from(upper.count_ones())) % 2 != 0 {
            return Err(DecodeError::Parity {
                format: self,
                half: ParityHalf::Leading,
            });
        }
        if (trailing + u64::from(lower.count_ones())) % 2 != 1 {
            return Err(DecodeError::Parity {
                format: self,
                half: ParityHalf::Trailing,
            });
        }

        // data_bits() is at most 32, so the mask keeps this in range.
        Ok(CredentialId::new(data as u32))
    }

    /// Build the raw frame for an identifier, parity bits included.
    ///
    /// # Errors
    /// Returns `DecodeError::IdentifierTooWide` if `id` has bits set above
    /// the format's data width.
    pub fn encode_raw(self, id: CredentialId) -> Result<u64> {
        let data = u64::from(id.as_u32());
        if data & !mask(self.data_bits()) != 0 {
            return Err(DecodeError::IdentifierTooWide {
                id: id.as_u32(),
                format: self,
            });
        }
        let (upper, lower) = self.split(data);
        let leading = u64::from(upper.count_ones() % 2);
        let trailing = u64::from(1 - lower.count_ones() % 2);
        Ok((leading << (self.bit_length() - 1)) | (data << 1) | trailing)
    }

    /// Encode an identifier as the sequence of line pulses a reader would
    /// send, or `None` if it does not fit.
    #[must_use]
    pub fn encode(self, id: CredentialId) -> Option<Vec<DataLine>> {
        let raw = self.encode_raw(id).ok()?;
        let len = self.bit_length();
        Some(
            (0..len)
                .rev()
                .map(|shift| DataLine::for_bit((raw >> shift) & 1 == 1))
                .collect(),
        )
    }

    fn split(self, data: u64) -> (u64, u64) {
        let half = self.data_bits() / 2;
        (data >> half, data & mask(half))
    }
}

impl fmt::Display for WiegandFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WiegandFormat::Wiegand26 => write!(f, "wiegand26"),
            WiegandFormat::Wiegand34 => write!(f, "wiegand34"),
        }
    }
}

#[inline]
const fn mask(bits: usize) -> u64 {
    if bits >= 64 { u64::MAX } else { (1u64 << bits) - 1 }
}
