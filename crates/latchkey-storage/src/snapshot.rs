//! Binary credential snapshot format.
//!
//! All integers little-endian:
//!
//! ```text
//! ┌──────────┬─────────────┬─────────────┬─────────────────────┬──────────┐
//! │ "LKCS"   │ version u16 │ count u32   │ record × count      │ CRC-32   │
//! │ 4 bytes  │ (= 1)       │             │                     │ u32      │
//! └──────────┴─────────────┴─────────────┴─────────────────────┴──────────┘
//!
//! record: id u32 │ flags u8 (bit 0 = enabled) │ label_len u8 │ label bytes
//! ```
//!
//! The CRC covers every byte before it. A snapshot is either valid as a
//! whole or rejected as a whole.

use bytes::{Buf, BufMut, Bytes, BytesMut};
use latchkey_core::constants::MAX_LABEL_LENGTH;
use latchkey_core::{Credential, CredentialId};
use std::collections::BTreeSet;
use thiserror::Error;

/// File magic.
pub const MAGIC: [u8; 4] = *b"LKCS";

/// Current format version.
pub const VERSION: u16 = 1;

const FLAG_ENABLED: u8 = 0x01;
const HEADER_LEN: usize = 4 + 2 + 4;
const CRC_LEN: usize = 4;

/// Why a snapshot failed validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SnapshotError {
    #[error("truncated snapshot ({0})")]
    Truncated(&'static str),

    #[error("bad magic {0:02X?}")]
    BadMagic([u8; 4]),

    #[error("unsupported version {0}")]
    UnsupportedVersion(u16),

    #[error("checksum mismatch: stored {stored:#010x}, computed {computed:#010x}")]
    ChecksumMismatch { stored: u32, computed: u32 },

    #[error("{0} trailing bytes after last record")]
    TrailingBytes(usize),

    #[error("credential {id} has unknown flags {flags:#04x}")]
    UnknownFlags { id: CredentialId, flags: u8 },

    #[error("credential {id} has an invalid label")]
    InvalidLabel { id: CredentialId },

    #[error("duplicate credential {0}")]
    DuplicateId(CredentialId),
}

/// Serialize credentials, in iteration order.
#[must_use]
pub fn encode<'a>(credentials: impl ExactSizeIterator<Item = &'a Credential>) -> Bytes {
    let count = credentials.len();
    let mut buf = BytesMut::with_capacity(HEADER_LEN + count * 8 + CRC_LEN);
    buf.put_slice(&MAGIC);
    buf.put_u16_le(VERSION);
    buf.put_u32_le(u32::try_from(count).unwrap_or(u32::MAX));

    for credential in credentials {
        let label = credential.label().unwrap_or_default().as_bytes();
        // Labels are capped at MAX_LABEL_LENGTH when constructed.
        let label = &label[..label.len().min(MAX_LABEL_LENGTH)];

        buf.put_u32_le(credential.id().as_u32());
        buf.put_u8(if credential.is_enabled() { FLAG_ENABLED } else { 0 });
        buf.put_u8(label.len() as u8);
        buf.put_slice(label);
    }

    let crc = crc32fast::hash(&buf);
    buf.put_u32_le(crc);
    buf.freeze()
}

/// Parse and fully validate a snapshot.
///
/// # Errors
///
/// Returns the first structural problem found.
pub fn decode(data: &[u8]) -> Result<Vec<Credential>, SnapshotError> {
    if data.len() < HEADER_LEN + CRC_LEN {
        return Err(SnapshotError::Truncated("header"));
    }
    let mut magic = [0u8; 4];
    magic.copy_from_slice(&data[..4]);
    if magic != MAGIC {
        return Err(SnapshotError::BadMagic(magic));
    }

    let (body, mut trailer) = data.split_at(data.len() - CRC_LEN);
    let stored = trailer.get_u32_le();
    let computed = crc32fast::hash(body);
    if stored != computed {
        return Err(SnapshotError::ChecksumMismatch { stored, computed });
    }

    let mut buf = &body[4..];
    let version = buf.get_u16_le();
    if version != VERSION {
        return Err(SnapshotError::UnsupportedVersion(version));
    }
    let count = buf.get_u32_le() as usize;

    let mut seen = BTreeSet::new();
    let mut credentials = Vec::with_capacity(count.min(buf.remaining() / 6));
    for _ in 0..count {
        if buf.remaining() < 6 {
            return Err(SnapshotError::Truncated("record header"));
        }
        let id = CredentialId::new(buf.get_u32_le());
        let flags = buf.get_u8();
        let label_len = usize::from(buf.get_u8());
        if buf.remaining() < label_len {
            return Err(SnapshotError::Truncated("label"));
        }
        if flags & !FLAG_ENABLED != 0 {
            return Err(SnapshotError::UnknownFlags { id, flags });
        }
        if !seen.insert(id) {
            return Err(SnapshotError::DuplicateId(id));
        }

        let label = std::str::from_utf8(&buf[..label_len])
            .map_err(|_| SnapshotError::InvalidLabel { id })?;
        let credential = Credential::new(id)
            .with_label(label)
            .map_err(|_| SnapshotError::InvalidLabel { id })?
            .with_enabled(flags & FLAG_ENABLED != 0);
        buf.advance(label_len);
        credentials.push(credential);
    }

    if buf.has_remaining() {
        return Err(SnapshotError::TrailingBytes(buf.remaining()));
    }
    Ok(credentials)
}
