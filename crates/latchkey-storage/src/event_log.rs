//! Append-only audit log.
//!
//! One JSON object per line, synced per append. The file is only ever
//! appended to, so a power cut can at worst leave a torn final line. Torn
//! or otherwise unparsable lines are skipped on read, and the next append
//! starts on a fresh line.

use crate::backend::StorageBackend;
use crate::error::{StorageError, StorageResult};
use latchkey_core::{CredentialId, Timestamp};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, warn};

/// Kind tag of an audit entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EventKind {
    Granted,
    Denied,
    UnknownCredential,
    DecodeError,
    DoorOpened,
    DoorClosed,
    Emergency,
    TimeoutLock,
    ShutdownLock,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EventKind::Granted => "granted",
            EventKind::Denied => "denied",
            EventKind::UnknownCredential => "unknown-credential",
            EventKind::DecodeError => "decode-error",
            EventKind::DoorOpened => "door-opened",
            EventKind::DoorClosed => "door-closed",
            EventKind::Emergency => "emergency",
            EventKind::TimeoutLock => "timeout-lock",
            EventKind::ShutdownLock => "shutdown-lock",
        };
        f.write_str(name)
    }
}

/// Which barrier timer expired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerKind {
    Initial,
    Button,
    Sanity,
}

impl fmt::Display for TimerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimerKind::Initial => write!(f, "initial"),
            TimerKind::Button => write!(f, "button"),
            TimerKind::Sanity => write!(f, "sanity"),
        }
    }
}

/// Something worth recording, with the data each kind carries.
///
/// Building entries from this enum keeps the credential and timer fields
/// consistent with the kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditEvent {
    /// Known, enabled credential.
    Granted(CredentialId),
    /// Known but disabled credential.
    Denied(CredentialId),
    UnknownCredential(CredentialId),
    /// Malformed frame. Never carries an identifier.
    DecodeError,
    DoorOpened,
    DoorClosed,
    Emergency,
    TimeoutLock(TimerKind),
    ShutdownLock,
}

impl AuditEvent {
    #[must_use]
    pub fn kind(&self) -> EventKind {
        match self {
            AuditEvent::Granted(_) => EventKind::Granted,
            AuditEvent::Denied(_) => EventKind::Denied,
            AuditEvent::UnknownCredential(_) => EventKind::UnknownCredential,
            AuditEvent::DecodeError => EventKind::DecodeError,
            AuditEvent::DoorOpened => EventKind::DoorOpened,
            AuditEvent::DoorClosed => EventKind::DoorClosed,
            AuditEvent::Emergency => EventKind::Emergency,
            AuditEvent::TimeoutLock(_) => EventKind::TimeoutLock,
            AuditEvent::ShutdownLock => EventKind::ShutdownLock,
        }
    }

    #[must_use]
    pub fn credential(&self) -> Option<CredentialId> {
        match self {
            AuditEvent::Granted(id)
            | AuditEvent::Denied(id)
            | AuditEvent::UnknownCredential(id) => Some(*id),
            _ => None,
        }
    }

    #[must_use]
    pub fn timer(&self) -> Option<TimerKind> {
        match self {
            AuditEvent::TimeoutLock(timer) => Some(*timer),
            _ => None,
        }
    }
}

/// One line of the audit log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub seq: u64,
    pub kind: EventKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credential: Option<CredentialId>,
    /// Monotonic milliseconds since controller start.
    pub uptime_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timer: Option<TimerKind>,
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#{:<6} {:>10}ms  {}",
            self.seq, self.uptime_ms, self.kind
        )?;
        if let Some(id) = self.credential {
            write!(f, " {id}")?;
        }
        if let Some(timer) = self.timer {
            write!(f, " ({timer} timer)")?;
        }
        Ok(())
    }
}

/// Durable, append-only audit trail.
#[derive(Debug)]
pub struct EventLog<B> {
    backend: B,
    name: String,
    next_seq: u64,
    /// The file does not end in a newline (torn tail or failed append).
    needs_newline: bool,
}

impl<B: StorageBackend> EventLog<B> {
    /// Open the log at `name`, continuing the sequence after the last
    /// readable entry.
    ///
    /// # Errors
    ///
    /// `Io` if the backend cannot be read.
    pub fn open(backend: B, name: impl Into<String>) -> StorageResult<Self> {
        let name = name.into();
        let bytes = backend.read(&name)?.unwrap_or_default();
        let entries = parse_entries(&bytes, &backend.location(&name));
        let next_seq = entries.last().map_or(1, |entry| entry.seq + 1);
        let needs_newline = bytes.last().is_some_and(|b| *b != b'\n');

        debug!(
            path = %backend.location(&name),
            entries = entries.len(),
            next_seq,
            "Event log opened"
        );
        Ok(Self {
            backend,
            name,
            next_seq,
            needs_newline,
        })
    }

    /// Append an entry and sync it.
    ///
    /// Returns the entry's sequence number. A failed append still consumes
    /// its sequence number, since the line may have reached the file.
    ///
    /// # Errors
    ///
    /// `LogWriteFailed` if the entry could not be made durable.
    pub fn append(&mut self, event: AuditEvent, at: Timestamp) -> StorageResult<u64> {
        let entry = LogEntry {
            seq: self.next_seq,
            kind: event.kind(),
            credential: event.credential(),
            uptime_ms: at.as_millis(),
            timer: event.timer(),
        };
        self.next_seq += 1;

        let mut line = Vec::with_capacity(96);
        if self.needs_newline {
            line.push(b'\n');
        }
        serde_json::to_writer(&mut line, &entry)?;
        line.push(b'\n');

        if let Err(source) = self.backend.append_synced(&self.name, &line) {
            // Part of the line may have landed.
            self.needs_newline = true;
            let path = self.backend.location(&self.name);
            warn!(%path, kind = %entry.kind, "Event log append failed: {}", source);
            return Err(StorageError::LogWriteFailed { path, source });
        }

        self.needs_newline = false;
        Ok(entry.seq)
    }

    /// Every readable entry, oldest first.
    ///
    /// # Errors
    ///
    /// `Io` if the backend cannot be read.
    pub fn read_all(&self) -> StorageResult<Vec<LogEntry>> {
        let bytes = self.backend.read(&self.name)?.unwrap_or_default();
        Ok(parse_entries(&bytes, &self.backend.location(&self.name)))
    }

    /// The last `n` readable entries, oldest first.
    ///
    /// # Errors
    ///
    /// `Io` if the backend cannot be read.
    pub fn tail(&self, n: usize) -> StorageResult<Vec<LogEntry>> {
        let mut entries = self.read_all()?;
        let skip = entries.len().saturating_sub(n);
        entries.drain(..skip);
        Ok(entries)
    }

    /// Sequence number the next append will use.
    #[must_use]
    pub fn next_seq(&self) -> u64 {
        self.next_seq
    }
}

fn parse_entries(bytes: &[u8], path: &str) -> Vec<LogEntry> {
    let mut entries: Vec<LogEntry> = Vec::new();
    for (index, line) in bytes.split(|b| *b == b'\n').enumerate() {
        if line.iter().all(u8::is_ascii_whitespace) {
            continue;
        }
        match serde_json::from_slice::<LogEntry>(line) {
            Ok(entry) if entries.last().is_none_or(|last| entry.seq > last.seq) => {
                entries.push(entry);
            }
            Ok(entry) => {
                warn!(path, line = index + 1, seq = entry.seq, "Skipping out-of-order log entry");
            }
            Err(e) => {
                warn!(path, line = index + 1, "Skipping unreadable log line: {}", e);
            }
        }
    }
    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryStorage;

    const LOG: &str = "log.dat";

    fn open(storage: &MemoryStorage) -> EventLog<MemoryStorage> {
        EventLog::open(storage.clone(), LOG).unwrap()
    }

    #[test]
    fn test_append_assigns_increasing_sequence() {
        let storage = MemoryStorage::new();
        let mut log = open(&storage);
        let id = CredentialId::new(0xABCDE1);

        assert_eq!(log.append(AuditEvent::Granted(id), Timestamp::from_millis(5)).unwrap(), 1);
        assert_eq!(log.append(AuditEvent::DecodeError, Timestamp::from_millis(9)).unwrap(), 2);

        let entries = log.read_all().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].kind, EventKind::Granted);
        assert_eq!(entries[0].credential, Some(id));
        assert_eq!(entries[0].uptime_ms, 5);
        assert_eq!(entries[1].kind, EventKind::DecodeError);
        assert_eq!(entries[1].credential, None);
    }

    #[test]
    fn test_line_format() {
        let storage = MemoryStorage::new();
        let mut log = open(&storage);
        log.append(
            AuditEvent::TimeoutLock(TimerKind::Sanity),
            Timestamp::from_millis(30_000),
        )
        .unwrap();

        let text = String::from_utf8(storage.contents(LOG).unwrap()).unwrap();
        assert_eq!(
            text,
            "{\"seq\":1,\"kind\":\"timeout-lock\",\"uptime_ms\":30000,\"timer\":\"sanity\"}\n"
        );
    }

    #[test]
    fn test_sequence_continues_after_reopen() {
        let storage = MemoryStorage::new();
        let mut log = open(&storage);
        log.append(AuditEvent::DoorOpened, Timestamp::ZERO).unwrap();
        log.append(AuditEvent::DoorClosed, Timestamp::ZERO).unwrap();

        let mut reopened = open(&storage);
        assert_eq!(reopened.next_seq(), 3);
        assert_eq!(reopened.append(AuditEvent::Emergency, Timestamp::ZERO).unwrap(), 3);
    }

    #[test]
    fn test_torn_tail_is_skipped_and_next_append_starts_fresh_line() {
        let storage = MemoryStorage::new();
        let mut log = open(&storage);
        log.append(AuditEvent::DoorOpened, Timestamp::ZERO).unwrap();

        storage.tear_next_write(10);
        assert!(matches!(
            log.append(AuditEvent::DoorClosed, Timestamp::ZERO),
            Err(StorageError::LogWriteFailed { .. })
        ));

        // Reboot.
        let mut log = open(&storage);
        assert_eq!(log.next_seq(), 2);
        log.append(AuditEvent::ShutdownLock, Timestamp::ZERO).unwrap();

        let kinds: Vec<_> = log.read_all().unwrap().iter().map(|e| e.kind).collect();
        assert_eq!(kinds, vec![EventKind::DoorOpened, EventKind::ShutdownLock]);
    }

    #[test]
    fn test_failed_append_consumes_sequence() {
        let storage = MemoryStorage::new();
        let mut log = open(&storage);
        storage.fail_next_append();
        assert!(log.append(AuditEvent::DoorOpened, Timestamp::ZERO).is_err());
        assert_eq!(log.append(AuditEvent::DoorOpened, Timestamp::ZERO).unwrap(), 2);
        assert_eq!(log.read_all().unwrap().len(), 1);
    }

    #[test]
    fn test_landed_append_failure_keeps_later_entries() {
        let storage = MemoryStorage::new();
        let mut log = open(&storage);
        log.append(AuditEvent::DoorOpened, Timestamp::from_millis(1)).unwrap();

        storage.fail_after_next_append();
        assert!(log.append(AuditEvent::DoorClosed, Timestamp::from_millis(2)).is_err());
        assert_eq!(log.append(AuditEvent::Emergency, Timestamp::from_millis(3)).unwrap(), 3);

        let entries = log.read_all().unwrap();
        let seqs: Vec<_> = entries.iter().map(|e| e.seq).collect();
        assert_eq!(seqs, vec![1, 2, 3]);
        assert_eq!(entries[2].kind, EventKind::Emergency);
        assert_eq!(open(&storage).next_seq(), 4);
    }

    #[test]
    fn test_tail_returns_last_entries_in_order() {
        let storage = MemoryStorage::new();
        let mut log = open(&storage);
        for ms in 0..5 {
            log.append(AuditEvent::DoorOpened, Timestamp::from_millis(ms)).unwrap();
        }
        let seqs: Vec<_> = log.tail(2).unwrap().iter().map(|e| e.seq).collect();
        assert_eq!(seqs, vec![4, 5]);
        assert_eq!(log.tail(10).unwrap().len(), 5);
    }

    #[test]
    fn test_garbage_lines_are_skipped() {
        let storage = MemoryStorage::new();
        storage.insert(
            LOG,
            "{\"seq\":1,\"kind\":\"granted\",\"credential\":5,\"uptime_ms\":1}\nnot json\n\n",
        );
        let log = open(&storage);
        assert_eq!(log.read_all().unwrap().len(), 1);
        assert_eq!(log.next_seq(), 2);
    }

    #[test]
    fn test_entry_display() {
        let entry = LogEntry {
            seq: 7,
            kind: EventKind::Granted,
            credential: Some(CredentialId::new(0xABCDE1)),
            uptime_ms: 1500,
            timer: None,
        };
        assert_eq!(entry.to_string(), "#7            1500ms  granted 0xABCDE1");
    }
}
