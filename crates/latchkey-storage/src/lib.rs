//! Persistence for the latchkey controller.
//!
//! Two things are stored, both through a [`StorageBackend`]:
//!
//! - the credential allow-list ([`CredentialStore`]), rewritten as a whole
//!   binary [`snapshot`] on every change using a staging file and an atomic
//!   rename, so the canonical file is always a complete snapshot;
//! - the audit trail ([`EventLog`]), an append-only JSON Lines file synced
//!   per entry.
//!
//! # Examples
//!
//! ```
//! use latchkey_core::{Credential, CredentialId};
//! use latchkey_storage::{CredentialStore, MemoryStorage};
//!
//! let storage = MemoryStorage::new();
//! let mut store = CredentialStore::load(storage.clone(), "cards.dat", "cards.tmp")?;
//! store.upsert(Credential::new(CredentialId::new(0xABCDE1)))?;
//!
//! // A fresh load sees the persisted set.
//! let reloaded = CredentialStore::load(storage, "cards.dat", "cards.tmp")?;
//! assert!(reloaded.is_authorized(CredentialId::new(0xABCDE1)));
//! # Ok::<(), latchkey_storage::StorageError>(())
//! ```

pub mod backend;
pub mod config;
pub mod credential_store;
pub mod error;
pub mod event_log;
pub mod snapshot;

pub use backend::{FsStorage, MemoryStorage, StorageBackend};
pub use config::StorageConfig;
pub use credential_store::CredentialStore;
pub use error::{PersistStage, StorageError, StorageResult};
pub use event_log::{AuditEvent, EventKind, EventLog, LogEntry, TimerKind};
pub use snapshot::SnapshotError;
