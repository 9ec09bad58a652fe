//! Crash-safe credential allow-list.
//!
//! The whole set lives in memory and is rewritten on every mutation:
//!
//! 1. serialize the full set to the staging location,
//! 2. sync the staging location,
//! 3. atomically rename staging over canonical.
//!
//! A crash before step 3 leaves the canonical file untouched; a crash after
//! it leaves the new snapshot. If any step reports failure the in-memory
//! change is rolled back, so memory never runs ahead of disk.

use crate::backend::StorageBackend;
use crate::error::{PersistStage, StorageError, StorageResult};
use crate::snapshot::{self, SnapshotError};
use latchkey_core::constants::CORRUPT_SUFFIX;
use latchkey_core::{Authorization, Credential, CredentialId};
use std::collections::BTreeMap;
use tracing::{debug, error, info, warn};

/// The credential allow-list and its backing files.
#[derive(Debug)]
pub struct CredentialStore<B> {
    backend: B,
    canonical: String,
    staging: String,
    credentials: BTreeMap<CredentialId, Credential>,
}

impl<B: StorageBackend> CredentialStore<B> {
    /// Load the store from `canonical`, recovering from an interrupted
    /// write if needed.
    ///
    /// - canonical present: it is the truth; a leftover staging file is
    ///   stale and removed.
    /// - only staging present: the crash happened after staging was synced
    ///   but before the rename landed, so staging is promoted.
    /// - only staging present but invalid: an interrupted first write; it is
    ///   discarded and the store starts empty.
    ///
    /// # Errors
    ///
    /// `StoreCorrupt` if the canonical file fails validation, `Io` if the
    /// backend cannot be read.
    pub fn load(
        backend: B,
        canonical: impl Into<String>,
        staging: impl Into<String>,
    ) -> StorageResult<Self> {
        let mut store = Self {
            backend,
            canonical: canonical.into(),
            staging: staging.into(),
            credentials: BTreeMap::new(),
        };
        store.credentials = store.read_snapshot()?;
        info!(
            count = store.credentials.len(),
            path = %store.backend.location(&store.canonical),
            "Credential store loaded"
        );
        Ok(store)
    }

    /// Load the store, and if the canonical file is corrupt move it aside
    /// to `<canonical>.corrupt` and start empty.
    ///
    /// The corruption error is returned next to the store so the caller can
    /// raise a fault indication. An empty store denies everything.
    ///
    /// # Errors
    ///
    /// Only backend I/O errors; corruption is not an error here.
    pub fn load_or_empty(
        backend: B,
        canonical: impl Into<String>,
        staging: impl Into<String>,
    ) -> StorageResult<(Self, Option<StorageError>)> {
        let mut store = Self {
            backend,
            canonical: canonical.into(),
            staging: staging.into(),
            credentials: BTreeMap::new(),
        };
        match store.read_snapshot() {
            Ok(credentials) => {
                store.credentials = credentials;
                Ok((store, None))
            }
            Err(e @ StorageError::StoreCorrupt { .. }) => {
                error!("{}; starting with an empty store", e);
                store.quarantine();
                Ok((store, Some(e)))
            }
            Err(e) => Err(e),
        }
    }

    fn read_snapshot(&self) -> StorageResult<BTreeMap<CredentialId, Credential>> {
        let canonical = self.backend.read(&self.canonical)?;
        let staging = self.backend.read(&self.staging)?;

        let credentials = match (canonical, staging) {
            (Some(bytes), staging) => {
                let credentials = self.decode(&self.canonical, &bytes)?;
                if staging.is_some() {
                    warn!(
                        path = %self.backend.location(&self.staging),
                        "Removing stale staging file"
                    );
                    self.remove_staging();
                }
                credentials
            }
            (None, Some(bytes)) => match snapshot::decode(&bytes) {
                Ok(credentials) => {
                    warn!(
                        path = %self.backend.location(&self.staging),
                        "Recovering credential store from staging file"
                    );
                    self.backend.rename(&self.staging, &self.canonical)?;
                    credentials
                }
                Err(reason) => {
                    warn!(
                        path = %self.backend.location(&self.staging),
                        %reason,
                        "Discarding incomplete staging file"
                    );
                    self.remove_staging();
                    Vec::new()
                }
            },
            (None, None) => Vec::new(),
        };

        Ok(credentials.into_iter().map(|c| (c.id(), c)).collect())
    }

    fn decode(&self, name: &str, bytes: &[u8]) -> StorageResult<Vec<Credential>> {
        snapshot::decode(bytes).map_err(|reason: SnapshotError| StorageError::StoreCorrupt {
            path: self.backend.location(name),
            reason,
        })
    }

    fn quarantine(&self) {
        let aside = format!("{}{}", self.canonical, CORRUPT_SUFFIX);
        if let Err(e) = self.backend.rename(&self.canonical, &aside) {
            warn!("Could not move corrupt credential file aside: {}", e);
        }
        self.remove_staging();
    }

    fn remove_staging(&self) {
        if let Err(e) = self.backend.remove(&self.staging) {
            warn!("Could not remove staging file: {}", e);
        }
    }

    /// Verdict for a presented credential.
    #[must_use]
    pub fn check(&self, id: CredentialId) -> Authorization {
        match self.credentials.get(&id) {
            Some(c) if c.is_enabled() => Authorization::Granted,
            Some(_) => Authorization::Disabled,
            None => Authorization::Unknown,
        }
    }

    /// Whether `id` is present and enabled.
    #[must_use]
    pub fn is_authorized(&self, id: CredentialId) -> bool {
        self.check(id).is_granted()
    }

    #[must_use]
    pub fn get(&self, id: CredentialId) -> Option<&Credential> {
        self.credentials.get(&id)
    }

    /// Credentials in id order.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = &Credential> {
        self.credentials.values()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.credentials.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.credentials.is_empty()
    }

    /// Insert or replace a credential and persist.
    ///
    /// Returns the record it replaced, if any.
    ///
    /// # Errors
    ///
    /// `PersistFailed` if the snapshot could not be made durable; the store
    /// is left as it was before the call.
    pub fn upsert(&mut self, credential: Credential) -> StorageResult<Option<Credential>> {
        let id = credential.id();
        let previous = self.credentials.insert(id, credential);
        if let Err(e) = self.persist() {
            match previous {
                Some(old) => self.credentials.insert(id, old),
                None => self.credentials.remove(&id),
            };
            return Err(e);
        }
        info!(%id, replaced = previous.is_some(), "Credential stored");
        Ok(previous)
    }

    /// Remove a credential and persist. Removing an unknown id is a no-op
    /// and writes nothing.
    ///
    /// # Errors
    ///
    /// `PersistFailed`, with the credential restored.
    pub fn remove(&mut self, id: CredentialId) -> StorageResult<Option<Credential>> {
        let Some(removed) = self.credentials.remove(&id) else {
            return Ok(None);
        };
        if let Err(e) = self.persist() {
            self.credentials.insert(id, removed);
            return Err(e);
        }
        info!(%id, "Credential removed");
        Ok(Some(removed))
    }

    /// Enable or disable a credential and persist.
    ///
    /// Returns `false` if the id is unknown.
    ///
    /// # Errors
    ///
    /// `PersistFailed`, with the flag restored.
    pub fn set_enabled(&mut self, id: CredentialId, enabled: bool) -> StorageResult<bool> {
        let Some(credential) = self.credentials.get_mut(&id) else {
            return Ok(false);
        };
        let was = credential.is_enabled();
        credential.set_enabled(enabled);
        if let Err(e) = self.persist() {
            if let Some(credential) = self.credentials.get_mut(&id) {
                credential.set_enabled(was);
            }
            return Err(e);
        }
        info!(%id, enabled, "Credential updated");
        Ok(true)
    }

    fn persist(&self) -> StorageResult<()> {
        let bytes = snapshot::encode(self.credentials.values());
        let failed = |stage: PersistStage, source: std::io::Error| {
            self.remove_staging();
            let path = self.backend.location(&self.canonical);
            error!(%path, %stage, "Credential persist failed: {}", source);
            StorageError::PersistFailed {
                path,
                stage,
                source,
            }
        };

        self.backend
            .write(&self.staging, &bytes)
            .map_err(|e| failed(PersistStage::Write, e))?;
        self.backend
            .sync(&self.staging)
            .map_err(|e| failed(PersistStage::Sync, e))?;
        if let Err(source) = self.backend.rename(&self.staging, &self.canonical) {
            // Once the staging file is gone the new snapshot is the canonical
            // one and the in-memory set must match it.
            if !matches!(self.backend.exists(&self.staging), Ok(false)) {
                return Err(failed(PersistStage::Rename, source));
            }
            warn!(
                path = %self.backend.location(&self.canonical),
                "Credential snapshot replaced but rename reported an error: {}", source
            );
        }

        debug!(bytes = bytes.len(), "Credential snapshot persisted");
        Ok(())
    }
}
