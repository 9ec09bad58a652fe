use crate::backend::FsStorage;
use crate::credential_store::CredentialStore;
use crate::error::{StorageError, StorageResult};
use crate::event_log::EventLog;
use latchkey_core::constants::{
    DEFAULT_CREDENTIALS_FILE, DEFAULT_DATA_DIR, DEFAULT_LOG_FILE, DEFAULT_STAGING_FILE,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Where the credential store and event log live.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
    pub credentials_file: String,
    pub staging_file: String,
    pub log_file: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            credentials_file: DEFAULT_CREDENTIALS_FILE.to_string(),
            staging_file: DEFAULT_STAGING_FILE.to_string(),
            log_file: DEFAULT_LOG_FILE.to_string(),
        }
    }
}

impl StorageConfig {
    /// Open (creating if needed) the data directory.
    ///
    /// # Errors
    ///
    /// `Io` if the directory cannot be created.
    pub fn backend(&self) -> StorageResult<FsStorage> {
        FsStorage::open(&self.data_dir).map_err(StorageError::from)
    }

    /// Load the credential store with the corrupt-file policy applied.
    ///
    /// # Errors
    ///
    /// Backend I/O errors.
    pub fn open_store(
        &self,
    ) -> StorageResult<(CredentialStore<FsStorage>, Option<StorageError>)> {
        CredentialStore::load_or_empty(
            self.backend()?,
            &self.credentials_file,
            &self.staging_file,
        )
    }

    /// Open the event log.
    ///
    /// # Errors
    ///
    /// Backend I/O errors.
    pub fn open_log(&self) -> StorageResult<EventLog<FsStorage>> {
        EventLog::open(self.backend()?, &self.log_file)
    }
}
