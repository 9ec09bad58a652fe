use crate::snapshot::SnapshotError;
use std::fmt;
use thiserror::Error;

/// Storage-specific error types for the latchkey controller.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The canonical credential file exists but is not a valid snapshot.
    #[error("Credential store corrupt at {path}: {reason}")]
    StoreCorrupt {
        path: String,
        #[source]
        reason: SnapshotError,
    },

    /// A credential snapshot could not be made durable. The in-memory
    /// mutation that triggered it has been rolled back.
    #[error("Persist failed at {stage} of {path}: {source}")]
    PersistFailed {
        path: String,
        stage: PersistStage,
        source: std::io::Error,
    },

    /// An audit entry could not be appended.
    #[error("Event log write failed for {path}: {source}")]
    LogWriteFailed {
        path: String,
        source: std::io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Step of the staging-then-replace write that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistStage {
    /// Writing the staging file.
    Write,
    /// Flushing the staging file to stable storage.
    Sync,
    /// Atomically replacing the canonical file.
    Rename,
}

impl fmt::Display for PersistStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Write => write!(f, "write"),
            Self::Sync => write!(f, "sync"),
            Self::Rename => write!(f, "rename"),
        }
    }
}

/// Specialized result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;
