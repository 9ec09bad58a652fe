//! Persistent storage collaborator.
//!
//! The credential store and the event log never touch the filesystem
//! directly. They go through [`StorageBackend`], which names locations by
//! plain strings and exposes exactly the primitives crash-safe persistence
//! needs: whole-file write, explicit sync, synced append and atomic rename.

mod fs;
mod memory;

pub use fs::FsStorage;
pub use memory::MemoryStorage;

use std::io;

/// Named, byte-addressable persistent storage.
///
/// Single writer: concurrent mutation of the same location from two
/// handles is not supported.
pub trait StorageBackend {
    /// Read a whole location, or `None` if it does not exist.
    fn read(&self, name: &str) -> io::Result<Option<Vec<u8>>>;

    /// Create or truncate `name` and write `data`. Not durable until
    /// [`sync`](Self::sync) returns.
    fn write(&self, name: &str, data: &[u8]) -> io::Result<()>;

    /// Flush `name` to stable storage.
    fn sync(&self, name: &str) -> io::Result<()>;

    /// Append `data` to `name` (creating it) and flush before returning.
    fn append_synced(&self, name: &str, data: &[u8]) -> io::Result<()>;

    /// Atomically replace `to` with `from`. A reader sees either the old
    /// `to` or the complete `from`, never a mix.
    fn rename(&self, from: &str, to: &str) -> io::Result<()>;

    /// Delete `name`. Deleting a missing location is not an error.
    fn remove(&self, name: &str) -> io::Result<()>;

    fn exists(&self, name: &str) -> io::Result<bool>;

    /// Human-readable location of `name`, for errors and diagnostics.
    fn location(&self, name: &str) -> String;
}
