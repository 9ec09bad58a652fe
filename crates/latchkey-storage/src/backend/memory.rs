use super::StorageBackend;
use std::collections::BTreeMap;
use std::io;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Debug, Default)]
struct Faults {
    write: bool,
    sync: bool,
    rename: bool,
    append: bool,
    /// The operation lands but still reports an error.
    rename_landed: bool,
    append_landed: bool,
    /// Tear the next write or append after this many bytes.
    tear_after: Option<usize>,
}

#[derive(Debug, Default)]
struct Inner {
    files: BTreeMap<String, Vec<u8>>,
    faults: Faults,
}

/// In-memory storage with fault injection.
///
/// Clones share the same files, so a test can keep one clone, hand another
/// to a store, inject a fault, and then "reboot" by loading a fresh store
/// from the surviving clone.
///
/// Every fault fires once and then clears itself.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Make the next [`write`](StorageBackend::write) fail without
    /// touching the file.
    pub fn fail_next_write(&self) {
        self.lock().faults.write = true;
    }

    pub fn fail_next_sync(&self) {
        self.lock().faults.sync = true;
    }

    pub fn fail_next_rename(&self) {
        self.lock().faults.rename = true;
    }

    pub fn fail_next_append(&self) {
        self.lock().faults.append = true;
    }

    /// Make the next rename move the file and then report an error, like
    /// a directory sync failing after the rename itself went through.
    pub fn fail_after_next_rename(&self) {
        self.lock().faults.rename_landed = true;
    }

    /// Make the next append write the whole record and then report an
    /// error, like a sync failing after the data reached the file.
    pub fn fail_after_next_append(&self) {
        self.lock().faults.append_landed = true;
    }

    /// Make the next write or append store only its first `bytes` bytes
    /// and then fail, as if power was lost mid-write.
    pub fn tear_next_write(&self, bytes: usize) {
        self.lock().faults.tear_after = Some(bytes);
    }

    /// Contents of a file, if present.
    #[must_use]
    pub fn contents(&self, name: &str) -> Option<Vec<u8>> {
        self.lock().files.get(name).cloned()
    }

    /// Put a file in place directly, bypassing faults.
    pub fn insert(&self, name: &str, data: impl Into<Vec<u8>>) {
        self.lock().files.insert(name.to_string(), data.into());
    }

    /// Names of all files, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.lock().files.keys().cloned().collect()
    }
}

fn injected(what: &str) -> io::Error {
    io::Error::other(format!("injected {what} failure"))
}

impl StorageBackend for MemoryStorage {
    fn read(&self, name: &str) -> io::Result<Option<Vec<u8>>> {
        Ok(self.contents(name))
    }

    fn write(&self, name: &str, data: &[u8]) -> io::Result<()> {
        let mut inner = self.lock();
        if std::mem::take(&mut inner.faults.write) {
            return Err(injected("write"));
        }
        if let Some(n) = inner.faults.tear_after.take() {
            let torn = data[..n.min(data.len())].to_vec();
            inner.files.insert(name.to_string(), torn);
            return Err(injected("torn write"));
        }
        inner.files.insert(name.to_string(), data.to_vec());
        Ok(())
    }

    fn sync(&self, name: &str) -> io::Result<()> {
        let mut inner = self.lock();
        if std::mem::take(&mut inner.faults.sync) {
            return Err(injected("sync"));
        }
        if !inner.files.contains_key(name) {
            return Err(io::Error::new(io::ErrorKind::NotFound, name.to_string()));
        }
        Ok(())
    }

    fn append_synced(&self, name: &str, data: &[u8]) -> io::Result<()> {
        let mut inner = self.lock();
        if std::mem::take(&mut inner.faults.append) {
            return Err(injected("append"));
        }
        let torn = inner.faults.tear_after.take();
        let landed = std::mem::take(&mut inner.faults.append_landed);
        let file = inner.files.entry(name.to_string()).or_default();
        match torn {
            Some(n) => {
                file.extend_from_slice(&data[..n.min(data.len())]);
                Err(injected("torn append"))
            }
            None => {
                file.extend_from_slice(data);
                if landed {
                    return Err(injected("append sync"));
                }
                Ok(())
            }
        }
    }

    fn rename(&self, from: &str, to: &str) -> io::Result<()> {
        let mut inner = self.lock();
        if std::mem::take(&mut inner.faults.rename) {
            return Err(injected("rename"));
        }
        let data = inner
            .files
            .remove(from)
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, from.to_string()))?;
        inner.files.insert(to.to_string(), data);
        if std::mem::take(&mut inner.faults.rename_landed) {
            return Err(injected("directory sync"));
        }
        Ok(())
    }

    fn remove(&self, name: &str) -> io::Result<()> {
        self.lock().files.remove(name);
        Ok(())
    }

    fn exists(&self, name: &str) -> io::Result<bool> {
        Ok(self.lock().files.contains_key(name))
    }

    fn location(&self, name: &str) -> String {
        format!("memory:{name}")
    }
}
