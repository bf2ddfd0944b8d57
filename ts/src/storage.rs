//! Durable slot storage
//!
//! A slot is a named JSON document that survives restarts. The store keeps one
//! slot for tasks and one for prioritization results.

use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use fs2::FileExt;
use tracing::debug;

use crate::error::StorageError;

/// Named key-value slots holding serialized JSON
pub trait SlotStorage: Send + Sync {
    /// Read a slot, `None` if it was never written or has been removed
    fn read(&self, slot: &str) -> Result<Option<String>, StorageError>;

    /// Replace the slot contents
    fn write(&self, slot: &str, value: &str) -> Result<(), StorageError>;

    /// Erase the slot; removing a missing slot is not an error
    fn remove(&self, slot: &str) -> Result<(), StorageError>;
}

/// One JSON file per slot under a directory
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Open or create slot storage at the given directory
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, StorageError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        debug!(?dir, "FileStorage::open: opened");
        Ok(Self { dir })
    }

    /// `<data_local_dir>/smarttasks`
    pub fn default_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("smarttasks")
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn slot_path(&self, slot: &str) -> PathBuf {
        self.dir.join(format!("{}.json", slot))
    }

    /// Take the cross-process write lock; released when the file is dropped
    fn lock(&self) -> Result<File, StorageError> {
        let lock = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(self.dir.join(".lock"))?;
        lock.lock_exclusive()?;
        Ok(lock)
    }
}

impl SlotStorage for FileStorage {
    fn read(&self, slot: &str) -> Result<Option<String>, StorageError> {
        let path = self.slot_path(slot);
        match fs::read_to_string(&path) {
            Ok(content) => {
                debug!(?path, bytes = content.len(), "FileStorage::read: slot found");
                Ok(Some(content))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(?path, "FileStorage::read: slot missing");
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, slot: &str, value: &str) -> Result<(), StorageError> {
        let path = self.slot_path(slot);
        let tmp = self.dir.join(format!("{}.json.tmp", slot));
        let _lock = self.lock()?;

        let mut file = File::create(&tmp)?;
        file.write_all(value.as_bytes())?;
        file.sync_all()?;
        fs::rename(&tmp, &path)?;

        debug!(?path, bytes = value.len(), "FileStorage::write: slot written");
        Ok(())
    }

    fn remove(&self, slot: &str) -> Result<(), StorageError> {
        let path = self.slot_path(slot);
        let _lock = self.lock()?;
        match fs::remove_file(&path) {
            Ok(()) => {
                debug!(?path, "FileStorage::remove: slot removed");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// In-process slots, for tests and embedding
#[derive(Debug, Default)]
pub struct MemoryStorage {
    slots: Mutex<HashMap<String, String>>,
    writes: AtomicUsize,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with pre-populated slots
    pub fn with_slots<I, K, V>(slots: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            slots: Mutex::new(slots.into_iter().map(|(k, v)| (k.into(), v.into())).collect()),
            writes: AtomicUsize::new(0),
        }
    }

    /// Number of `write` and `remove` calls so far
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn slots(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.slots.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl SlotStorage for MemoryStorage {
    fn read(&self, slot: &str) -> Result<Option<String>, StorageError> {
        Ok(self.slots().get(slot).cloned())
    }

    fn write(&self, slot: &str, value: &str) -> Result<(), StorageError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.slots().insert(slot.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, slot: &str) -> Result<(), StorageError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.slots().remove(slot);
        Ok(())
    }
}
