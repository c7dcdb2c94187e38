//! Key-value storage slots backing the catalog.
//!
//! A slot holds one serialized document. The file store keeps one `<key>.json` per slot
//! and replaces it atomically, so a crash mid-write leaves the previous contents intact.

pub mod codec;

use std::collections::HashMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use tempfile::NamedTempFile;

/// Slot the catalog is saved under.
pub const STORAGE_KEY: &str = "library-books";

/// A named-slot persistent store.
pub trait SlotStore: Send + Sync {
    /// Contents of the slot, or `None` if nothing has been written yet.
    fn read(&self, key: &str) -> io::Result<Option<String>>;

    /// Replace the slot's contents.
    fn write(&self, key: &str, contents: &str) -> io::Result<()>;
}

/// Slots stored as JSON files in one directory.
#[derive(Debug, Clone)]
pub struct FileSlotStore {
    dir: PathBuf,
}

impl FileSlotStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn slot_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl SlotStore for FileSlotStore {
    fn read(&self, key: &str) -> io::Result<Option<String>> {
        let path = self.slot_path(key);
        match fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "storage slot not found");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    fn write(&self, key: &str, contents: &str) -> io::Result<()> {
        if !self.dir.exists() {
            fs::create_dir_all(&self.dir)?;
            tracing::info!(dir = %self.dir.display(), "created storage directory");
        }

        // Temp file in the same directory so the rename stays on one filesystem
        let mut temp_file = NamedTempFile::new_in(&self.dir)?;
        temp_file.write_all(contents.as_bytes())?;
        temp_file.flush()?;

        let path = self.slot_path(key);
        temp_file.persist(&path).map_err(|e| e.error)?;

        tracing::debug!(path = %path.display(), bytes = contents.len(), "storage slot written");
        Ok(())
    }
}

/// In-memory slots. Clones share the same slots, which lets a test restore what another
/// handle persisted.
#[derive(Debug, Clone, Default)]
pub struct MemorySlotStore {
    slots: Arc<Mutex<HashMap<String, String>>>,
}

impl MemorySlotStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SlotStore for MemorySlotStore {
    fn read(&self, key: &str) -> io::Result<Option<String>> {
        let slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(slots.get(key).cloned())
    }

    fn write(&self, key: &str, contents: &str) -> io::Result<()> {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        slots.insert(key.to_string(), contents.to_string());
        Ok(())
    }
}

/// Memory slots whose writes can be switched off, for exercising save failures.
#[cfg(test)]
#[derive(Debug, Clone, Default)]
pub(crate) struct SwitchableSlotStore {
    pub(crate) inner: MemorySlotStore,
    failing: Arc<std::sync::atomic::AtomicBool>,
}

#[cfg(test)]
impl SwitchableSlotStore {
    pub(crate) fn set_failing(&self, failing: bool) {
        self.failing
            .store(failing, std::sync::atomic::Ordering::SeqCst);
    }
}

#[cfg(test)]
impl SlotStore for SwitchableSlotStore {
    fn read(&self, key: &str) -> io::Result<Option<String>> {
        self.inner.read(key)
    }

    fn write(&self, key: &str, contents: &str) -> io::Result<()> {
        if self.failing.load(std::sync::atomic::Ordering::SeqCst) {
            return Err(io::Error::new(io::ErrorKind::Other, "disk unavailable"));
        }
        self.inner.write(key, contents)
    }
}
