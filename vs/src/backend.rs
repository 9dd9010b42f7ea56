//! Key-value backends for the variable store

use eyre::{Context, Result};
use fs2::FileExt;
use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::debug;

/// A string-valued key-value backend
///
/// Values are opaque strings; the store layers JSON on top where it needs
/// structure.
pub trait Backend: Send + Sync {
    /// Read the value stored under `key`
    fn get_item(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key`, replacing any previous value
    fn set_item(&self, key: &str, value: &str) -> Result<()>;

    /// Remove `key`; removing an absent key is not an error
    fn remove_item(&self, key: &str) -> Result<()>;

    /// All keys currently stored
    fn keys(&self) -> Result<Vec<String>>;
}

/// Backend that keeps every item in one JSON object on disk
///
/// Each operation takes an advisory lock on the file for its duration, so a
/// single write never interleaves with another process's write. Sequences of
/// operations are not atomic.
pub struct JsonFileBackend {
    path: PathBuf,
}

impl JsonFileBackend {
    /// Open (or create) the backing file
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).context("Failed to create store directory")?;
        }
        debug!(?path, "JsonFileBackend::open: called");
        Ok(Self { path })
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn with_locked<T>(&self, write: bool, f: impl FnOnce(&mut BTreeMap<String, String>) -> T) -> Result<T> {
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&self.path)
            .context(format!("Failed to open store file: {}", self.path.display()))?;

        if write {
            FileExt::lock_exclusive(&file).context("Failed to lock store file")?;
        } else {
            FileExt::lock_shared(&file).context("Failed to lock store file")?;
        }

        let result = (|| -> Result<T> {
            let mut content = String::new();
            file.read_to_string(&mut content)?;
            let mut items: BTreeMap<String, String> = if content.trim().is_empty() {
                BTreeMap::new()
            } else {
                serde_json::from_str(&content).context("Store file is not a JSON object of strings")?
            };

            let value = f(&mut items);

            if write {
                let serialized = serde_json::to_string_pretty(&items)?;
                file.set_len(0)?;
                file.seek(SeekFrom::Start(0))?;
                file.write_all(serialized.as_bytes())?;
                file.flush()?;
            }
            Ok(value)
        })();

        FileExt::unlock(&file).context("Failed to unlock store file")?;
        result
    }
}

impl Backend for JsonFileBackend {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        debug!(%key, "JsonFileBackend::get_item: called");
        self.with_locked(false, |items| items.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        debug!(%key, value_len = value.len(), "JsonFileBackend::set_item: called");
        self.with_locked(true, |items| {
            items.insert(key.to_string(), value.to_string());
        })
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        debug!(%key, "JsonFileBackend::remove_item: called");
        self.with_locked(true, |items| {
            items.remove(key);
        })
    }

    fn keys(&self) -> Result<Vec<String>> {
        self.with_locked(false, |items| items.keys().cloned().collect())
    }
}

/// Volatile backend, for tests and hosts that bring their own persistence
#[derive(Default)]
pub struct MemoryBackend {
    items: Mutex<BTreeMap<String, String>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn items(&self) -> Result<std::sync::MutexGuard<'_, BTreeMap<String, String>>> {
        self.items.lock().map_err(|_| eyre::eyre!("Memory backend lock poisoned"))
    }
}

impl Backend for MemoryBackend {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        Ok(self.items()?.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        self.items()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        self.items()?.remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>> {
        Ok(self.items()?.keys().cloned().collect())
    }
}
