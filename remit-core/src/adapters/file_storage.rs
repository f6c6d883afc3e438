//! File-backed session storage
//!
//! Entries live in a single JSON object (`session.json`). Every operation
//! takes an advisory lock on a sidecar `.lock` file, and every write goes to
//! a temp file that is renamed over the original, so concurrent CLI
//! processes never see a half-written session.

use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use fs2::FileExt;
use tempfile::NamedTempFile;

use crate::domain::result::{Error, Result};
use crate::ports::SessionStorage;

type Entries = BTreeMap<String, String>;

/// Session storage in a JSON file
#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
    lock_path: PathBuf,
}

impl FileStorage {
    /// Storage at `<dir>/session.json`
    pub fn in_dir(dir: &Path) -> Self {
        Self::new(&dir.join("session.json"))
    }

    pub fn new(path: &Path) -> Self {
        let mut lock_name = path.as_os_str().to_os_string();
        lock_name.push(".lock");
        Self {
            path: path.to_path_buf(),
            lock_path: PathBuf::from(lock_name),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Run `f` while holding the exclusive lock
    fn locked<T>(&self, f: impl FnOnce() -> Result<T>) -> Result<T> {
        if let Some(parent) = self.lock_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let lock_file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .open(&self.lock_path)?;
        lock_file
            .lock_exclusive()
            .map_err(|e| Error::storage(format!("Failed to lock session file: {}", e)))?;

        let result = f();

        let _ = FileExt::unlock(&lock_file);
        result
    }

    /// A missing, empty or malformed file reads as no entries
    fn read_entries(&self) -> Result<Entries> {
        if !self.path.exists() {
            return Ok(Entries::new());
        }
        let content = fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(Entries::new());
        }
        Ok(serde_json::from_str(&content).unwrap_or_default())
    }

    /// Replace the file atomically; temp files are created owner-only
    fn write_entries(&self, entries: &Entries) -> Result<()> {
        let parent = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let mut tmp = NamedTempFile::new_in(parent)?;
        let content = serde_json::to_string_pretty(entries)?;
        tmp.write_all(content.as_bytes())?;
        tmp.flush()?;
        tmp.persist(&self.path)
            .map_err(|e| Error::storage(format!("Failed to write session file: {}", e)))?;
        Ok(())
    }

    fn update(&self, f: impl FnOnce(&mut Entries) -> bool) -> Result<()> {
        self.locked(|| {
            let mut entries = self.read_entries()?;
            if f(&mut entries) {
                self.write_entries(&entries)?;
            }
            Ok(())
        })
    }
}

impl SessionStorage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        self.locked(|| Ok(self.read_entries()?.get(key).cloned()))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.set_all(&[(key, value)])
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.remove_all(&[key])
    }

    fn set_all(&self, values: &[(&str, &str)]) -> Result<()> {
        self.update(|entries| {
            for (key, value) in values {
                entries.insert(key.to_string(), value.to_string());
            }
            true
        })
    }

    fn remove_all(&self, keys: &[&str]) -> Result<()> {
        self.update(|entries| {
            let before = entries.len();
            for key in keys {
                entries.remove(*key);
            }
            entries.len() != before
        })
    }
}
