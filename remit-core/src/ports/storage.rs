//! Session storage port - durable key/value entries

use crate::domain::result::Result;

/// Durable string key/value storage backing the session
///
/// Writes must outlast the process. Each single-key operation is atomic;
/// `remove_all` should be a single write where the backend allows it.
pub trait SessionStorage: Send + Sync {
    /// Read a value, `None` when the key is absent
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write a value, replacing any previous one
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove a key; removing an absent key succeeds
    fn remove(&self, key: &str) -> Result<()>;

    /// Write several values at once
    fn set_all(&self, entries: &[(&str, &str)]) -> Result<()> {
        for (key, value) in entries {
            self.set(key, value)?;
        }
        Ok(())
    }

    /// Remove several keys at once
    fn remove_all(&self, keys: &[&str]) -> Result<()> {
        for key in keys {
            self.remove(key)?;
        }
        Ok(())
    }
}
