//! In-memory store, for tests and for embedding without a device.

use std::collections::HashMap;
use std::sync::RwLock;

use super::{KeyValueStore, StorageError};

/// A [`KeyValueStore`] backed by a `HashMap`.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with one entry.
    #[must_use]
    pub fn with_entry(key: impl Into<String>, value: impl Into<String>) -> Self {
        let mut entries = HashMap::new();
        entries.insert(key.into(), value.into());
        Self {
            entries: RwLock::new(entries),
        }
    }

    /// Read an entry without going through the async trait.
    #[must_use]
    pub fn snapshot(&self, key: &str) -> Option<String> {
        self.entries
            .read()
            .ok()
            .and_then(|guard| guard.get(key).cloned())
    }
}

impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let guard = self
            .entries
            .read()
            .map_err(|_| StorageError::Backend("Lock poisoned".to_string()))?;
        Ok(guard.get(key).cloned())
    }

    async fn set(&self, key: &str, value: String) -> Result<(), StorageError> {
        self.entries
            .write()
            .map_err(|_| StorageError::Backend("Lock poisoned".to_string()))?
            .insert(key.to_owned(), value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.entries
            .write()
            .map_err(|_| StorageError::Backend("Lock poisoned".to_string()))?
            .remove(key);
        Ok(())
    }
}
