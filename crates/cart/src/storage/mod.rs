//! Key-value persistence backends.
//!
//! The cart persists itself as a single JSON string under one key. Anything
//! that can get and set strings by key can back it: the mobile client's
//! device storage, a directory on disk, or a map in memory.

mod file;
mod memory;

use std::future::Future;
use std::sync::Arc;

use thiserror::Error;

pub use file::FileStore;
pub use memory::MemoryStore;

/// Errors reported by a [`KeyValueStore`].
#[derive(Debug, Error)]
pub enum StorageError {
    /// Filesystem operation failed.
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Backend-specific failure.
    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Asynchronous string key-value store.
///
/// Values are replaced wholesale on every `set`; there are no partial
/// writes and no compare-and-swap. Last write wins.
pub trait KeyValueStore: Send + Sync + 'static {
    /// Read the value stored under `key`, or `None` if there is none.
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<String>, StorageError>> + Send;

    /// Overwrite the value stored under `key`.
    fn set(&self, key: &str, value: String)
    -> impl Future<Output = Result<(), StorageError>> + Send;

    /// Delete `key`. Removing a missing key is not an error.
    fn remove(&self, key: &str) -> impl Future<Output = Result<(), StorageError>> + Send;
}

impl<S: KeyValueStore> KeyValueStore for Arc<S> {
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<String>, StorageError>> + Send {
        (**self).get(key)
    }

    fn set(
        &self,
        key: &str,
        value: String,
    ) -> impl Future<Output = Result<(), StorageError>> + Send {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> impl Future<Output = Result<(), StorageError>> + Send {
        (**self).remove(key)
    }
}
