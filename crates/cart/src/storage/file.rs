//! Directory-backed store standing in for device-local storage.
//!
//! Each key lives in its own `<encoded-key>.json` file. Writes go to a
//! sibling temp file first and are then renamed over the target, so a crash
//! mid-write leaves either the old blob or the new one.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::{KeyValueStore, StorageError};

/// A [`KeyValueStore`] keeping one file per key under a root directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Create a store rooted at `root`. The directory is created on first write.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the file holding `key`.
    #[must_use]
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(format!("{}.json", encode_key(key)))
    }
}

/// Map a key to a filesystem-safe name.
///
/// Alphanumerics and `-_.~` pass through; every other byte becomes `%XX`.
fn encode_key(key: &str) -> String {
    urlencoding::encode(key).into_owned()
}

impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for(key);
        match tokio::fs::read_to_string(&path).await {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "No stored value");
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn set(&self, key: &str, value: String) -> Result<(), StorageError> {
        tokio::fs::create_dir_all(&self.root).await?;

        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, value.as_bytes()).await?;
        tokio::fs::rename(&tmp, &path).await?;

        debug!(path = %path.display(), bytes = value.len(), "Stored value");
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        match tokio::fs::remove_file(self.path_for(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_key() {
        assert_eq!(encode_key("@GoMarketplace"), "%40GoMarketplace");
        assert_eq!(encode_key("cart.v1_main-2~x"), "cart.v1_main-2~x");
        assert_eq!(encode_key("a/b"), "a%2Fb");
        assert_eq!(encode_key("../cart"), "..%2Fcart");
        assert_eq!(encode_key("caf\u{e9} cart"), "caf%C3%A9%20cart");
    }

    #[tokio::test]
    async fn test_get_missing_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("not-yet-created"));
        assert!(store.get("@GoMarketplace").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_set_then_get() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("nested"));

        store.set("@GoMarketplace", "[]".to_owned()).await.unwrap();
        store.set("@GoMarketplace", "[1]".to_owned()).await.unwrap();

        assert_eq!(
            store.get("@GoMarketplace").await.unwrap().as_deref(),
            Some("[1]")
        );
        assert!(store.path_for("@GoMarketplace").exists());
        assert!(!store.path_for("@GoMarketplace").with_extension("json.tmp").exists());
    }

    #[tokio::test]
    async fn test_remove_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());

        store.set("k", "v".to_owned()).await.unwrap();
        store.remove("k").await.unwrap();
        store.remove("k").await.unwrap();
        assert!(store.get("k").await.unwrap().is_none());
    }
}
