//! File-backed key-value store
//!
//! Each key is stored as its own file named after the SHA-256 of the key,
//! under a one-level fan-out directory.
//!
//! Example: key "@habits" hashes to "3f9a..." and lives at "store/3f/3f9a....json"

use super::{KeyValueStore, StoreFuture};
use crate::error::Result;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

/// Key-value store persisting one JSON file per key
#[derive(Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Create a new store at the given root directory
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Initialize the store (create directory if needed)
    pub async fn initialize(&self) -> Result<()> {
        fs::create_dir_all(&self.root).await?;
        tracing::info!("Key-value store initialized at: {:?}", self.root);
        Ok(())
    }

    async fn read(&self, key: &str) -> Result<Option<String>> {
        let path = self.get_path(key);

        match fs::read_to_string(&path).await {
            Ok(value) => {
                tracing::debug!("Read key {} ({} bytes)", key, value.len());
                Ok(Some(value))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn write(&self, key: &str, value: String) -> Result<()> {
        let path = self.get_path(key);

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        // Write to temp file first (atomic write)
        let temp_path = path.with_extension(format!("tmp.{}", Uuid::new_v4()));
        let mut file = fs::File::create(&temp_path).await?;
        file.write_all(value.as_bytes()).await?;
        file.sync_all().await?;

        fs::rename(&temp_path, &path).await?;

        tracing::debug!("Wrote key {} ({} bytes)", key, value.len());

        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let path = self.get_path(key);

        match fs::remove_file(&path).await {
            Ok(()) => {
                tracing::debug!("Removed key {}", key);
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Get file path for a key
    fn get_path(&self, key: &str) -> PathBuf {
        let hash = key_hash(key);
        self.root.join(&hash[0..2]).join(format!("{}.json", hash))
    }

    /// Get store root directory
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl KeyValueStore for FileStore {
    fn get<'a>(&'a self, key: &'a str) -> StoreFuture<'a, Option<String>> {
        Box::pin(self.read(key))
    }

    fn set<'a>(&'a self, key: &'a str, value: String) -> StoreFuture<'a, ()> {
        Box::pin(self.write(key, value))
    }

    fn remove<'a>(&'a self, key: &'a str) -> StoreFuture<'a, ()> {
        Box::pin(self.delete(key))
    }
}

/// SHA-256 of a key as lowercase hex
fn key_hash(key: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(key.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn create_test_store() -> (FileStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStore::new(temp_dir.path().join("store"));
        store.initialize().await.unwrap();
        (store, temp_dir)
    }

    #[tokio::test]
    async fn test_set_and_get() {
        let (store, _temp) = create_test_store().await;

        store.set("@todoList", "[]".to_string()).await.unwrap();

        let value = store.get("@todoList").await.unwrap();
        assert_eq!(value.as_deref(), Some("[]"));
    }

    #[tokio::test]
    async fn test_missing_key_is_none() {
        let (store, _temp) = create_test_store().await;

        assert!(store.get("@habits").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_overwrite() {
        let (store, _temp) = create_test_store().await;

        store.set("@users", "[1]".to_string()).await.unwrap();
        store.set("@users", "[2]".to_string()).await.unwrap();

        assert_eq!(store.get("@users").await.unwrap().as_deref(), Some("[2]"));
    }

    #[tokio::test]
    async fn test_remove() {
        let (store, _temp) = create_test_store().await;

        store.set("@loggedInUser", "{}".to_string()).await.unwrap();
        store.remove("@loggedInUser").await.unwrap();
        assert!(store.get("@loggedInUser").await.unwrap().is_none());

        // Removing again is fine
        store.remove("@loggedInUser").await.unwrap();
    }

    #[tokio::test]
    async fn test_directory_structure() {
        let (store, _temp) = create_test_store().await;

        store.set("@projects", "[]".to_string()).await.unwrap();

        let hash = key_hash("@projects");
        let path = store.get_path("@projects");
        assert!(path.exists());
        assert_eq!(path.parent().unwrap().file_name().unwrap(), &hash[0..2]);

        // No temp files left behind
        let mut entries = std::fs::read_dir(path.parent().unwrap()).unwrap();
        assert!(entries.all(|e| !e
            .unwrap()
            .file_name()
            .to_string_lossy()
            .contains("tmp")));
    }
}
