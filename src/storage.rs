//! Platform storage and collaborator seams.
//!
//! The client core does not care where its two persisted strings live — the
//! preference holding the fallback API URL and the recency list. Each
//! platform supplies a [`KeyValueStore`] binding: the CLI uses the
//! file-backed [`FileStore`], tests and embedders can use [`MemoryStore`].
//!
//! [`SearchIndexer`] is the seam for an OS-level search index collaborator
//! (Spotlight-style). The core hands it normalized projects keyed by id;
//! actually registering them with the OS is outside this crate.

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;
use tokio::sync::Mutex;

use crate::models::Project;

/// A single-namespace string key-value store.
///
/// Implementations must make each call atomic with respect to other calls
/// on the same store; callers layer their own read-modify-write critical
/// sections on top (see [`crate::recency::RecencyStore`]).
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;
    async fn set(&self, key: &str, value: &str) -> Result<()>;
}

/// OS search-index collaborator.
///
/// Out-of-scope integration point: implementations register the normalized
/// project set with a system search index and remove entries by id.
#[async_trait]
pub trait SearchIndexer: Send + Sync {
    /// Replace the indexed entries with the given project set.
    async fn index(&self, projects: &[Project]) -> Result<()>;
    /// Remove the entries with the given ids.
    async fn deindex(&self, ids: &[String]) -> Result<()>;
}

/// File-backed store: one JSON object per store file, keys at the top level.
///
/// Reads and writes are serialized through an internal mutex so concurrent
/// callers cannot interleave a read-modify-write of the backing file.
pub struct FileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStore {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            lock: Mutex::new(()),
        }
    }

    async fn read_map(&self) -> Result<HashMap<String, String>> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => serde_json::from_str(&content)
                .with_context(|| format!("Malformed store file: {}", self.path.display())),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(HashMap::new()),
            Err(err) => {
                Err(err).with_context(|| format!("Failed to read {}", self.path.display()))
            }
        }
    }

    async fn write_map(&self, map: &HashMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let content = serde_json::to_string_pretty(map)?;
        tokio::fs::write(&self.path, content)
            .await
            .with_context(|| format!("Failed to write {}", self.path.display()))
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let _guard = self.lock.lock().await;
        Ok(self.read_map().await?.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let _guard = self.lock.lock().await;
        let mut map = self.read_map().await.unwrap_or_default();
        map.insert(key.to_string(), value.to_string());
        self.write_map(&map).await
    }
}

/// In-memory store for tests and embedders without persistent storage.
#[derive(Default)]
pub struct MemoryStore {
    map: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.map.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.map.lock().await.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn file_store_roundtrip() {
        let tmp = tempfile::tempdir().unwrap();
        let store = FileStore::new(tmp.path().join("store.json"));

        assert_eq!(store.get("missing").await.unwrap(), None);
        store.set("api-url", "https://x.test").await.unwrap();
        store.set("other", "value").await.unwrap();

        assert_eq!(
            store.get("api-url").await.unwrap().as_deref(),
            Some("https://x.test")
        );
        assert_eq!(store.get("other").await.unwrap().as_deref(), Some("value"));
    }

    #[tokio::test]
    async fn file_store_overwrites_existing_key() {
        let tmp = tempfile::tempdir().unwrap();
        let store = FileStore::new(tmp.path().join("store.json"));

        store.set("k", "one").await.unwrap();
        store.set("k", "two").await.unwrap();
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("two"));
    }

    #[tokio::test]
    async fn memory_store_roundtrip() {
        let store = MemoryStore::new();
        store.set("k", "v").await.unwrap();
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("v"));
    }
}
