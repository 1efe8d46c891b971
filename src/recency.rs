//! Recency tracking for opened projects.
//!
//! The only state this crate persists across sessions: an ordered,
//! deduplicated, capped list of the most recently opened project ids, stored
//! as a JSON array under a single key. The list is independent of the live
//! project set until [`RecencyStore::prune`] reconciles it after a fetch.

use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::storage::KeyValueStore;

/// Storage key holding the JSON-encoded id list.
pub const RECENT_IDS_KEY: &str = "recent-project-ids";

/// Maximum number of ids kept; older entries fall off the end.
pub const MAX_STORED: usize = 10;

pub struct RecencyStore {
    store: Arc<dyn KeyValueStore>,
    // add/prune are read-modify-write against one external key; this mutex
    // makes each call a critical section so concurrent touches cannot lose
    // updates.
    lock: Mutex<()>,
}

impl RecencyStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            lock: Mutex::new(()),
        }
    }

    /// Read the persisted list, most-recent-first. Absent or corrupt storage
    /// degrades to an empty list and never raises.
    pub async fn get(&self) -> Vec<String> {
        let _guard = self.lock.lock().await;
        self.read_list().await
    }

    /// Move `id` to the front, removing any prior occurrence, truncate to
    /// [`MAX_STORED`], and persist.
    pub async fn add(&self, id: &str) -> Result<()> {
        let _guard = self.lock.lock().await;
        let current = self.read_list().await;

        let mut updated = Vec::with_capacity(current.len() + 1);
        updated.push(id.to_string());
        updated.extend(current.into_iter().filter(|existing| existing != id));
        updated.truncate(MAX_STORED);

        self.persist(&updated).await
    }

    /// Drop ids that no longer exist in the live project set. Persists only
    /// when something was actually removed.
    pub async fn prune(&self, valid_ids: &HashSet<String>) -> Result<()> {
        let _guard = self.lock.lock().await;
        let current = self.read_list().await;

        let pruned: Vec<String> = current
            .iter()
            .filter(|id| valid_ids.contains(*id))
            .cloned()
            .collect();

        if pruned.len() == current.len() {
            return Ok(());
        }

        debug!(
            removed = current.len() - pruned.len(),
            "pruning stale recent ids"
        );
        self.persist(&pruned).await
    }

    async fn read_list(&self) -> Vec<String> {
        let stored = match self.store.get(RECENT_IDS_KEY).await {
            Ok(value) => value,
            Err(err) => {
                warn!("recency storage unreadable, treating as empty: {}", err);
                return Vec::new();
            }
        };
        let Some(raw) = stored else {
            return Vec::new();
        };
        match serde_json::from_str(&raw) {
            Ok(list) => list,
            Err(_) => {
                warn!("recency list corrupt, treating as empty");
                Vec::new()
            }
        }
    }

    async fn persist(&self, ids: &[String]) -> Result<()> {
        let encoded = serde_json::to_string(ids)
            .map_err(|err| Error::Storage(err.to_string()))?;
        self.store
            .set(RECENT_IDS_KEY, &encoded)
            .await
            .map_err(|err| Error::Storage(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    fn store() -> (Arc<MemoryStore>, RecencyStore) {
        let kv = Arc::new(MemoryStore::new());
        let recency = RecencyStore::new(kv.clone());
        (kv, recency)
    }

    #[tokio::test]
    async fn add_moves_to_front_and_dedups() {
        let (_, recency) = store();

        recency.add("p1").await.unwrap();
        recency.add("p2").await.unwrap();
        recency.add("p1").await.unwrap();

        assert_eq!(recency.get().await, vec!["p1", "p2"]);
    }

    #[tokio::test]
    async fn repeated_add_is_idempotent_beyond_the_first() {
        let (_, recency) = store();

        recency.add("p1").await.unwrap();
        recency.add("p2").await.unwrap();
        recency.add("p2").await.unwrap();
        recency.add("p2").await.unwrap();

        let list = recency.get().await;
        assert_eq!(list, vec!["p2", "p1"]);
        assert_eq!(list.len(), 2);
    }

    #[tokio::test]
    async fn list_caps_at_ten_most_recent_first() {
        let (_, recency) = store();

        for i in 0..15 {
            recency.add(&format!("p{}", i)).await.unwrap();
        }

        let list = recency.get().await;
        assert_eq!(list.len(), MAX_STORED);
        assert_eq!(list[0], "p14");
        assert_eq!(list[9], "p5");
    }

    #[tokio::test]
    async fn prune_removes_exactly_the_stale_ids() {
        let (_, recency) = store();
        recency.add("stale").await.unwrap();
        recency.add("live").await.unwrap();

        let valid: HashSet<String> = ["live".to_string()].into_iter().collect();
        recency.prune(&valid).await.unwrap();

        assert_eq!(recency.get().await, vec!["live"]);
    }

    #[tokio::test]
    async fn prune_without_changes_does_not_write() {
        use async_trait::async_trait;
        use std::sync::atomic::{AtomicUsize, Ordering};

        struct CountingStore {
            inner: MemoryStore,
            writes: AtomicUsize,
        }

        #[async_trait]
        impl KeyValueStore for CountingStore {
            async fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
                self.inner.get(key).await
            }
            async fn set(&self, key: &str, value: &str) -> anyhow::Result<()> {
                self.writes.fetch_add(1, Ordering::SeqCst);
                self.inner.set(key, value).await
            }
        }

        let kv = Arc::new(CountingStore {
            inner: MemoryStore::new(),
            writes: AtomicUsize::new(0),
        });
        let recency = RecencyStore::new(kv.clone());
        recency.add("live").await.unwrap();
        let writes_before = kv.writes.load(Ordering::SeqCst);

        let valid: HashSet<String> = ["live".to_string()].into_iter().collect();
        recency.prune(&valid).await.unwrap();

        assert_eq!(kv.writes.load(Ordering::SeqCst), writes_before);
    }

    #[tokio::test]
    async fn corrupt_storage_degrades_to_empty() {
        let (kv, recency) = store();
        kv.set(RECENT_IDS_KEY, "not json").await.unwrap();

        assert!(recency.get().await.is_empty());

        // add still works on top of the corrupt value
        recency.add("p1").await.unwrap();
        assert_eq!(recency.get().await, vec!["p1"]);
    }
}
