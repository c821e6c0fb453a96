//! Repository layer over the key-value store
//!
//! Collections are read once at startup and rewritten whole after every
//! mutation. Reads degrade to empty on any failure; writes go through the
//! per-key [`WriteQueue`] and never block the caller.

use super::Entity;
use crate::error::Result;
use crate::storage::{SharedStore, WriteQueue};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Repository for persisted collections and records
#[derive(Clone)]
pub struct Repository {
    store: SharedStore,
    writes: WriteQueue,
}

impl Repository {
    pub fn new(store: SharedStore) -> Self {
        let writes = WriteQueue::new(store.clone());
        Self { store, writes }
    }

    /// Load a full collection.
    ///
    /// Absent keys, unreadable stores and malformed JSON all yield an
    /// empty collection; the latter two are logged.
    pub async fn load_collection<T: Entity>(&self) -> Vec<T> {
        match self.load_record::<Vec<T>>(T::STORAGE_KEY).await {
            Some(items) => {
                tracing::debug!("Loaded {} {} record(s)", items.len(), T::NAME);
                items
            }
            None => Vec::new(),
        }
    }

    /// Queue a rewrite of the whole collection
    pub fn persist_collection<T: Entity>(&self, items: &[T]) {
        self.persist_record(T::STORAGE_KEY, items);
    }

    /// Load a single JSON record, `None` when absent or unreadable
    pub async fn load_record<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = match self.store.get(key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                tracing::error!("Failed to read {}: {}", key, e);
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!("Ignoring malformed data under {}: {}", key, e);
                None
            }
        }
    }

    /// Queue a write of a single JSON record
    pub fn persist_record<T: Serialize + ?Sized>(&self, key: &str, value: &T) {
        match serde_json::to_string(value) {
            Ok(json) => self.writes.set(key, json),
            Err(e) => tracing::error!("Failed to serialize {}: {}", key, e),
        }
    }

    /// Queue removal of a key
    pub fn remove_record(&self, key: &str) {
        self.writes.remove(key);
    }

    /// Read a raw value straight from the store
    pub async fn read_raw(&self, key: &str) -> Result<Option<String>> {
        self.store.get(key).await
    }

    /// Wait for every queued write to be attempted
    pub async fn flush(&self) {
        self.writes.flush().await;
    }

    /// Number of writes that failed since startup
    pub fn failed_writes(&self) -> usize {
        self.writes.failure_count()
    }
}
