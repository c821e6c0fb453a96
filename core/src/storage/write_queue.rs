//! Per-key single-flight write queue
//!
//! Mutations persist without blocking the caller. Writes to the same key
//! never interleave: at most one write per key is in flight, and a newer
//! value replaces a pending one that has not started yet. Failures are
//! logged and counted, never retried.

use super::SharedStore;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::Notify;

/// A write waiting for its key to become free
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingWrite {
    Set(String),
    Remove,
}

#[derive(Default)]
struct KeySlot {
    pending: Option<PendingWrite>,
    running: bool,
}

/// Background writer shared by every collection
#[derive(Clone)]
pub struct WriteQueue {
    store: SharedStore,
    // Only held for map bookkeeping, never across an await
    slots: Arc<Mutex<HashMap<String, KeySlot>>>,
    idle: Arc<Notify>,
    failures: Arc<AtomicUsize>,
}

impl WriteQueue {
    pub fn new(store: SharedStore) -> Self {
        Self {
            store,
            slots: Arc::new(Mutex::new(HashMap::new())),
            idle: Arc::new(Notify::new()),
            failures: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Queue `value` to be written under `key`
    pub fn set(&self, key: &str, value: String) {
        self.enqueue(key, PendingWrite::Set(value));
    }

    /// Queue removal of `key`
    pub fn remove(&self, key: &str) {
        self.enqueue(key, PendingWrite::Remove);
    }

    /// Wait until every queued write has been attempted
    pub async fn flush(&self) {
        loop {
            let notified = self.idle.notified();
            if self.is_idle() {
                return;
            }
            notified.await;
        }
    }

    /// Whether no key has a write running or pending
    pub fn is_idle(&self) -> bool {
        self.lock_slots().is_empty()
    }

    /// Number of writes that failed since startup
    pub fn failure_count(&self) -> usize {
        self.failures.load(Ordering::SeqCst)
    }

    fn enqueue(&self, key: &str, write: PendingWrite) {
        let start_worker = {
            let mut slots = self.lock_slots();
            let slot = slots.entry(key.to_string()).or_default();

            if slot.pending.is_some() {
                tracing::debug!("Superseding pending write for {}", key);
            }
            slot.pending = Some(write);

            if slot.running {
                false
            } else {
                slot.running = true;
                true
            }
        };

        if start_worker {
            let queue = self.clone();
            let key = key.to_string();
            tokio::spawn(async move { queue.drain(key).await });
        }
    }

    async fn drain(self, key: String) {
        loop {
            let next = {
                let mut slots = self.lock_slots();
                let next = slots.get_mut(&key).and_then(|slot| slot.pending.take());
                if next.is_none() {
                    slots.remove(&key);
                }
                next
            };

            let Some(write) = next else {
                self.idle.notify_waiters();
                return;
            };

            let result = match write {
                PendingWrite::Set(value) => self.store.set(&key, value).await,
                PendingWrite::Remove => self.store.remove(&key).await,
            };

            if let Err(e) = result {
                self.failures.fetch_add(1, Ordering::SeqCst);
                tracing::error!("Failed to persist {}: {}", key, e);
            }
        }
    }

    fn lock_slots(&self) -> MutexGuard<'_, HashMap<String, KeySlot>> {
        self.slots.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{KeyValueStore, MemoryStore, StoreFuture};
    use tokio::sync::Semaphore;

    /// Store whose writes block until a permit is released
    struct GatedStore {
        gate: Semaphore,
        writes: Mutex<Vec<String>>,
    }

    impl KeyValueStore for GatedStore {
        fn get<'a>(&'a self, _key: &'a str) -> StoreFuture<'a, Option<String>> {
            Box::pin(async { Ok(None) })
        }

        fn set<'a>(&'a self, _key: &'a str, value: String) -> StoreFuture<'a, ()> {
            Box::pin(async move {
                let permit = self.gate.acquire().await.unwrap();
                permit.forget();
                self.writes.lock().unwrap().push(value);
                Ok(())
            })
        }

        fn remove<'a>(&'a self, _key: &'a str) -> StoreFuture<'a, ()> {
            Box::pin(async { Ok(()) })
        }
    }

    #[tokio::test]
    async fn test_last_write_wins() {
        let store = Arc::new(MemoryStore::new());
        let queue = WriteQueue::new(store.clone());

        for i in 0..10 {
            queue.set("@todoList", format!("[{}]", i));
        }
        queue.flush().await;

        assert_eq!(
            store.get("@todoList").await.unwrap().as_deref(),
            Some("[9]")
        );
        assert!(queue.is_idle());
    }

    #[tokio::test]
    async fn test_pending_write_is_superseded() {
        let store = Arc::new(GatedStore {
            gate: Semaphore::new(0),
            writes: Mutex::new(Vec::new()),
        });
        let queue = WriteQueue::new(store.clone());

        queue.set("@habits", "v1".to_string());
        // Let the worker start v1 and block on the gate
        tokio::task::yield_now().await;

        queue.set("@habits", "v2".to_string());
        queue.set("@habits", "v3".to_string());

        store.gate.add_permits(10);
        queue.flush().await;

        assert_eq!(*store.writes.lock().unwrap(), vec!["v1", "v3"]);
    }

    #[tokio::test]
    async fn test_remove_after_set() {
        let store = Arc::new(MemoryStore::new());
        let queue = WriteQueue::new(store.clone());

        queue.set("@loggedInUser", "{}".to_string());
        queue.remove("@loggedInUser");
        queue.flush().await;

        assert!(store.get("@loggedInUser").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_failures_are_counted_not_fatal() {
        let store = Arc::new(MemoryStore::new());
        store.set_unavailable(true);
        let queue = WriteQueue::new(store.clone());

        queue.set("@projects", "[]".to_string());
        queue.flush().await;

        assert_eq!(queue.failure_count(), 1);
        assert!(queue.is_idle());
    }

    #[tokio::test]
    async fn test_flush_when_idle_returns() {
        let queue = WriteQueue::new(Arc::new(MemoryStore::new()));
        queue.flush().await;
    }
}
