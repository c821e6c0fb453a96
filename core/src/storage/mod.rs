//! Storage module
//!
//! Asynchronous string key-value storage. Keys are namespaced strings
//! (`@todoList`, `@projects`, ...) and values are JSON blobs.
//! No transactions, no schema versioning: last writer wins.

pub mod file_store;
pub mod memory_store;
pub mod write_queue;

pub use file_store::FileStore;
pub use memory_store::MemoryStore;
pub use write_queue::WriteQueue;

use crate::error::Result;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Boxed future returned by store operations
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + Send + 'a>>;

/// Async string key-value store the core persists into
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`, `None` when absent
    fn get<'a>(&'a self, key: &'a str) -> StoreFuture<'a, Option<String>>;

    /// Overwrite the value stored under `key`
    fn set<'a>(&'a self, key: &'a str, value: String) -> StoreFuture<'a, ()>;

    /// Delete `key`; removing an absent key succeeds
    fn remove<'a>(&'a self, key: &'a str) -> StoreFuture<'a, ()>;
}

pub type SharedStore = Arc<dyn KeyValueStore>;
