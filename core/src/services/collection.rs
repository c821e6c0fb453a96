//! Generic entity collection
//!
//! Holds one persisted collection in memory. Every successful mutation
//! queues a rewrite of the full collection; failed mutations leave both
//! memory and storage untouched.

use crate::database::{Entity, Repository};
use crate::error::{AppError, Result};
use std::sync::Arc;
use tokio::sync::RwLock;

/// In-memory collection persisted whole under `T::STORAGE_KEY`
#[derive(Clone)]
pub struct EntityCollection<T: Entity> {
    repo: Repository,
    items: Arc<RwLock<Vec<T>>>,
}

impl<T: Entity> EntityCollection<T> {
    /// Load the collection from storage (empty when absent or malformed)
    pub async fn load(repo: Repository) -> Self {
        let items = repo.load_collection::<T>().await;
        Self::with_items(repo, items)
    }

    pub fn with_items(repo: Repository, items: Vec<T>) -> Self {
        Self {
            repo,
            items: Arc::new(RwLock::new(items)),
        }
    }

    /// Copy of the current records in insertion order
    pub async fn snapshot(&self) -> Vec<T> {
        self.items.read().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.items.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.items.read().await.is_empty()
    }

    pub async fn get(&self, id: &str) -> Result<T> {
        self.items
            .read()
            .await
            .iter()
            .find(|item| item.id() == id)
            .cloned()
            .ok_or_else(|| missing::<T>(id))
    }

    /// Append a record built from the current contents
    pub async fn insert_with<F>(&self, build: F) -> Result<T>
    where
        F: FnOnce(&[T]) -> Result<T>,
    {
        let mut items = self.items.write().await;
        let item = build(&items[..])?;
        items.push(item.clone());
        self.repo.persist_collection(&items[..]);
        Ok(item)
    }

    /// Edit one record by id.
    ///
    /// `edit` works on a copy that replaces the stored record only when it
    /// returns `Ok`.
    pub async fn update<R, F>(&self, id: &str, edit: F) -> Result<R>
    where
        F: FnOnce(&mut T) -> Result<R>,
    {
        let mut items = self.items.write().await;
        let index = items
            .iter()
            .position(|item| item.id() == id)
            .ok_or_else(|| missing::<T>(id))?;

        let mut draft = items[index].clone();
        let result = edit(&mut draft)?;
        items[index] = draft;

        self.repo.persist_collection(&items[..]);
        Ok(result)
    }

    /// Edit many records at once; persisted only when `edit` reports changes
    pub async fn update_all<F>(&self, edit: F) -> usize
    where
        F: FnOnce(&mut [T]) -> usize,
    {
        let mut items = self.items.write().await;
        let changed = edit(&mut items[..]);
        if changed > 0 {
            self.repo.persist_collection(&items[..]);
        }
        changed
    }

    pub async fn remove(&self, id: &str) -> Result<T> {
        let mut items = self.items.write().await;
        let index = items
            .iter()
            .position(|item| item.id() == id)
            .ok_or_else(|| missing::<T>(id))?;

        let removed = items.remove(index);
        self.repo.persist_collection(&items[..]);
        Ok(removed)
    }

    /// Swap in a whole new set of records
    pub async fn replace_all(&self, records: Vec<T>) {
        let mut items = self.items.write().await;
        *items = records;
        self.repo.persist_collection(&items[..]);
    }

    pub fn repo(&self) -> &Repository {
        &self.repo
    }
}

fn missing<T: Entity>(id: &str) -> AppError {
    tracing::warn!("{} not found: {}", T::NAME, id);
    AppError::not_found(T::NAME, id)
}
