//! Store doubles for exercising conflict handling

use async_trait::async_trait;

use super::memory::MemoryStore;
use super::store::{ChangeSet, Row, Store, StoreError};

/// What happens to the store just before the next commit runs
#[derive(Debug, Clone)]
pub enum Interference {
    None,
    /// Rewrite the row unchanged so its version moves on
    Touch(&'static str, &'static str),
    /// Delete the row out from under the caller
    Remove(&'static str, &'static str),
    /// Fail the commit outright
    Fail(StoreError),
}

/// Wraps a [`MemoryStore`] and races one writer against the next commit
pub struct InterferingStore {
    inner: MemoryStore,
    interference: tokio::sync::Mutex<Interference>,
}

impl InterferingStore {
    pub fn new(inner: MemoryStore, interference: Interference) -> Self {
        Self {
            inner,
            interference: tokio::sync::Mutex::new(interference),
        }
    }

    async fn current_row(&self, collection: &str, id: &str) -> Option<Row> {
        self.inner.fetch(collection, id).await.ok().flatten()
    }
}

#[async_trait]
impl Store for InterferingStore {
    async fn fetch(&self, collection: &str, id: &str) -> Result<Option<Row>, StoreError> {
        self.inner.fetch(collection, id).await
    }

    async fn scan(&self, collection: &str) -> Result<Vec<Row>, StoreError> {
        self.inner.scan(collection).await
    }

    async fn allocate_id(&self, collection: &str, prefix: &str) -> Result<String, StoreError> {
        self.inner.allocate_id(collection, prefix).await
    }

    async fn commit(&self, changes: ChangeSet) -> Result<(), StoreError> {
        let interference = std::mem::replace(&mut *self.interference.lock().await, Interference::None);
        match interference {
            Interference::None => {}
            Interference::Touch(collection, id) => {
                if let Some(row) = self.current_row(collection, id).await {
                    let mut touch = ChangeSet::new();
                    touch.update(collection, id, row.version, row.body);
                    self.inner.commit(touch).await?;
                }
            }
            Interference::Remove(collection, id) => {
                if let Some(row) = self.current_row(collection, id).await {
                    let mut remove = ChangeSet::new();
                    remove.delete(collection, id, row.version);
                    self.inner.commit(remove).await?;
                }
            }
            Interference::Fail(error) => return Err(error),
        }
        self.inner.commit(changes).await
    }
}
