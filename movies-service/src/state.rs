//! Application state shared across handlers

use std::sync::Arc;

use crate::config::Config;
use crate::repository::{
    Entity, MemoryStore, Repository, RepositoryResult, RelationshipManager, Store,
};

/// Configuration plus the store every repository reads through
///
/// Cloning is cheap; both fields are reference counted.
#[derive(Clone)]
pub struct AppState {
    config: Arc<Config>,
    store: Arc<dyn Store>,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

impl AppState {
    /// State backed by a fresh in-memory store
    pub fn new(config: Config) -> Self {
        Self::with_store(config, Arc::new(MemoryStore::new()))
    }

    pub fn with_store(config: Config, store: Arc<dyn Store>) -> Self {
        Self {
            config: Arc::new(config),
            store,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }

    pub fn repository<E: Entity>(&self) -> Repository<E> {
        Repository::new(Arc::clone(&self.store))
    }

    /// Manager for the `name` collection of `P`
    pub fn relationship<P: Entity, C: Entity>(
        &self,
        name: &str,
    ) -> RepositoryResult<RelationshipManager<P, C>> {
        RelationshipManager::new(Arc::clone(&self.store), name)
    }
}
