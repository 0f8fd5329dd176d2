//! In-memory [`Store`] implementation
//!
//! Collections are insertion-ordered vectors behind a single
//! `tokio::sync::RwLock`, so a commit sees and writes a consistent snapshot
//! across every collection it touches.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::store::{Change, ChangeSet, Row, Store, StoreError};
use crate::ids::new_entity_id;

type Tables = HashMap<String, Vec<Row>>;

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of rows currently held in a collection
    pub async fn row_count(&self, collection: &str) -> usize {
        self.tables
            .read()
            .await
            .get(collection)
            .map_or(0, Vec::len)
    }
}

fn position(tables: &Tables, collection: &str, id: &str) -> Option<usize> {
    tables
        .get(collection)
        .and_then(|rows| rows.iter().position(|row| row.id == id))
}

/// Check every change against the current tables without writing anything
fn validate(tables: &Tables, changes: &ChangeSet) -> Result<(), StoreError> {
    let mut pending_inserts: Vec<(&str, &str)> = Vec::new();
    for change in changes.iter() {
        match change {
            Change::Insert { collection, id, .. } => {
                let taken = position(tables, collection, id).is_some()
                    || pending_inserts.contains(&(*collection, id.as_str()));
                if taken {
                    return Err(StoreError::duplicate(*collection, id.clone()));
                }
                pending_inserts.push((*collection, id.as_str()));
            }
            Change::Update {
                collection,
                id,
                expected_version,
                ..
            }
            | Change::Delete {
                collection,
                id,
                expected_version,
            } => {
                let current = position(tables, collection, id)
                    .and_then(|idx| tables.get(*collection).map(|rows| rows[idx].version));
                if current != Some(*expected_version) {
                    return Err(StoreError::conflict(*collection, id.clone()));
                }
            }
            Change::Exists { collection, id } => {
                if position(tables, collection, id).is_none() {
                    return Err(StoreError::conflict(*collection, id.clone()));
                }
            }
        }
    }
    Ok(())
}

#[async_trait]
impl Store for MemoryStore {
    async fn fetch(&self, collection: &str, id: &str) -> Result<Option<Row>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .get(collection)
            .and_then(|rows| rows.iter().find(|row| row.id == id))
            .cloned())
    }

    async fn scan(&self, collection: &str) -> Result<Vec<Row>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.get(collection).cloned().unwrap_or_default())
    }

    async fn allocate_id(&self, collection: &str, prefix: &str) -> Result<String, StoreError> {
        let tables = self.tables.read().await;
        loop {
            let id = new_entity_id(prefix);
            if position(&tables, collection, &id).is_none() {
                return Ok(id);
            }
        }
    }

    async fn commit(&self, changes: ChangeSet) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        validate(&tables, &changes)?;

        for change in changes {
            match change {
                Change::Insert {
                    collection,
                    id,
                    body,
                } => {
                    tables.entry(collection.to_string()).or_default().push(Row {
                        id,
                        version: 1,
                        body,
                    });
                }
                Change::Update {
                    collection, id, body, ..
                } => {
                    if let Some(row) = tables
                        .get_mut(collection)
                        .and_then(|rows| rows.iter_mut().find(|row| row.id == id))
                    {
                        row.version += 1;
                        row.body = body;
                    }
                }
                Change::Delete { collection, id, .. } => {
                    if let Some(rows) = tables.get_mut(collection) {
                        rows.retain(|row| row.id != id);
                    }
                }
                Change::Exists { .. } => {}
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::store::StoreErrorKind;
    use serde_json::json;

    async fn seeded() -> MemoryStore {
        let store = MemoryStore::new();
        let mut changes = ChangeSet::new();
        changes.insert("movies", "m1", json!({ "id": "m1", "title": "Heat" }));
        changes.insert("movies", "m2", json!({ "id": "m2", "title": "Ronin" }));
        store.commit(changes).await.unwrap();
        store
    }

    #[tokio::test]
    async fn test_scan_keeps_insertion_order() {
        let store = seeded().await;
        let ids: Vec<String> = store
            .scan("movies")
            .await
            .unwrap()
            .into_iter()
            .map(|row| row.id)
            .collect();
        assert_eq!(ids, vec!["m1", "m2"]);
        assert!(store.scan("actors").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_bumps_version() {
        let store = seeded().await;
        let mut changes = ChangeSet::new();
        changes.update("movies", "m1", 1, json!({ "id": "m1", "title": "Heat (1995)" }));
        store.commit(changes).await.unwrap();

        let row = store.fetch("movies", "m1").await.unwrap().unwrap();
        assert_eq!(row.version, 2);
        assert_eq!(row.body["title"], "Heat (1995)");
    }

    #[tokio::test]
    async fn test_stale_version_rejects_whole_change_set() {
        let store = seeded().await;
        let mut changes = ChangeSet::new();
        changes.update("movies", "m1", 1, json!({ "id": "m1", "title": "changed" }));
        changes.delete("movies", "m2", 7);

        let error = store.commit(changes).await.unwrap_err();
        assert_eq!(error.kind, StoreErrorKind::Conflict);
        assert_eq!(error.id.as_deref(), Some("m2"));

        let row = store.fetch("movies", "m1").await.unwrap().unwrap();
        assert_eq!(row.body["title"], "Heat");
        assert_eq!(store.row_count("movies").await, 2);
    }

    #[tokio::test]
    async fn test_update_of_missing_row_conflicts() {
        let store = seeded().await;
        let mut changes = ChangeSet::new();
        changes.update("movies", "gone", 1, json!({ "id": "gone" }));
        let error = store.commit(changes).await.unwrap_err();
        assert_eq!(error.kind, StoreErrorKind::Conflict);
    }

    #[tokio::test]
    async fn test_duplicate_insert() {
        let store = seeded().await;
        let mut changes = ChangeSet::new();
        changes.insert("movies", "m1", json!({ "id": "m1" }));
        let error = store.commit(changes).await.unwrap_err();
        assert_eq!(error.kind, StoreErrorKind::Duplicate);

        let mut changes = ChangeSet::new();
        changes.insert("actors", "a1", json!({ "id": "a1" }));
        changes.insert("actors", "a1", json!({ "id": "a1" }));
        assert!(store.commit(changes).await.is_err());
        assert_eq!(store.row_count("actors").await, 0);
    }

    #[tokio::test]
    async fn test_exists_guards_without_writing() {
        let store = seeded().await;
        let mut changes = ChangeSet::new();
        changes.exists("movies", "m1");
        changes.update("movies", "m2", 1, json!({ "id": "m2", "actorId": "m1" }));
        store.commit(changes).await.unwrap();
        assert_eq!(store.fetch("movies", "m1").await.unwrap().unwrap().version, 1);

        // a newer version still passes, only absence fails
        let mut changes = ChangeSet::new();
        changes.exists("movies", "m2");
        store.commit(changes).await.unwrap();

        let mut changes = ChangeSet::new();
        changes.exists("movies", "gone");
        changes.update("movies", "m1", 1, json!({ "id": "m1", "title": "x" }));
        let error = store.commit(changes).await.unwrap_err();
        assert_eq!(error.kind, StoreErrorKind::Conflict);
        assert_eq!(store.fetch("movies", "m1").await.unwrap().unwrap().version, 1);
    }

    #[tokio::test]
    async fn test_delete_removes_row() {
        let store = seeded().await;
        let mut changes = ChangeSet::new();
        changes.delete("movies", "m1", 1);
        store.commit(changes).await.unwrap();
        assert!(store.fetch("movies", "m1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_allocate_id_uses_prefix() {
        let store = MemoryStore::new();
        let id = store.allocate_id("actors", "actor").await.unwrap();
        assert!(id.starts_with("actor_"));
    }
}
