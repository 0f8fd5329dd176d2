//! Persistence seam for the query and relationship engine
//!
//! A [`Store`] holds named collections of versioned JSON [`Row`]s. Reads hand
//! back the version alongside the body; writes are grouped into a
//! [`ChangeSet`] that the store applies atomically, rejecting the whole set
//! when any row's version no longer matches what the caller read.

use std::fmt;

use async_trait::async_trait;
use serde_json::Value;

/// A stored entity: its id, optimistic version, and persisted JSON body
///
/// The body is always a JSON object and includes the `id` field. Derived
/// collections are never part of it.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub id: String,
    pub version: u64,
    pub body: Value,
}

/// One write inside a [`ChangeSet`]
#[derive(Debug, Clone, PartialEq)]
pub enum Change {
    Insert {
        collection: &'static str,
        id: String,
        body: Value,
    },
    Update {
        collection: &'static str,
        id: String,
        expected_version: u64,
        body: Value,
    },
    Delete {
        collection: &'static str,
        id: String,
        expected_version: u64,
    },
    /// Assert a row is still present without writing it
    Exists { collection: &'static str, id: String },
}

impl Change {
    pub fn collection(&self) -> &'static str {
        match self {
            Self::Insert { collection, .. }
            | Self::Update { collection, .. }
            | Self::Delete { collection, .. }
            | Self::Exists { collection, .. } => collection,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            Self::Insert { id, .. }
            | Self::Update { id, .. }
            | Self::Delete { id, .. }
            | Self::Exists { id, .. } => id,
        }
    }
}

/// Writes committed together or not at all
///
/// ```rust
/// use movies_service::repository::ChangeSet;
/// use serde_json::json;
///
/// let mut changes = ChangeSet::new();
/// changes.insert("actors", "a1", json!({ "id": "a1" }));
/// changes.update("movies", "m1", 3, json!({ "id": "m1", "actorId": "a1" }));
/// assert_eq!(changes.len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChangeSet {
    changes: Vec<Change>,
}

impl ChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, collection: &'static str, id: impl Into<String>, body: Value) {
        self.changes.push(Change::Insert {
            collection,
            id: id.into(),
            body,
        });
    }

    pub fn update(
        &mut self,
        collection: &'static str,
        id: impl Into<String>,
        expected_version: u64,
        body: Value,
    ) {
        self.changes.push(Change::Update {
            collection,
            id: id.into(),
            expected_version,
            body,
        });
    }

    pub fn delete(&mut self, collection: &'static str, id: impl Into<String>, expected_version: u64) {
        self.changes.push(Change::Delete {
            collection,
            id: id.into(),
            expected_version,
        });
    }

    /// Fail the commit if the row has been deleted
    pub fn exists(&mut self, collection: &'static str, id: impl Into<String>) {
        self.changes.push(Change::Exists {
            collection,
            id: id.into(),
        });
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Change> {
        self.changes.iter()
    }
}

impl IntoIterator for ChangeSet {
    type Item = Change;
    type IntoIter = std::vec::IntoIter<Change>;

    fn into_iter(self) -> Self::IntoIter {
        self.changes.into_iter()
    }
}

/// Category of store failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreErrorKind {
    /// A row's version changed, or the row vanished, after it was read
    Conflict,
    /// An insert collided with an existing id
    Duplicate,
    /// The store could not serve the request
    Unavailable,
}

impl fmt::Display for StoreErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Conflict => write!(f, "conflict"),
            Self::Duplicate => write!(f, "duplicate"),
            Self::Unavailable => write!(f, "unavailable"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreError {
    pub kind: StoreErrorKind,
    pub message: String,
    pub collection: Option<String>,
    pub id: Option<String>,
}

impl StoreError {
    pub fn conflict(collection: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            kind: StoreErrorKind::Conflict,
            message: "Row version changed since it was read".to_string(),
            collection: Some(collection.into()),
            id: Some(id.into()),
        }
    }

    pub fn duplicate(collection: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            kind: StoreErrorKind::Duplicate,
            message: "Row with this id already exists".to_string(),
            collection: Some(collection.into()),
            id: Some(id.into()),
        }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self {
            kind: StoreErrorKind::Unavailable,
            message: message.into(),
            collection: None,
            id: None,
        }
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Store {} error: {}", self.kind, self.message)?;
        if let (Some(collection), Some(id)) = (&self.collection, &self.id) {
            write!(f, " [{}/{}]", collection, id)?;
        }
        Ok(())
    }
}

impl std::error::Error for StoreError {}

/// Versioned document storage shared by every repository
///
/// Implementations must deliver `scan` results in a stable order and apply
/// `commit` atomically: every `Update`/`Delete` version and every `Exists`
/// row is checked before anything is written, and a failed check or
/// duplicate insert leaves all collections untouched.
#[async_trait]
pub trait Store: Send + Sync {
    /// Fetch one row by id
    async fn fetch(&self, collection: &str, id: &str) -> Result<Option<Row>, StoreError>;

    /// Every row in the collection, in the store's natural order
    async fn scan(&self, collection: &str) -> Result<Vec<Row>, StoreError>;

    /// Allocate an id for a row the caller did not name
    async fn allocate_id(&self, collection: &str, prefix: &str) -> Result<String, StoreError>;

    /// Apply every change in the set, or none of them
    async fn commit(&self, changes: ChangeSet) -> Result<(), StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_change_accessors() {
        let mut changes = ChangeSet::new();
        changes.delete("reviews", "r1", 2);
        let change = changes.iter().next().unwrap();
        assert_eq!(change.collection(), "reviews");
        assert_eq!(change.id(), "r1");
    }

    #[test]
    fn test_change_set_preserves_order() {
        let mut changes = ChangeSet::new();
        changes.insert("movies", "m1", json!({ "id": "m1" }));
        changes.delete("movies", "m2", 1);
        let ids: Vec<String> = changes.into_iter().map(|c| c.id().to_string()).collect();
        assert_eq!(ids, vec!["m1", "m2"]);
    }

    #[test]
    fn test_store_error_display() {
        let error = StoreError::conflict("movies", "m1");
        assert_eq!(
            error.to_string(),
            "Store conflict error: Row version changed since it was read [movies/m1]"
        );
        assert_eq!(
            StoreError::unavailable("closed").to_string(),
            "Store unavailable error: closed"
        );
    }
}
