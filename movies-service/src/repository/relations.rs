//! Connect, disconnect and replace for one-to-many relations
//!
//! Every relation is single-owner: a child row carries the parent's id in a
//! foreign key field, and the parent's collection is derived from it. The
//! [`RelationshipManager`] edits those foreign keys. Each call reads the
//! parent and the children it needs with their versions, stages the edits in
//! one [`ChangeSet`], and commits once.
//!
//! ```rust
//! use std::sync::Arc;
//! use movies_service::models::{Actor, ActorCreateInput, Movie, MovieCreateInput};
//! use movies_service::repository::{MemoryStore, RelationshipManager, Repository, Store};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
//! Repository::<Actor>::new(store.clone())
//!     .create(ActorCreateInput::new("Al", "Pacino").with_id("a1"))
//!     .await
//!     .unwrap();
//! Repository::<Movie>::new(store.clone())
//!     .create(MovieCreateInput::titled("Heat").with_id("m1"))
//!     .await
//!     .unwrap();
//!
//! let filmography = RelationshipManager::<Actor, Movie>::new(store, "movies").unwrap();
//! filmography.connect("a1", &["m1".to_string()]).await.unwrap();
//! # }
//! ```

use std::marker::PhantomData;
use std::sync::Arc;

use serde_json::Value;

use super::crud::{Repository, RepositoryResult};
use super::entity::{Entity, HasMany};
use super::error::{RepositoryError, RepositoryErrorKind, RepositoryOperation};
use super::filter::FilterCondition;
use super::guard::{ConcurrencyGuard, GuardTarget};
use super::query::FindManyArgs;
use super::store::{ChangeSet, Row, Store, StoreError};

/// The id a child row's foreign key currently points at
pub(crate) fn owner_of<'a>(row: &'a Row, foreign_key: &str) -> Option<&'a str> {
    row.body.get(foreign_key).and_then(Value::as_str)
}

fn with_owner(row: &Row, foreign_key: &str, owner: Option<&str>) -> Value {
    let mut body = row.body.clone();
    if let Some(map) = body.as_object_mut() {
        let value = owner.map_or(Value::Null, |id| Value::String(id.to_string()));
        map.insert(foreign_key.to_string(), value);
    }
    body
}

/// Stage edits so that `parent_id` owns exactly the existing rows in `desired`
///
/// Ids with no row are skipped. Returns how many desired rows exist.
pub(crate) async fn stage_replace(
    store: &dyn Store,
    relation: &HasMany,
    parent_id: &str,
    desired: &[String],
    changes: &mut ChangeSet,
) -> Result<usize, StoreError> {
    let mut resolved = 0;
    for row in store.scan(relation.child_collection).await? {
        let owned = owner_of(&row, relation.foreign_key) == Some(parent_id);
        let wanted = desired.iter().any(|id| *id == row.id);
        if wanted {
            resolved += 1;
        }
        let owner = match (owned, wanted) {
            (true, false) => None,
            (false, true) => Some(parent_id),
            _ => continue,
        };
        let body = with_owner(&row, relation.foreign_key, owner);
        changes.update(relation.child_collection, row.id.clone(), row.version, body);
    }
    Ok(resolved)
}

/// Manages the children of parent type `P` held in child type `C`
pub struct RelationshipManager<P, C> {
    store: Arc<dyn Store>,
    relation: &'static HasMany,
    _types: PhantomData<fn() -> (P, C)>,
}

impl<P, C> Clone for RelationshipManager<P, C> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            relation: self.relation,
            _types: PhantomData,
        }
    }
}

impl<P: Entity, C: Entity> RelationshipManager<P, C> {
    /// Bind to the parent's relation called `name`
    ///
    /// Fails when `P` declares no such relation or it does not hold `C`.
    pub fn new(store: Arc<dyn Store>, name: &str) -> RepositoryResult<Self> {
        let relation = P::has_many(name)
            .filter(|relation| relation.child_collection == C::COLLECTION)
            .ok_or_else(|| {
                RepositoryError::internal(
                    RepositoryOperation::FindRelated,
                    format!(
                        "{} has no '{}' relation holding {}",
                        P::ENTITY_TYPE,
                        name,
                        C::ENTITY_TYPE
                    ),
                )
            })?;
        Ok(Self {
            store,
            relation,
            _types: PhantomData,
        })
    }

    /// Point every existing child in `child_ids` at the parent
    ///
    /// Children already attached are left alone, so repeating a connect
    /// changes nothing. Fails with `NotFound` when the parent is missing or
    /// none of the ids exist.
    pub async fn connect(&self, parent_id: &str, child_ids: &[String]) -> RepositoryResult<()> {
        let op = RepositoryOperation::Connect;
        let parent = self.require_parent(parent_id, op).await?;
        let children = self.resolve(child_ids, op).await?;
        if children.is_empty() {
            return Err(self.no_children(child_ids, op));
        }

        let mut changes = ChangeSet::new();
        for child in &children {
            if owner_of(child, self.relation.foreign_key) != Some(parent_id) {
                let body = with_owner(child, self.relation.foreign_key, Some(parent_id));
                changes.update(C::COLLECTION, child.id.clone(), child.version, body);
            }
        }
        self.commit(changes, &parent, op).await
    }

    /// Detach the listed children that the parent currently owns
    ///
    /// Unknown ids and children owned by someone else are ignored.
    pub async fn disconnect(&self, parent_id: &str, child_ids: &[String]) -> RepositoryResult<()> {
        let op = RepositoryOperation::Disconnect;
        let parent = self.require_parent(parent_id, op).await?;
        let children = self.resolve(child_ids, op).await?;

        let mut changes = ChangeSet::new();
        for child in &children {
            if owner_of(child, self.relation.foreign_key) == Some(parent_id) {
                let body = with_owner(child, self.relation.foreign_key, None);
                changes.update(C::COLLECTION, child.id.clone(), child.version, body);
            }
        }
        self.commit(changes, &parent, op).await
    }

    /// Make the parent own exactly the existing children in `child_ids`
    pub async fn replace(&self, parent_id: &str, child_ids: &[String]) -> RepositoryResult<()> {
        let op = RepositoryOperation::Replace;
        let parent = self.require_parent(parent_id, op).await?;

        let mut changes = ChangeSet::new();
        let resolved = stage_replace(
            self.store.as_ref(),
            self.relation,
            parent_id,
            child_ids,
            &mut changes,
        )
        .await
        .map_err(|e| RepositoryError::from_store(op, e).with_entity_type(C::ENTITY_TYPE))?;
        if resolved == 0 {
            return Err(self.no_children(child_ids, op));
        }
        self.commit(changes, &parent, op).await
    }

    /// The parent's children, filtered, sorted and paged like any listing
    pub async fn find_related(&self, parent_id: &str, args: &FindManyArgs) -> RepositoryResult<Vec<C>> {
        let op = RepositoryOperation::FindRelated;
        self.require_parent(parent_id, op).await?;
        let scoped = args
            .clone()
            .with_condition(FilterCondition::eq(self.relation.foreign_key, parent_id));
        Repository::<C>::new(Arc::clone(&self.store))
            .find_many(&scoped)
            .await
            .map_err(|e| e.with_operation(op))
    }

    async fn require_parent(&self, parent_id: &str, op: RepositoryOperation) -> RepositoryResult<Row> {
        self.store
            .fetch(P::COLLECTION, parent_id)
            .await
            .map_err(|e| RepositoryError::from_store(op, e).with_entity_type(P::ENTITY_TYPE))?
            .ok_or_else(|| RepositoryError::not_found(P::ENTITY_TYPE, parent_id).with_operation(op))
    }

    /// Fetch the rows behind `child_ids`, skipping unknown and repeated ids
    async fn resolve(&self, child_ids: &[String], op: RepositoryOperation) -> RepositoryResult<Vec<Row>> {
        let mut rows: Vec<Row> = Vec::with_capacity(child_ids.len());
        for id in child_ids {
            if rows.iter().any(|row| row.id == *id) {
                continue;
            }
            let row = self
                .store
                .fetch(C::COLLECTION, id)
                .await
                .map_err(|e| RepositoryError::from_store(op, e).with_entity_type(C::ENTITY_TYPE))?;
            rows.extend(row);
        }
        Ok(rows)
    }

    /// Commit staged child edits, asserting the parent still exists
    async fn commit(&self, mut changes: ChangeSet, parent: &Row, op: RepositoryOperation) -> RepositoryResult<()> {
        if changes.is_empty() {
            return Ok(());
        }
        let staged = changes.len();
        changes.exists(P::COLLECTION, parent.id.clone());
        ConcurrencyGuard::new(self.store.as_ref())
            .commit(
                changes,
                GuardTarget {
                    entity_type: P::ENTITY_TYPE,
                    collection: P::COLLECTION,
                    id: &parent.id,
                },
                op,
            )
            .await?;
        tracing::debug!(
            entity = P::ENTITY_TYPE,
            id = %parent.id,
            relation = self.relation.name,
            operation = %op,
            changed = staged,
            "Relationship updated"
        );
        Ok(())
    }

    fn no_children(&self, child_ids: &[String], op: RepositoryOperation) -> RepositoryError {
        let mut error = RepositoryError::new(
            op,
            RepositoryErrorKind::NotFound,
            format!("None of the requested {} exist", self.relation.name),
        )
        .with_entity_type(C::ENTITY_TYPE);
        if !child_ids.is_empty() {
            error.entity_id = Some(child_ids.join(","));
        }
        error
    }
}
