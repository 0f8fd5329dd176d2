//! Generic repository over one entity collection
//!
//! [`Repository<E>`] implements create, delete, find-many, count, find-one and
//! merge-update for any [`Entity`]. Stored rows are JSON objects; derived
//! collections are rebuilt from the children's foreign keys on every read.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use movies_service::models::{Actor, ActorCreateInput};
//! use movies_service::repository::{FindManyArgs, MemoryStore, Repository, SortSpec};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let actors = Repository::<Actor>::new(Arc::new(MemoryStore::new()));
//!
//! let created = actors
//!     .create(ActorCreateInput::new("Robert", "De Niro"))
//!     .await
//!     .unwrap();
//! assert!(created.id.starts_with("actor_"));
//!
//! let listed = actors
//!     .find_many(&FindManyArgs::new().with_sort(SortSpec::asc("lastName")))
//!     .await
//!     .unwrap();
//! assert_eq!(listed.len(), 1);
//! # }
//! ```

use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use serde_json::{Map, Value};

use super::entity::{reference_ids, Entity, HasMany};
use super::error::{RepositoryError, RepositoryErrorKind, RepositoryOperation};
use super::filter::{Filter, FilterCondition, FilterEvaluator};
use super::guard::{ConcurrencyGuard, GuardTarget};
use super::query::FindManyArgs;
use super::relations::{owner_of, stage_replace};
use super::sort::Sorter;
use super::store::{ChangeSet, Row, Store, StoreError};

pub type RepositoryResult<T> = std::result::Result<T, RepositoryError>;

pub struct Repository<E> {
    store: Arc<dyn Store>,
    _entity: PhantomData<fn() -> E>,
}

impl<E> Clone for Repository<E> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            _entity: PhantomData,
        }
    }
}

impl<E: Entity> Repository<E> {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self {
            store,
            _entity: PhantomData,
        }
    }

    pub fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }

    /// Create an entity and return it as stored
    ///
    /// A caller-supplied id is used as-is; otherwise the store assigns one.
    /// Foreign keys naming a missing owner are dropped, and collection members
    /// that do not exist are ignored. Reusing an existing id fails with
    /// `AlreadyExists`.
    pub async fn create(&self, input: E::Create) -> RepositoryResult<E> {
        let op = RepositoryOperation::Create;
        let mut body = to_object(&input, op)?;

        let id = match body.remove("id") {
            None | Some(Value::Null) => self
                .store
                .allocate_id(E::COLLECTION, E::ID_PREFIX)
                .await
                .map_err(|e| self.store_error(op, e))?,
            Some(Value::String(id)) if !id.is_empty() => id,
            Some(_) => {
                return Err(RepositoryError::validation_failed(
                    op,
                    "id must be a non-empty string",
                )
                .with_entity_type(E::ENTITY_TYPE))
            }
        };

        let memberships = take_memberships::<E>(&mut body);

        let now = serde_json::to_value(Utc::now())
            .map_err(|e| RepositoryError::internal(op, e.to_string()))?;
        for field in E::TIMESTAMPS {
            if body.get(*field).map_or(true, Value::is_null) {
                body.insert((*field).to_string(), now.clone());
            }
        }

        let mut changes = ChangeSet::new();
        let foreign_keys: Vec<&str> = E::BELONGS_TO.iter().map(|b| b.foreign_key).collect();
        self.resolve_owners(&mut body, &foreign_keys, &mut changes, op)
            .await?;
        body.insert("id".to_string(), Value::String(id.clone()));
        let body = Value::Object(body);
        check_shape::<E>(&body, &id, op)?;

        changes.insert(E::COLLECTION, id.clone(), body);
        for (relation, members) in &memberships {
            stage_replace(self.store.as_ref(), relation, &id, members, &mut changes)
                .await
                .map_err(|e| self.store_error(op, e))?;
        }

        self.store
            .commit(changes)
            .await
            .map_err(|e| RepositoryError::from_store(op, e).with_entity(E::ENTITY_TYPE, &id))?;
        tracing::debug!(entity = E::ENTITY_TYPE, id = %id, "Entity created");

        self.find_one(&id).await.map_err(|e| e.with_operation(op))
    }

    /// Delete an entity, clearing the foreign key of every child it owned
    pub async fn delete(&self, id: &str) -> RepositoryResult<()> {
        let op = RepositoryOperation::Delete;
        let row = self.fetch_existing(id, op).await?;

        let mut changes = ChangeSet::new();
        changes.delete(E::COLLECTION, id, row.version);
        for relation in E::HAS_MANY {
            stage_replace(self.store.as_ref(), relation, id, &[], &mut changes)
                .await
                .map_err(|e| self.store_error(op, e))?;
        }

        ConcurrencyGuard::new(self.store.as_ref())
            .commit(changes, self.target(id), op)
            .await?;
        tracing::debug!(entity = E::ENTITY_TYPE, id = %id, "Entity deleted");
        Ok(())
    }

    /// Filter, then sort, then page
    pub async fn find_many(&self, args: &FindManyArgs) -> RepositoryResult<Vec<E>> {
        let op = RepositoryOperation::FindMany;
        args.pagination.bounds().map_err(|e| self.tag(e, op))?;
        let sorter = args
            .sort
            .as_ref()
            .map(|spec| Sorter::new(spec, E::FIELDS))
            .transpose()
            .map_err(|e| self.tag(e, op))?;

        let mut rows = self.select(&args.filter, op).await?;
        if let Some(sorter) = sorter {
            sorter.sort(&mut rows);
        }
        let rows = args.pagination.apply(rows).map_err(|e| self.tag(e, op))?;
        self.materialize(rows, op).await
    }

    /// Number of entities matching `filter`
    pub async fn count(&self, filter: &Filter) -> RepositoryResult<usize> {
        Ok(self.select(filter, RepositoryOperation::Count).await?.len())
    }

    /// The entity with this id
    pub async fn find_one(&self, id: &str) -> RepositoryResult<E> {
        let op = RepositoryOperation::FindOne;
        let args = FindManyArgs::new().with_condition(FilterCondition::eq("id", id));
        self.find_many(&args)
            .await
            .map_err(|e| e.with_operation(op))?
            .into_iter()
            .next()
            .ok_or_else(|| RepositoryError::not_found(E::ENTITY_TYPE, id))
    }

    pub async fn exists(&self, id: &str) -> RepositoryResult<bool> {
        Ok(self
            .store
            .fetch(E::COLLECTION, id)
            .await
            .map_err(|e| self.store_error(RepositoryOperation::Exists, e))?
            .is_some())
    }

    /// Merge the fields present in `input` into the stored entity
    ///
    /// Absent fields are left alone, explicit nulls clear optional fields.
    /// A foreign key set to a missing owner is cleared. A collection field
    /// replaces the entity's members. Conflicting writers are resolved by the
    /// [`ConcurrencyGuard`].
    pub async fn update(&self, id: &str, input: E::Update) -> RepositoryResult<()> {
        let op = RepositoryOperation::Update;
        let row = self.fetch_existing(id, op).await?;
        let patch = to_object(&input, op)?;

        let Value::Object(mut body) = row.body else {
            return Err(self.corrupt(id, op));
        };

        let mut touched: Vec<String> = Vec::new();
        let mut memberships: Vec<(&'static HasMany, Vec<String>)> = Vec::new();
        for (key, value) in patch {
            if key == "id" {
                continue;
            }
            if let Some(relation) = E::has_many(&key) {
                memberships.push((relation, reference_ids(&value)));
                continue;
            }
            touched.push(key.clone());
            body.insert(key, value);
        }

        let mut changes = ChangeSet::new();
        let touched: Vec<&str> = touched.iter().map(String::as_str).collect();
        self.resolve_owners(&mut body, &touched, &mut changes, op)
            .await?;
        let body = Value::Object(body);
        check_shape::<E>(&body, id, op)?;

        changes.update(E::COLLECTION, id, row.version, body);
        for (relation, members) in &memberships {
            stage_replace(self.store.as_ref(), relation, id, members, &mut changes)
                .await
                .map_err(|e| self.store_error(op, e))?;
        }

        ConcurrencyGuard::new(self.store.as_ref())
            .commit(changes, self.target(id), op)
            .await?;
        tracing::debug!(entity = E::ENTITY_TYPE, id = %id, "Entity updated");
        Ok(())
    }

    /// The entity that owns this one through the named single-owner relation
    pub async fn find_owner<O: Entity>(&self, id: &str, relation: &str) -> RepositoryResult<O> {
        let op = RepositoryOperation::FindOwner;
        let belongs_to = E::BELONGS_TO
            .iter()
            .find(|b| b.relation == relation && b.owner_collection == O::COLLECTION)
            .ok_or_else(|| {
                RepositoryError::internal(
                    op,
                    format!("{} has no '{}' relation to {}", E::ENTITY_TYPE, relation, O::ENTITY_TYPE),
                )
            })?;

        let row = self.fetch_existing(id, op).await?;
        let owner_id = owner_of(&row, belongs_to.foreign_key).ok_or_else(|| {
            RepositoryError::new(
                op,
                RepositoryErrorKind::NotFound,
                format!("{} has no {}", E::ENTITY_TYPE, relation),
            )
            .with_entity(E::ENTITY_TYPE, id)
        })?;

        Repository::<O>::new(Arc::clone(&self.store))
            .find_one(owner_id)
            .await
            .map_err(|e| e.with_operation(op))
    }

    async fn fetch_existing(&self, id: &str, op: RepositoryOperation) -> RepositoryResult<Row> {
        self.store
            .fetch(E::COLLECTION, id)
            .await
            .map_err(|e| self.store_error(op, e))?
            .ok_or_else(|| RepositoryError::not_found(E::ENTITY_TYPE, id).with_operation(op))
    }

    async fn select(&self, filter: &Filter, op: RepositoryOperation) -> RepositoryResult<Vec<Row>> {
        let evaluator = FilterEvaluator::new(filter, E::FIELDS).map_err(|e| self.tag(e, op))?;
        let rows = self
            .store
            .scan(E::COLLECTION)
            .await
            .map_err(|e| self.store_error(op, e))?;
        Ok(rows
            .into_iter()
            .filter(|row| evaluator.matches(&row.body))
            .collect())
    }

    /// Attach derived collections and deserialize
    async fn materialize(&self, rows: Vec<Row>, op: RepositoryOperation) -> RepositoryResult<Vec<E>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let mut members: Vec<(&'static HasMany, HashMap<String, Vec<String>>)> = Vec::new();
        for relation in E::HAS_MANY {
            let children = self
                .store
                .scan(relation.child_collection)
                .await
                .map_err(|e| self.store_error(op, e))?;
            let mut by_owner: HashMap<String, Vec<String>> = HashMap::new();
            for child in children {
                if let Some(owner) = owner_of(&child, relation.foreign_key) {
                    by_owner.entry(owner.to_string()).or_default().push(child.id);
                }
            }
            members.push((relation, by_owner));
        }

        rows.into_iter()
            .map(|Row { id, mut body, .. }| {
                let Some(map) = body.as_object_mut() else {
                    return Err(self.corrupt(&id, op));
                };
                for (relation, by_owner) in &members {
                    let ids = by_owner.get(&id).cloned().unwrap_or_default();
                    map.insert(relation.name.to_string(), Value::from(ids));
                }
                serde_json::from_value(body).map_err(|e| {
                    RepositoryError::internal(op, format!("Stored row is unreadable: {}", e))
                        .with_entity(E::ENTITY_TYPE, &id)
                })
            })
            .collect()
    }

    /// Clear foreign keys among `keys` whose owner does not exist
    ///
    /// Owners that do exist are staged as existence checks so a concurrent
    /// delete of the owner fails the commit.
    async fn resolve_owners(
        &self,
        body: &mut Map<String, Value>,
        keys: &[&str],
        changes: &mut ChangeSet,
        op: RepositoryOperation,
    ) -> RepositoryResult<()> {
        for belongs_to in E::BELONGS_TO {
            if !keys.contains(&belongs_to.foreign_key) {
                continue;
            }
            let owner = match body.get(belongs_to.foreign_key) {
                Some(Value::String(owner)) => self
                    .store
                    .fetch(belongs_to.owner_collection, owner)
                    .await
                    .map_err(|e| self.store_error(op, e))?,
                _ => None,
            };
            match owner {
                Some(owner) => changes.exists(belongs_to.owner_collection, owner.id),
                None => {
                    body.insert(belongs_to.foreign_key.to_string(), Value::Null);
                }
            }
        }
        Ok(())
    }

    fn target<'a>(&self, id: &'a str) -> GuardTarget<'a> {
        GuardTarget {
            entity_type: E::ENTITY_TYPE,
            collection: E::COLLECTION,
            id,
        }
    }

    fn tag(&self, error: RepositoryError, op: RepositoryOperation) -> RepositoryError {
        error.with_operation(op).with_entity_type(E::ENTITY_TYPE)
    }

    fn store_error(&self, op: RepositoryOperation, error: StoreError) -> RepositoryError {
        RepositoryError::from_store(op, error).with_entity_type(E::ENTITY_TYPE)
    }

    fn corrupt(&self, id: &str, op: RepositoryOperation) -> RepositoryError {
        RepositoryError::internal(op, "Stored row is not a JSON object").with_entity(E::ENTITY_TYPE, id)
    }
}

fn to_object<T: Serialize>(input: &T, op: RepositoryOperation) -> RepositoryResult<Map<String, Value>> {
    match serde_json::to_value(input) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(RepositoryError::validation_failed(op, "Payload must be a JSON object")),
        Err(e) => Err(RepositoryError::validation_failed(op, e.to_string())),
    }
}

/// Pull collection fields out of a payload, leaving only persisted fields
fn take_memberships<E: Entity>(body: &mut Map<String, Value>) -> Vec<(&'static HasMany, Vec<String>)> {
    let mut memberships = Vec::new();
    for relation in E::HAS_MANY {
        if let Some(value) = body.remove(relation.name) {
            if !value.is_null() {
                memberships.push((relation, reference_ids(&value)));
            }
        }
    }
    memberships
}

/// Reject a body that would not read back as `E`
fn check_shape<E: Entity>(body: &Value, id: &str, op: RepositoryOperation) -> RepositoryResult<()> {
    let mut candidate = body.clone();
    if let Some(map) = candidate.as_object_mut() {
        for relation in E::HAS_MANY {
            map.insert(relation.name.to_string(), Value::Array(Vec::new()));
        }
    }
    serde_json::from_value::<E>(candidate).map(|_| ()).map_err(|e| {
        RepositoryError::validation_failed(op, e.to_string()).with_entity(E::ENTITY_TYPE, id)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        Actor, ActorCreateInput, ActorUpdateInput, Movie, MovieCreateInput, MovieUpdateInput,
        Review, ReviewCreateInput,
    };
    use crate::repository::testing::{Interference, InterferingStore};
    use crate::repository::{
        EntityRef, MemoryStore, Pagination, Patch, RepositoryErrorKind, SortSpec,
    };
    use chrono::TimeZone;

    fn store() -> Arc<dyn Store> {
        Arc::new(MemoryStore::new())
    }

    async fn actor(store: &Arc<dyn Store>, id: &str, first: &str, last: &str) -> Actor {
        Repository::<Actor>::new(Arc::clone(store))
            .create(ActorCreateInput::new(first, last).with_id(id))
            .await
            .unwrap()
    }

    async fn movie(store: &Arc<dyn Store>, id: &str, title: &str) -> Movie {
        Repository::<Movie>::new(Arc::clone(store))
            .create(MovieCreateInput::titled(title).with_id(id))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_create_assigns_id_and_timestamps() {
        let store = store();
        let actors = Repository::<Actor>::new(store);
        let created = actors
            .create(ActorCreateInput::new("Al", "Pacino"))
            .await
            .unwrap();

        assert!(created.id.starts_with("actor_"));
        assert_eq!(created.created_at, created.updated_at);
        assert!(created.movies.is_empty());
    }

    #[tokio::test]
    async fn test_create_keeps_supplied_timestamps() {
        let store = store();
        let stamp = Utc.with_ymd_and_hms(2001, 2, 3, 4, 5, 6).unwrap();
        let mut input = ActorCreateInput::new("Al", "Pacino");
        input.created_at = Some(stamp);
        let created = Repository::<Actor>::new(store).create(input).await.unwrap();
        assert_eq!(created.created_at, stamp);
        assert_ne!(created.updated_at, stamp);
    }

    #[tokio::test]
    async fn test_create_with_colliding_id_is_already_exists() {
        let store = store();
        actor(&store, "a1", "Al", "Pacino").await;
        let error = Repository::<Actor>::new(store)
            .create(ActorCreateInput::new("Val", "Kilmer").with_id("a1"))
            .await
            .unwrap_err();
        assert_eq!(error.kind, RepositoryErrorKind::AlreadyExists);
        assert_eq!(error.operation, RepositoryOperation::Create);
    }

    #[tokio::test]
    async fn test_create_rejects_empty_id() {
        let error = Repository::<Actor>::new(store())
            .create(ActorCreateInput::new("Al", "Pacino").with_id(""))
            .await
            .unwrap_err();
        assert_eq!(error.kind, RepositoryErrorKind::ValidationFailed);
    }

    #[tokio::test]
    async fn test_create_drops_unknown_owner() {
        let store = store();
        let mut input = MovieCreateInput::titled("Heat").with_id("m1");
        input.actor_id = Some("nobody".to_string());
        let created = Repository::<Movie>::new(store).create(input).await.unwrap();
        assert_eq!(created.actor_id, None);
    }

    #[tokio::test]
    async fn test_create_with_members_ignores_missing() {
        let store = store();
        movie(&store, "m1", "Heat").await;
        let mut input = ActorCreateInput::new("Al", "Pacino").with_id("a1");
        input.movies = Some(vec![EntityRef::new("m1"), EntityRef::new("ghost")]);

        let created = Repository::<Actor>::new(Arc::clone(&store))
            .create(input)
            .await
            .unwrap();
        assert_eq!(created.movies, vec!["m1"]);

        let heat = Repository::<Movie>::new(store).find_one("m1").await.unwrap();
        assert_eq!(heat.actor_id.as_deref(), Some("a1"));
    }

    #[tokio::test]
    async fn test_find_many_filter_sort_page() {
        let store = store();
        actor(&store, "a1", "Robert", "De Niro").await;
        actor(&store, "a2", "Al", "Pacino").await;
        actor(&store, "a3", "Robert", "Duvall").await;
        let actors = Repository::<Actor>::new(store);

        let args = FindManyArgs::new()
            .with_condition(FilterCondition::eq("firstName", "Robert"))
            .with_sort(SortSpec::desc("lastName"));
        let found: Vec<String> = actors
            .find_many(&args)
            .await
            .unwrap()
            .into_iter()
            .map(|a| a.id)
            .collect();
        assert_eq!(found, vec!["a3", "a1"]);

        let paged = actors
            .find_many(&args.clone().with_skip(1).with_take(5))
            .await
            .unwrap();
        assert_eq!(paged.len(), 1);
        assert_eq!(paged[0].id, "a1");
    }

    #[tokio::test]
    async fn test_find_many_without_sort_keeps_store_order() {
        let store = store();
        actor(&store, "z", "Z", "Z").await;
        actor(&store, "a", "A", "A").await;
        let ids: Vec<String> = Repository::<Actor>::new(store)
            .find_many(&FindManyArgs::new())
            .await
            .unwrap()
            .into_iter()
            .map(|a| a.id)
            .collect();
        assert_eq!(ids, vec!["z", "a"]);
    }

    #[tokio::test]
    async fn test_find_many_rejects_negative_paging() {
        let store = store();
        let error = Repository::<Actor>::new(store)
            .find_many(&FindManyArgs::new().with_skip(-1))
            .await
            .unwrap_err();
        assert_eq!(error.kind, RepositoryErrorKind::ValidationFailed);
        assert_eq!(error.operation, RepositoryOperation::FindMany);
    }

    #[tokio::test]
    async fn test_find_many_rejects_unknown_field() {
        let error = Repository::<Actor>::new(store())
            .find_many(&FindManyArgs::new().with_condition(FilterCondition::eq("nickname", "Bobby")))
            .await
            .unwrap_err();
        assert_eq!(error.kind, RepositoryErrorKind::ValidationFailed);
        assert_eq!(error.entity_type.as_deref(), Some("Actor"));
    }

    #[tokio::test]
    async fn test_count_matches_unpaged_find_many() {
        let store = store();
        for (i, last) in ["Keitel", "Pesci", "Keitel", "Liotta"].iter().enumerate() {
            actor(&store, &format!("a{i}"), "X", last).await;
        }
        let actors = Repository::<Actor>::new(store);
        for filter in [
            Filter::new(),
            Filter::new().and(FilterCondition::eq("lastName", "Keitel")),
            Filter::new().and(FilterCondition::eq("lastName", "Nobody")),
        ] {
            let count = actors.count(&filter).await.unwrap();
            let all = actors
                .find_many(&FindManyArgs {
                    filter: filter.clone(),
                    sort: None,
                    pagination: Pagination::new(Some(0), None),
                })
                .await
                .unwrap();
            assert_eq!(count, all.len());
        }
    }

    #[tokio::test]
    async fn test_paging_reconstructs_sorted_result() {
        let store = store();
        for (i, last) in ["d", "b", "e", "a", "c", "b", "f"].iter().enumerate() {
            actor(&store, &format!("a{i}"), "X", last).await;
        }
        let actors = Repository::<Actor>::new(store);
        let sort = SortSpec::asc("lastName");
        let full = actors
            .find_many(&FindManyArgs::new().with_sort(sort.clone()))
            .await
            .unwrap();

        let mut rebuilt = Vec::new();
        let mut skip = 0;
        loop {
            let page = actors
                .find_many(
                    &FindManyArgs::new()
                        .with_sort(sort.clone())
                        .with_skip(skip)
                        .with_take(3),
                )
                .await
                .unwrap();
            if page.is_empty() {
                break;
            }
            skip += page.len() as i64;
            rebuilt.extend(page);
        }
        assert_eq!(rebuilt, full);
    }

    #[tokio::test]
    async fn test_find_one_missing() {
        let error = Repository::<Movie>::new(store())
            .find_one("nope")
            .await
            .unwrap_err();
        assert_eq!(error.kind, RepositoryErrorKind::NotFound);
        assert_eq!(error.operation, RepositoryOperation::FindOne);
    }

    #[tokio::test]
    async fn test_update_changes_only_given_field() {
        let store = store();
        let before = actor(&store, "a1", "Robert", "De Niro").await;
        let actors = Repository::<Actor>::new(store);

        let patch = ActorUpdateInput {
            last_name: Some("DeNiro".to_string()),
            ..ActorUpdateInput::default()
        };
        actors.update("a1", patch).await.unwrap();

        let after = actors.find_one("a1").await.unwrap();
        assert_eq!(after.last_name, "DeNiro");
        assert_eq!(after.first_name, before.first_name);
        assert_eq!(after.birth_date, before.birth_date);
        assert_eq!(after.created_at, before.created_at);
        assert_eq!(after.updated_at, before.updated_at);
    }

    #[tokio::test]
    async fn test_update_clears_optional_field_on_null() {
        let store = store();
        let mut input = MovieCreateInput::titled("Heat").with_id("m1");
        input.comment = Some("long".to_string());
        let movies = Repository::<Movie>::new(store);
        movies.create(input).await.unwrap();

        let patch = MovieUpdateInput {
            comment: Patch::Clear,
            ..MovieUpdateInput::default()
        };
        movies.update("m1", patch).await.unwrap();
        let after = movies.find_one("m1").await.unwrap();
        assert_eq!(after.comment, None);
        assert_eq!(after.title.as_deref(), Some("Heat"));
    }

    #[tokio::test]
    async fn test_update_foreign_key_to_missing_owner_clears_it() {
        let store = store();
        actor(&store, "a1", "Al", "Pacino").await;
        let mut input = MovieCreateInput::titled("Heat").with_id("m1");
        input.actor_id = Some("a1".to_string());
        let movies = Repository::<Movie>::new(store);
        movies.create(input).await.unwrap();

        let patch = MovieUpdateInput {
            actor_id: Patch::Set("ghost".to_string()),
            ..MovieUpdateInput::default()
        };
        movies.update("m1", patch).await.unwrap();
        assert_eq!(movies.find_one("m1").await.unwrap().actor_id, None);
    }

    #[tokio::test]
    async fn test_update_collection_replaces_members() {
        let store = store();
        movie(&store, "m1", "Heat").await;
        movie(&store, "m2", "Ronin").await;
        let mut input = ActorCreateInput::new("Robert", "De Niro").with_id("a1");
        input.movies = Some(vec![EntityRef::new("m1")]);
        let actors = Repository::<Actor>::new(store);
        actors.create(input).await.unwrap();

        let patch = ActorUpdateInput {
            movies: Some(vec![EntityRef::new("m2")]),
            ..ActorUpdateInput::default()
        };
        actors.update("a1", patch).await.unwrap();
        assert_eq!(actors.find_one("a1").await.unwrap().movies, vec!["m2"]);
    }

    #[tokio::test]
    async fn test_update_after_delete_is_not_found() {
        let store = store();
        actor(&store, "a1", "Al", "Pacino").await;
        let actors = Repository::<Actor>::new(store);
        actors.delete("a1").await.unwrap();

        let error = actors
            .update("a1", ActorUpdateInput::default())
            .await
            .unwrap_err();
        assert_eq!(error.kind, RepositoryErrorKind::NotFound);
        assert_eq!(error.operation, RepositoryOperation::Update);
    }

    #[tokio::test]
    async fn test_update_racing_delete_is_not_found() {
        let inner = MemoryStore::new();
        let seed: Arc<dyn Store> = Arc::new(inner.clone());
        actor(&seed, "a1", "Al", "Pacino").await;

        let racing: Arc<dyn Store> =
            Arc::new(InterferingStore::new(inner, Interference::Remove("actors", "a1")));
        let error = Repository::<Actor>::new(racing)
            .update("a1", ActorUpdateInput::default())
            .await
            .unwrap_err();
        assert_eq!(error.kind, RepositoryErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_update_racing_writer_is_conflict() {
        let inner = MemoryStore::new();
        let seed: Arc<dyn Store> = Arc::new(inner.clone());
        actor(&seed, "a1", "Al", "Pacino").await;

        let racing: Arc<dyn Store> =
            Arc::new(InterferingStore::new(inner, Interference::Touch("actors", "a1")));
        let error = Repository::<Actor>::new(racing)
            .update("a1", ActorUpdateInput::default())
            .await
            .unwrap_err();
        assert_eq!(error.kind, RepositoryErrorKind::ConcurrencyConflict);
    }

    async fn owned_movie(store: &Arc<dyn Store>) {
        actor(store, "a1", "Al", "Pacino").await;
        let mut input = MovieCreateInput::titled("Heat").with_id("m1");
        input.actor_id = Some("a1".to_string());
        Repository::<Movie>::new(Arc::clone(store))
            .create(input)
            .await
            .unwrap();
    }

    fn owned_by_a1(title: &str, id: &str) -> MovieCreateInput {
        let mut input = MovieCreateInput::titled(title).with_id(id);
        input.actor_id = Some("a1".to_string());
        input
    }

    fn reassign_to_a1() -> MovieUpdateInput {
        MovieUpdateInput {
            title: Patch::Set("Heat (1995)".to_string()),
            actor_id: Patch::Set("a1".to_string()),
            ..MovieUpdateInput::default()
        }
    }

    #[tokio::test]
    async fn test_create_while_owner_edited_succeeds() {
        let inner = MemoryStore::new();
        let seed: Arc<dyn Store> = Arc::new(inner.clone());
        actor(&seed, "a1", "Al", "Pacino").await;

        let racing: Arc<dyn Store> =
            Arc::new(InterferingStore::new(inner, Interference::Touch("actors", "a1")));
        let created = Repository::<Movie>::new(Arc::clone(&racing))
            .create(owned_by_a1("Ronin", "m2"))
            .await
            .unwrap();
        assert_eq!(created.actor_id.as_deref(), Some("a1"));
        let owner = Repository::<Actor>::new(racing).find_one("a1").await.unwrap();
        assert_eq!(owner.movies, vec!["m2"]);
    }

    #[tokio::test]
    async fn test_create_while_owner_deleted_fails() {
        let inner = MemoryStore::new();
        let seed: Arc<dyn Store> = Arc::new(inner.clone());
        actor(&seed, "a1", "Al", "Pacino").await;

        let racing: Arc<dyn Store> =
            Arc::new(InterferingStore::new(inner, Interference::Remove("actors", "a1")));
        let movies = Repository::<Movie>::new(racing);
        let error = movies
            .create(owned_by_a1("Ronin", "m2"))
            .await
            .unwrap_err();
        assert_eq!(error.kind, RepositoryErrorKind::ConcurrencyConflict);
        assert!(!movies.exists("m2").await.unwrap());
    }

    #[tokio::test]
    async fn test_update_while_owner_edited_succeeds() {
        let inner = MemoryStore::new();
        let seed: Arc<dyn Store> = Arc::new(inner.clone());
        owned_movie(&seed).await;

        let racing: Arc<dyn Store> =
            Arc::new(InterferingStore::new(inner, Interference::Touch("actors", "a1")));
        let movies = Repository::<Movie>::new(racing);
        movies.update("m1", reassign_to_a1()).await.unwrap();
        let after = movies.find_one("m1").await.unwrap();
        assert_eq!(after.title.as_deref(), Some("Heat (1995)"));
        assert_eq!(after.actor_id.as_deref(), Some("a1"));
    }

    #[tokio::test]
    async fn test_update_while_owner_deleted_fails() {
        let inner = MemoryStore::new();
        let seed: Arc<dyn Store> = Arc::new(inner.clone());
        owned_movie(&seed).await;

        let racing: Arc<dyn Store> =
            Arc::new(InterferingStore::new(inner, Interference::Remove("actors", "a1")));
        let movies = Repository::<Movie>::new(racing);
        let error = movies.update("m1", reassign_to_a1()).await.unwrap_err();
        assert_eq!(error.kind, RepositoryErrorKind::ConcurrencyConflict);
        assert_eq!(movies.find_one("m1").await.unwrap().title.as_deref(), Some("Heat"));
    }

    #[tokio::test]
    async fn test_delete_missing_is_not_found() {
        let error = Repository::<Review>::new(store())
            .delete("r1")
            .await
            .unwrap_err();
        assert_eq!(error.kind, RepositoryErrorKind::NotFound);
        assert_eq!(error.operation, RepositoryOperation::Delete);
    }

    #[tokio::test]
    async fn test_delete_clears_children_foreign_keys() {
        let store = store();
        movie(&store, "m1", "Heat").await;
        let mut review = ReviewCreateInput::rated(5).with_id("r1");
        review.movie_id = Some("m1".to_string());
        let reviews = Repository::<Review>::new(Arc::clone(&store));
        reviews.create(review).await.unwrap();

        Repository::<Movie>::new(store).delete("m1").await.unwrap();
        assert_eq!(reviews.find_one("r1").await.unwrap().movie_id, None);
    }

    #[tokio::test]
    async fn test_find_owner() {
        let store = store();
        actor(&store, "a1", "Al", "Pacino").await;
        let mut input = MovieCreateInput::titled("Heat").with_id("m1");
        input.actor_id = Some("a1".to_string());
        let movies = Repository::<Movie>::new(Arc::clone(&store));
        movies.create(input).await.unwrap();
        movie(&store, "m2", "Orphan").await;

        let owner: Actor = movies.find_owner("m1", "actor").await.unwrap();
        assert_eq!(owner.id, "a1");
        assert_eq!(owner.movies, vec!["m1"]);

        let error = movies.find_owner::<Actor>("m2", "actor").await.unwrap_err();
        assert_eq!(error.kind, RepositoryErrorKind::NotFound);
        assert_eq!(error.operation, RepositoryOperation::FindOwner);
    }
}
