//! Conflict resolution for optimistic commits
//!
//! When a commit is rejected because a row changed after it was read, the
//! guard checks whether the target entity still exists. A target that has
//! vanished is reported as `NotFound`; one that is still there as
//! `ConcurrencyConflict`. Nothing is retried.

use super::error::{RepositoryError, RepositoryOperation};
use super::store::{ChangeSet, Store, StoreErrorKind};

/// The entity a guarded commit is about
#[derive(Debug, Clone, Copy)]
pub struct GuardTarget<'a> {
    pub entity_type: &'static str,
    pub collection: &'static str,
    pub id: &'a str,
}

pub struct ConcurrencyGuard<'a> {
    store: &'a dyn Store,
}

impl<'a> ConcurrencyGuard<'a> {
    pub fn new(store: &'a dyn Store) -> Self {
        Self { store }
    }

    pub async fn commit(
        &self,
        changes: ChangeSet,
        target: GuardTarget<'_>,
        operation: RepositoryOperation,
    ) -> Result<(), RepositoryError> {
        let error = match self.store.commit(changes).await {
            Ok(()) => return Ok(()),
            Err(error) => error,
        };

        if error.kind != StoreErrorKind::Conflict {
            return Err(RepositoryError::from_store(operation, error)
                .with_entity(target.entity_type, target.id));
        }

        let still_there = self
            .store
            .fetch(target.collection, target.id)
            .await
            .map_err(|e| {
                RepositoryError::from_store(operation, e).with_entity(target.entity_type, target.id)
            })?
            .is_some();

        if still_there {
            tracing::warn!(
                entity = target.entity_type,
                id = target.id,
                operation = %operation,
                "Commit rejected by concurrent modification"
            );
            Err(RepositoryError::concurrency_conflict(target.entity_type, target.id)
                .with_operation(operation))
        } else {
            Err(RepositoryError::not_found(target.entity_type, target.id).with_operation(operation))
        }
    }
}
