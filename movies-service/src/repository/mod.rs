//! Generic query and relationship engine
//!
//! Everything in this module is entity-agnostic. An entity plugs in by
//! implementing [`Entity`]; from then on it gets the same behaviour as every
//! other collection.
//!
//! # Features
//!
//! - **Filtering**: [`Filter`] of equality [`FilterCondition`]s, ANDed together
//! - **Sorting**: one [`SortSpec`], stable, natural ordering per field kind
//! - **Paging**: [`Pagination`] skip/take applied after filter and sort
//! - **CRUD**: [`Repository`] with merge-update semantics via [`Patch`]
//! - **Relationships**: [`RelationshipManager`] connect, disconnect, replace
//! - **Concurrency**: [`ConcurrencyGuard`] turns version conflicts into
//!   `NotFound` or `ConcurrencyConflict`
//! - **Storage**: the [`Store`] trait, with [`MemoryStore`] as the bundled engine
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use movies_service::models::{Review, ReviewCreateInput};
//! use movies_service::repository::{
//!     Filter, FilterCondition, FindManyArgs, MemoryStore, Repository, SortSpec,
//! };
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let reviews = Repository::<Review>::new(Arc::new(MemoryStore::new()));
//! for rating in [3, 5, 5] {
//!     reviews.create(ReviewCreateInput::rated(rating)).await.unwrap();
//! }
//!
//! let five_stars = Filter::new().and(FilterCondition::eq("rating", 5));
//! assert_eq!(reviews.count(&five_stars).await.unwrap(), 2);
//!
//! let worst_first = reviews
//!     .find_many(&FindManyArgs::new().with_sort(SortSpec::asc("rating")).with_take(1))
//!     .await
//!     .unwrap();
//! assert_eq!(worst_first[0].rating, Some(3));
//! # }
//! ```

mod crud;
mod entity;
mod error;
mod filter;
mod guard;
mod memory;
mod pagination;
mod patch;
mod query;
mod relations;
mod sort;
mod store;

#[cfg(test)]
pub(crate) mod testing;

pub use crud::{Repository, RepositoryResult};
pub use entity::{
    reference_ids, BelongsTo, Entity, EntityRef, FieldDescriptor, FieldKind, FieldValue, HasMany,
};
pub use error::{RepositoryError, RepositoryErrorKind, RepositoryOperation};
pub use filter::{Filter, FilterCondition, FilterEvaluator};
pub use guard::{ConcurrencyGuard, GuardTarget};
pub use memory::MemoryStore;
pub use pagination::Pagination;
pub use patch::Patch;
pub use query::FindManyArgs;
pub use relations::RelationshipManager;
pub use sort::{OrderDirection, SortSpec, Sorter};
pub use store::{Change, ChangeSet, Row, Store, StoreError, StoreErrorKind};
