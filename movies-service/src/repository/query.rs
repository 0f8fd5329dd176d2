//! Arguments shared by every listing operation

use super::filter::{Filter, FilterCondition};
use super::pagination::Pagination;
use super::sort::SortSpec;

/// Filter, optional sort, and skip/take for a `find_many` call
///
/// ```rust
/// use movies_service::repository::{FilterCondition, FindManyArgs, SortSpec};
///
/// let args = FindManyArgs::new()
///     .with_condition(FilterCondition::eq("lastName", "De Niro"))
///     .with_sort(SortSpec::desc("birthDate"))
///     .with_skip(0)
///     .with_take(10);
/// assert_eq!(args.filter.conditions().len(), 1);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FindManyArgs {
    pub filter: Filter,
    pub sort: Option<SortSpec>,
    pub pagination: Pagination,
}

impl FindManyArgs {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_condition(mut self, condition: FilterCondition) -> Self {
        self.filter.push(condition);
        self
    }

    #[must_use]
    pub fn with_sort(mut self, sort: SortSpec) -> Self {
        self.sort = Some(sort);
        self
    }

    #[must_use]
    pub fn with_skip(mut self, skip: i64) -> Self {
        self.pagination.skip = Some(skip);
        self
    }

    #[must_use]
    pub fn with_take(mut self, take: i64) -> Self {
        self.pagination.take = Some(take);
        self
    }
}
