//! Single-key stable ordering
//!
//! Rows are ordered by one declared field using its natural ordering. Rows
//! with equal keys keep the order the store delivered them in, and absent
//! values come first when ascending.

use std::cmp::Reverse;
use std::fmt;

use super::entity::{FieldDescriptor, FieldValue};
use super::error::{RepositoryError, RepositoryOperation};
use super::store::Row;

/// Direction for ordering results
///
/// ```rust
/// use movies_service::repository::OrderDirection;
///
/// assert_eq!(OrderDirection::Ascending.to_string(), "asc");
/// assert_eq!(OrderDirection::Descending.to_string(), "desc");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrderDirection {
    #[default]
    Ascending,
    Descending,
}

impl fmt::Display for OrderDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ascending => write!(f, "asc"),
            Self::Descending => write!(f, "desc"),
        }
    }
}

/// Field and direction to order by
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortSpec {
    pub field: String,
    pub direction: OrderDirection,
}

impl SortSpec {
    pub fn new(field: impl Into<String>, direction: OrderDirection) -> Self {
        Self {
            field: field.into(),
            direction,
        }
    }

    pub fn asc(field: impl Into<String>) -> Self {
        Self::new(field, OrderDirection::Ascending)
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self::new(field, OrderDirection::Descending)
    }
}

/// A [`SortSpec`] resolved against an entity's fields
#[derive(Debug, Clone, Copy)]
pub struct Sorter {
    field: &'static FieldDescriptor,
    direction: OrderDirection,
}

impl Sorter {
    pub fn new(spec: &SortSpec, fields: &'static [FieldDescriptor]) -> Result<Self, RepositoryError> {
        let field = fields.iter().find(|f| f.name == spec.field).ok_or_else(|| {
            RepositoryError::validation_failed(
                RepositoryOperation::FindMany,
                format!("Unknown sort field '{}'", spec.field),
            )
        })?;
        Ok(Self {
            field,
            direction: spec.direction,
        })
    }

    /// Reorder rows in place; stable for equal keys
    pub fn sort(&self, rows: &mut [Row]) {
        let field = self.field;
        match self.direction {
            OrderDirection::Ascending => {
                rows.sort_by_cached_key(|row| FieldValue::extract(&row.body, field));
            }
            OrderDirection::Descending => {
                rows.sort_by_cached_key(|row| Reverse(FieldValue::extract(&row.body, field)));
            }
        }
    }
}
