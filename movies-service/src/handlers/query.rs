//! Query-string parsing for list endpoints
//!
//! `sort`, `order`, `skip` and `take` are reserved; every other key is an
//! equality filter on a declared field of the listed entity.
//!
//! # Example
//!
//! ```rust
//! use movies_service::handlers::{ApiOperation, ListQuery, SortOrder};
//! use movies_service::models::Actor;
//!
//! let pairs = vec![
//!     ("lastName".to_string(), "De Niro".to_string()),
//!     ("sort".to_string(), "birthDate".to_string()),
//!     ("order".to_string(), "desc".to_string()),
//!     ("take".to_string(), "10".to_string()),
//! ];
//! let query = ListQuery::from_pairs(pairs, ApiOperation::List).unwrap();
//! assert_eq!(query.order, Some(SortOrder::Desc));
//!
//! let args = query.into_args::<Actor>(ApiOperation::List, None).unwrap();
//! assert_eq!(args.filter.conditions().len(), 1);
//! assert_eq!(args.pagination.take, Some(10));
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::{ApiError, ApiOperation};
use crate::repository::{
    Entity, FieldValue, Filter, FilterCondition, FindManyArgs, OrderDirection, Pagination,
    SortSpec,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Asc => write!(f, "asc"),
            Self::Desc => write!(f, "desc"),
        }
    }
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            other => Err(format!("order must be 'asc' or 'desc', got '{other}'")),
        }
    }
}

impl From<SortOrder> for OrderDirection {
    fn from(order: SortOrder) -> Self {
        match order {
            SortOrder::Asc => OrderDirection::Ascending,
            SortOrder::Desc => OrderDirection::Descending,
        }
    }
}

/// Raw list parameters, not yet checked against an entity's fields
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListQuery {
    /// Filter pairs in query-string order
    pub filters: Vec<(String, String)>,
    pub sort: Option<String>,
    pub order: Option<SortOrder>,
    /// Signed so a negative value reaches the pager and is rejected there
    pub skip: Option<i64>,
    pub take: Option<i64>,
}

impl ListQuery {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Split query pairs into reserved keys and filters
    ///
    /// Non-integer `skip`/`take` and unknown `order` values are a bad request.
    /// A repeated reserved key keeps the last value.
    pub fn from_pairs(
        pairs: impl IntoIterator<Item = (String, String)>,
        operation: ApiOperation,
    ) -> Result<Self, ApiError> {
        let mut query = Self::new();

        for (key, value) in pairs {
            match key.as_str() {
                "sort" => query.sort = Some(value),
                "order" => {
                    let order = value
                        .parse()
                        .map_err(|msg: String| ApiError::bad_request(operation, msg))?;
                    query.order = Some(order);
                }
                "skip" => query.skip = Some(parse_integer("skip", &value, operation)?),
                "take" => query.take = Some(parse_integer("take", &value, operation)?),
                _ => query.filters.push((key, value)),
            }
        }

        Ok(query)
    }

    #[must_use]
    pub fn with_filter(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.push((field.into(), value.into()));
        self
    }

    #[must_use]
    pub fn with_sort(mut self, sort: impl Into<String>) -> Self {
        self.sort = Some(sort.into());
        self
    }

    #[must_use]
    pub fn with_order(mut self, order: SortOrder) -> Self {
        self.order = Some(order);
        self
    }

    #[must_use]
    pub fn with_skip(mut self, skip: i64) -> Self {
        self.skip = Some(skip);
        self
    }

    #[must_use]
    pub fn with_take(mut self, take: i64) -> Self {
        self.take = Some(take);
        self
    }

    /// Resolve filters against `E::FIELDS` and build the repository arguments
    ///
    /// An unknown filter key or a value that does not parse as the field's
    /// kind is a bad request. An unknown sort field is left for the sorter to
    /// reject. `max_take` caps `take` and stands in for it when absent.
    pub fn into_args<E: Entity>(
        self,
        operation: ApiOperation,
        max_take: Option<i64>,
    ) -> Result<FindManyArgs, ApiError> {
        let filter = self.filter::<E>(operation)?;

        let take = match (self.take, max_take) {
            (Some(take), Some(max)) => Some(take.min(max)),
            (None, Some(max)) => Some(max),
            (take, None) => take,
        };

        let sort = self.sort.map(|field| {
            SortSpec::new(field, self.order.unwrap_or_default().into())
        });

        Ok(FindManyArgs {
            filter,
            sort,
            pagination: Pagination::new(self.skip, take),
        })
    }

    /// Filter part only, for count endpoints
    pub fn filter<E: Entity>(&self, operation: ApiOperation) -> Result<Filter, ApiError> {
        self.filters
            .iter()
            .map(|(key, raw)| {
                let field = E::field(key).ok_or_else(|| {
                    ApiError::bad_request(operation, format!("Unknown query parameter '{key}'"))
                        .with_entity_type(E::ENTITY_TYPE)
                })?;
                let value = FieldValue::parse(field.kind, raw).ok_or_else(|| {
                    ApiError::bad_request(
                        operation,
                        format!("'{raw}' is not a valid {} for '{key}'", field.kind),
                    )
                    .with_entity_type(E::ENTITY_TYPE)
                })?;
                Ok(FilterCondition::eq(field.name, value))
            })
            .collect()
    }
}

fn parse_integer(name: &str, raw: &str, operation: ApiOperation) -> Result<i64, ApiError> {
    raw.trim().parse().map_err(|_| {
        ApiError::bad_request(operation, format!("{name} must be an integer, got '{raw}'"))
    })
}
