//! Equality filters over entity fields
//!
//! A [`Filter`] is a conjunction of [`FilterCondition`]s. An entity matches
//! when every condition holds; an empty filter matches everything. Conditions
//! are checked against the entity's declared fields before anything is
//! scanned, so a typo in a field name is reported instead of silently
//! matching nothing.
//!
//! ```rust
//! use movies_service::models::Movie;
//! use movies_service::repository::{Entity, Filter, FilterCondition, FilterEvaluator};
//! use serde_json::json;
//!
//! let filter = Filter::new()
//!     .and(FilterCondition::eq("actorId", "a1"))
//!     .and(FilterCondition::eq("title", "Heat"));
//! let evaluator = FilterEvaluator::new(&filter, Movie::FIELDS).unwrap();
//!
//! assert!(evaluator.matches(&json!({ "id": "m1", "title": "Heat", "actorId": "a1" })));
//! assert!(!evaluator.matches(&json!({ "id": "m2", "title": "Heat", "actorId": null })));
//! ```

use serde_json::Value;

use super::entity::{FieldDescriptor, FieldValue};
use super::error::{RepositoryError, RepositoryOperation};

/// A single `field == value` condition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterCondition {
    /// JSON field name on the entity
    pub field: String,
    pub value: FieldValue,
}

impl FilterCondition {
    pub fn eq(field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
        }
    }
}

/// Conjunction of equality conditions
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filter {
    conditions: Vec<FilterCondition>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn and(mut self, condition: FilterCondition) -> Self {
        self.conditions.push(condition);
        self
    }

    pub fn push(&mut self, condition: FilterCondition) {
        self.conditions.push(condition);
    }

    pub fn conditions(&self) -> &[FilterCondition] {
        &self.conditions
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }
}

impl FromIterator<FilterCondition> for Filter {
    fn from_iter<I: IntoIterator<Item = FilterCondition>>(iter: I) -> Self {
        Self {
            conditions: iter.into_iter().collect(),
        }
    }
}

/// A filter bound to an entity's field descriptors
#[derive(Debug)]
pub struct FilterEvaluator<'a> {
    checks: Vec<(&'static FieldDescriptor, &'a FieldValue)>,
}

impl<'a> FilterEvaluator<'a> {
    /// Resolve every condition against `fields`
    ///
    /// Fails with `ValidationFailed` when a condition names an undeclared
    /// field or carries a value of the wrong kind.
    pub fn new(
        filter: &'a Filter,
        fields: &'static [FieldDescriptor],
    ) -> Result<Self, RepositoryError> {
        let mut checks = Vec::with_capacity(filter.conditions.len());
        for condition in &filter.conditions {
            let descriptor = fields
                .iter()
                .find(|f| f.name == condition.field)
                .ok_or_else(|| {
                    RepositoryError::validation_failed(
                        RepositoryOperation::FindMany,
                        format!("Unknown filter field '{}'", condition.field),
                    )
                })?;
            if !condition.value.fits(descriptor.kind) {
                return Err(RepositoryError::validation_failed(
                    RepositoryOperation::FindMany,
                    format!(
                        "Filter value '{}' is not a valid {} for field '{}'",
                        condition.value, descriptor.kind, descriptor.name
                    ),
                ));
            }
            checks.push((descriptor, &condition.value));
        }
        Ok(Self { checks })
    }

    /// Whether a stored body satisfies every condition
    ///
    /// A missing or `null` field never matches, not even a `null` condition.
    pub fn matches(&self, body: &Value) -> bool {
        self.checks.iter().all(|(descriptor, expected)| {
            let actual = FieldValue::extract(body, descriptor);
            !actual.is_null() && actual == **expected
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::entity::FieldKind;
    use crate::repository::RepositoryErrorKind;
    use serde_json::json;

    const FIELDS: &[FieldDescriptor] = &[
        FieldDescriptor::new("id", FieldKind::Id),
        FieldDescriptor::new("rating", FieldKind::Integer),
        FieldDescriptor::new("movieId", FieldKind::Id),
    ];

    #[test]
    fn test_empty_filter_matches_everything() {
        let filter = Filter::new();
        let evaluator = FilterEvaluator::new(&filter, FIELDS).unwrap();
        assert!(evaluator.matches(&json!({ "id": "r1" })));
        assert!(evaluator.matches(&json!({})));
    }

    #[test]
    fn test_conditions_are_conjunctive() {
        let filter = Filter::new()
            .and(FilterCondition::eq("rating", 5))
            .and(FilterCondition::eq("movieId", "m1"));
        let evaluator = FilterEvaluator::new(&filter, FIELDS).unwrap();

        assert!(evaluator.matches(&json!({ "rating": 5, "movieId": "m1" })));
        assert!(!evaluator.matches(&json!({ "rating": 5, "movieId": "m2" })));
        assert!(!evaluator.matches(&json!({ "rating": 4, "movieId": "m1" })));
    }

    #[test]
    fn test_absent_field_never_matches() {
        let filter = Filter::new().and(FilterCondition::eq("movieId", "m1"));
        let evaluator = FilterEvaluator::new(&filter, FIELDS).unwrap();
        assert!(!evaluator.matches(&json!({ "movieId": null })));
        assert!(!evaluator.matches(&json!({})));

        let null_filter = Filter::new().and(FilterCondition::eq("movieId", FieldValue::Null));
        let evaluator = FilterEvaluator::new(&null_filter, FIELDS).unwrap();
        assert!(!evaluator.matches(&json!({ "movieId": null })));
    }

    #[test]
    fn test_unknown_field_is_validation_failure() {
        let filter = Filter::new().and(FilterCondition::eq("stars", 5));
        let error = FilterEvaluator::new(&filter, FIELDS).unwrap_err();
        assert_eq!(error.kind, RepositoryErrorKind::ValidationFailed);
        assert!(error.message.contains("stars"));
    }

    #[test]
    fn test_mismatched_kind_is_validation_failure() {
        let filter = Filter::new().and(FilterCondition::eq("rating", "five"));
        let error = FilterEvaluator::new(&filter, FIELDS).unwrap_err();
        assert_eq!(error.kind, RepositoryErrorKind::ValidationFailed);
    }

    #[test]
    fn test_collect_into_filter() {
        let filter: Filter = vec![FilterCondition::eq("id", "r1")].into_iter().collect();
        assert_eq!(filter.conditions().len(), 1);
        assert!(!filter.is_empty());
    }
}
