//! Skip/take windowing applied after filtering and sorting
//!
//! ```rust
//! use movies_service::repository::Pagination;
//!
//! let page = Pagination::new(Some(2), Some(2));
//! assert_eq!(page.apply(vec![1, 2, 3, 4, 5]).unwrap(), vec![3, 4]);
//!
//! // No take means no upper bound
//! assert_eq!(Pagination::default().apply(vec![1, 2, 3]).unwrap(), vec![1, 2, 3]);
//!
//! // Negative values are rejected rather than clamped
//! assert!(Pagination::new(Some(-1), None).apply(vec![1]).is_err());
//! ```

use super::error::{RepositoryError, RepositoryOperation};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Pagination {
    /// Number of results to skip, 0 when absent
    pub skip: Option<i64>,
    /// Maximum number of results, unbounded when absent
    pub take: Option<i64>,
}

impl Pagination {
    pub const fn new(skip: Option<i64>, take: Option<i64>) -> Self {
        Self { skip, take }
    }

    /// Everything, from the start
    pub const fn unbounded() -> Self {
        Self {
            skip: None,
            take: None,
        }
    }

    #[must_use]
    pub const fn with_skip(mut self, skip: i64) -> Self {
        self.skip = Some(skip);
        self
    }

    #[must_use]
    pub const fn with_take(mut self, take: i64) -> Self {
        self.take = Some(take);
        self
    }

    /// Validated `(skip, take)` as sizes
    pub fn bounds(&self) -> Result<(usize, Option<usize>), RepositoryError> {
        let skip = non_negative("skip", self.skip.unwrap_or(0))?;
        let take = self.take.map(|t| non_negative("take", t)).transpose()?;
        Ok((skip, take))
    }

    pub fn apply<T>(&self, items: Vec<T>) -> Result<Vec<T>, RepositoryError> {
        let (skip, take) = self.bounds()?;
        let window = items.into_iter().skip(skip);
        Ok(match take {
            Some(take) => window.take(take).collect(),
            None => window.collect(),
        })
    }
}

fn non_negative(name: &str, value: i64) -> Result<usize, RepositoryError> {
    usize::try_from(value).map_err(|_| {
        RepositoryError::validation_failed(
            RepositoryOperation::FindMany,
            format!("{} must not be negative, got {}", name, value),
        )
    })
}
