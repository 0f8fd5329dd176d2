//! Repository error types
//!
//! Every failure coming out of the query and relationship engine is a
//! [`RepositoryError`]: the operation that was running, a [`RepositoryErrorKind`]
//! the HTTP edge can map to a status code, and the entity involved when known.
//!
//! # Example
//!
//! ```rust
//! use movies_service::repository::{RepositoryError, RepositoryErrorKind};
//!
//! let error = RepositoryError::not_found("Actor", "a1");
//! assert!(matches!(error.kind, RepositoryErrorKind::NotFound));
//! assert_eq!(error.entity_id.as_deref(), Some("a1"));
//! ```

use std::fmt;

use super::store::{StoreError, StoreErrorKind};

/// Operation being performed when the repository error occurred
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RepositoryOperation {
    /// Creating a new entity
    Create,
    /// Deleting an entity
    Delete,
    /// Filtered, sorted, paginated listing
    FindMany,
    /// Counting entities matching a filter
    Count,
    /// Finding a single entity by id
    FindOne,
    /// Merge-updating an entity
    Update,
    /// Checking whether an entity exists
    Exists,
    /// Loading the owner through a foreign key
    FindOwner,
    /// Attaching children to a parent
    Connect,
    /// Detaching children from a parent
    Disconnect,
    /// Replacing a parent's children
    Replace,
    /// Listing a parent's children
    FindRelated,
}

impl fmt::Display for RepositoryOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Create => write!(f, "create"),
            Self::Delete => write!(f, "delete"),
            Self::FindMany => write!(f, "find_many"),
            Self::Count => write!(f, "count"),
            Self::FindOne => write!(f, "find_one"),
            Self::Update => write!(f, "update"),
            Self::Exists => write!(f, "exists"),
            Self::FindOwner => write!(f, "find_owner"),
            Self::Connect => write!(f, "connect"),
            Self::Disconnect => write!(f, "disconnect"),
            Self::Replace => write!(f, "replace"),
            Self::FindRelated => write!(f, "find_related"),
        }
    }
}

/// Category of repository error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RepositoryErrorKind {
    /// Entity, parent, or every requested child was not found
    NotFound,
    /// The row changed between read and commit and still exists
    ConcurrencyConflict,
    /// Caller input was rejected (unknown field, negative paging, empty id)
    ValidationFailed,
    /// A caller-supplied id collided with an existing row
    AlreadyExists,
    /// Store failure or corrupt row
    Internal,
}

impl fmt::Display for RepositoryErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "not_found"),
            Self::ConcurrencyConflict => write!(f, "concurrency_conflict"),
            Self::ValidationFailed => write!(f, "validation_failed"),
            Self::AlreadyExists => write!(f, "already_exists"),
            Self::Internal => write!(f, "internal"),
        }
    }
}

/// Structured repository error with operation context
///
/// ```rust
/// use movies_service::repository::{RepositoryError, RepositoryOperation};
///
/// let error = RepositoryError::concurrency_conflict("Movie", "m1");
/// assert!(error.is_retriable());
/// assert_eq!(
///     error.to_string(),
///     "Repository concurrency_conflict error during update: Entity was modified concurrently [Movie: m1]"
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryError {
    /// The operation being performed when the error occurred
    pub operation: RepositoryOperation,
    /// The category of error
    pub kind: RepositoryErrorKind,
    /// Human-readable error message
    pub message: String,
    /// The type of entity involved (e.g. "Actor")
    pub entity_type: Option<String>,
    /// The ID of the entity involved
    pub entity_id: Option<String>,
}

impl RepositoryError {
    pub fn new(
        operation: RepositoryOperation,
        kind: RepositoryErrorKind,
        message: impl Into<String>,
    ) -> Self {
        Self {
            operation,
            kind,
            message: message.into(),
            entity_type: None,
            entity_id: None,
        }
    }

    /// Create a "not found" error with entity context
    pub fn not_found(entity_type: impl Into<String>, entity_id: impl Into<String>) -> Self {
        Self {
            operation: RepositoryOperation::FindOne,
            kind: RepositoryErrorKind::NotFound,
            message: "Entity not found".to_string(),
            entity_type: Some(entity_type.into()),
            entity_id: Some(entity_id.into()),
        }
    }

    pub fn already_exists(entity_type: impl Into<String>, entity_id: impl Into<String>) -> Self {
        Self {
            operation: RepositoryOperation::Create,
            kind: RepositoryErrorKind::AlreadyExists,
            message: "Entity already exists".to_string(),
            entity_type: Some(entity_type.into()),
            entity_id: Some(entity_id.into()),
        }
    }

    pub fn concurrency_conflict(
        entity_type: impl Into<String>,
        entity_id: impl Into<String>,
    ) -> Self {
        Self {
            operation: RepositoryOperation::Update,
            kind: RepositoryErrorKind::ConcurrencyConflict,
            message: "Entity was modified concurrently".to_string(),
            entity_type: Some(entity_type.into()),
            entity_id: Some(entity_id.into()),
        }
    }

    pub fn validation_failed(operation: RepositoryOperation, message: impl Into<String>) -> Self {
        Self::new(operation, RepositoryErrorKind::ValidationFailed, message)
    }

    pub fn internal(operation: RepositoryOperation, message: impl Into<String>) -> Self {
        Self::new(operation, RepositoryErrorKind::Internal, message)
    }

    /// Translate a store failure that no caller-level policy claimed
    ///
    /// Conflicts reaching this point are reported as such; the update path
    /// runs them through the concurrency guard first.
    pub fn from_store(operation: RepositoryOperation, error: StoreError) -> Self {
        let kind = match error.kind {
            StoreErrorKind::Conflict => RepositoryErrorKind::ConcurrencyConflict,
            StoreErrorKind::Duplicate => RepositoryErrorKind::AlreadyExists,
            StoreErrorKind::Unavailable => RepositoryErrorKind::Internal,
        };
        let mut mapped = Self::new(operation, kind, error.message);
        mapped.entity_id = error.id;
        mapped
    }

    #[must_use]
    pub fn with_entity(
        mut self,
        entity_type: impl Into<String>,
        entity_id: impl Into<String>,
    ) -> Self {
        self.entity_type = Some(entity_type.into());
        self.entity_id = Some(entity_id.into());
        self
    }

    #[must_use]
    pub fn with_entity_type(mut self, entity_type: impl Into<String>) -> Self {
        self.entity_type = Some(entity_type.into());
        self
    }

    #[must_use]
    pub fn with_operation(mut self, operation: RepositoryOperation) -> Self {
        self.operation = operation;
        self
    }

    /// Whether the caller may succeed by simply retrying
    ///
    /// Nothing in this crate retries on its own.
    pub fn is_retriable(&self) -> bool {
        matches!(self.kind, RepositoryErrorKind::ConcurrencyConflict)
    }
}

impl fmt::Display for RepositoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Repository {} error during {}: {}",
            self.kind, self.operation, self.message
        )?;
        if let (Some(entity_type), Some(entity_id)) = (&self.entity_type, &self.entity_id) {
            write!(f, " [{}: {}]", entity_type, entity_id)?;
        }
        Ok(())
    }
}

impl std::error::Error for RepositoryError {}
