//! TypeID identifiers for requests and store-assigned entities
//!
//! Identifiers follow the [TypeID Specification](https://github.com/jetpack-io/typeid/blob/main/spec/SPEC.md):
//! a readable prefix, an underscore, and a base32-encoded UUIDv7. UUIDv7 keeps
//! ids time-sortable, which is what makes them useful in logs and as default
//! insertion keys.
//!
//! ```rust
//! use movies_service::ids::{new_entity_id, RequestId};
//!
//! let request_id = RequestId::new();
//! assert!(request_id.as_str().starts_with("req_"));
//!
//! let actor_id = new_entity_id("actor");
//! assert!(actor_id.starts_with("actor_"));
//! ```

use http::Request;
use mti::prelude::*;
use std::fmt;
use std::str::FromStr;
use tower_http::request_id::{MakeRequestId, RequestId as TowerRequestId};

/// Allocate a fresh entity id with the given prefix
///
/// Used by stores when the caller does not supply an id on create.
#[must_use]
pub fn new_entity_id(prefix: &str) -> String {
    prefix.create_type_id::<V7>().to_string()
}

/// Request ID carried in the `x-request-id` header
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestId(MagicTypeId);

impl RequestId {
    /// The TypeID prefix for request IDs
    pub const PREFIX: &'static str = "req";

    #[must_use]
    pub fn new() -> Self {
        Self(Self::PREFIX.create_type_id::<V7>())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    #[must_use]
    pub fn prefix(&self) -> &str {
        self.0.prefix().as_str()
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RequestId {
    type Err = RequestIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mti = MagicTypeId::from_str(s).map_err(RequestIdError::Parse)?;

        if mti.prefix().as_str() != Self::PREFIX {
            return Err(RequestIdError::InvalidPrefix {
                expected: Self::PREFIX.to_string(),
                actual: mti.prefix().as_str().to_string(),
            });
        }

        Ok(Self(mti))
    }
}

impl AsRef<str> for RequestId {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

/// Errors from parsing a [`RequestId`]
#[derive(Debug, thiserror::Error)]
pub enum RequestIdError {
    #[error("failed to parse request ID: {0}")]
    Parse(#[from] MagicTypeIdError),

    #[error("invalid prefix: expected '{expected}', got '{actual}'")]
    InvalidPrefix { expected: String, actual: String },
}

/// Generates `req_` TypeIDs for tower-http's request-id middleware
#[derive(Debug, Clone, Copy, Default)]
pub struct MakeTypedRequestId;

impl MakeRequestId for MakeTypedRequestId {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<TowerRequestId> {
        let id = RequestId::new();
        let header_value = http::HeaderValue::from_str(id.as_str()).ok()?;
        Some(TowerRequestId::new(header_value))
    }
}
