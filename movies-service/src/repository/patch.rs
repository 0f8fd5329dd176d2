//! Tri-state values for partial updates
//!
//! An optional field in an update payload can be left out (no change), sent
//! as `null` (clear it), or sent with a value. `Option<T>` cannot tell the
//! first two apart, so update inputs use [`Patch<T>`] together with
//! `#[serde(default, skip_serializing_if = "Patch::is_absent")]`.
//!
//! ```rust
//! use movies_service::repository::Patch;
//! use serde::Deserialize;
//!
//! #[derive(Deserialize)]
//! struct Input {
//!     #[serde(default)]
//!     comment: Patch<String>,
//! }
//!
//! let absent: Input = serde_json::from_str("{}").unwrap();
//! let cleared: Input = serde_json::from_str(r#"{"comment":null}"#).unwrap();
//! let set: Input = serde_json::from_str(r#"{"comment":"great"}"#).unwrap();
//!
//! assert!(absent.comment.is_absent());
//! assert_eq!(cleared.comment, Patch::Clear);
//! assert_eq!(set.comment, Patch::Set("great".to_string()));
//! ```

use serde::{Deserialize, Deserializer, Serialize, Serializer};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Patch<T> {
    /// Field was not sent; keep the stored value
    Absent,
    /// Field was sent as `null`; clear the stored value
    Clear,
    /// Field was sent with a value
    Set(T),
}

impl<T> Default for Patch<T> {
    fn default() -> Self {
        Self::Absent
    }
}

impl<T> Patch<T> {
    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }
}

impl<T> From<Option<T>> for Patch<T> {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Clear, Self::Set)
    }
}

impl<T: Serialize> Serialize for Patch<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Absent | Self::Clear => serializer.serialize_none(),
            Self::Set(value) => serializer.serialize_some(value),
        }
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Patch<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Option::<T>::deserialize(deserializer).map(Patch::from)
    }
}
