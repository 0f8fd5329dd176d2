//! Entity descriptors and field values
//!
//! The engine never touches concrete entity types directly. Each entity
//! describes itself through the [`Entity`] trait: the collection it lives in,
//! which fields can be filtered and sorted on, which foreign keys it holds
//! ([`BelongsTo`]) and which inverse collections other entities hold pointing
//! at it ([`HasMany`]). Everything else is driven off those constants.
//!
//! # Example
//!
//! ```rust
//! use movies_service::models::Movie;
//! use movies_service::repository::{Entity, FieldKind};
//!
//! assert_eq!(Movie::COLLECTION, "movies");
//! assert_eq!(Movie::field("releaseDate").map(|f| f.kind), Some(FieldKind::Timestamp));
//! assert!(Movie::field("reviews").is_none());
//! ```

use std::fmt;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// How a field's stored JSON is interpreted for filtering and ordering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    /// Opaque identifier, compared lexicographically
    Id,
    /// Free text, compared lexicographically
    Text,
    /// Signed integer, compared numerically
    Integer,
    /// RFC 3339 instant, compared chronologically
    Timestamp,
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id => write!(f, "id"),
            Self::Text => write!(f, "text"),
            Self::Integer => write!(f, "integer"),
            Self::Timestamp => write!(f, "timestamp"),
        }
    }
}

/// A filterable, sortable scalar field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDescriptor {
    /// JSON field name (camelCase)
    pub name: &'static str,
    pub kind: FieldKind,
}

impl FieldDescriptor {
    pub const fn new(name: &'static str, kind: FieldKind) -> Self {
        Self { name, kind }
    }
}

/// Single-owner foreign key held by this entity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BelongsTo {
    /// Foreign key field on this entity, e.g. `actorId`
    pub foreign_key: &'static str,
    /// Collection the key points into, e.g. `actors`
    pub owner_collection: &'static str,
    /// Path segment naming the owner, e.g. `actor`
    pub relation: &'static str,
}

/// Inverse collection derived from a child's foreign key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HasMany {
    /// JSON field and path segment, e.g. `movies`
    pub name: &'static str,
    /// Collection holding the children
    pub child_collection: &'static str,
    /// Foreign key on the child pointing back at the parent
    pub foreign_key: &'static str,
}

/// Scalar value of an entity field
///
/// Variants are ordered so that [`FieldValue::Null`] sorts before any present
/// value; within a field every present value has the same variant.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FieldValue {
    Null,
    Text(String),
    Integer(i64),
    Timestamp(DateTime<Utc>),
}

impl FieldValue {
    /// Read a field out of a stored JSON body using its declared kind
    ///
    /// Missing keys and JSON `null` read as [`FieldValue::Null`], and so does a
    /// value that does not parse as the declared kind.
    pub fn extract(body: &Value, field: &FieldDescriptor) -> Self {
        match body.get(field.name) {
            None | Some(Value::Null) => Self::Null,
            Some(value) => Self::from_json(field.kind, value).unwrap_or(Self::Null),
        }
    }

    /// Interpret a JSON value as the given kind
    pub fn from_json(kind: FieldKind, value: &Value) -> Option<Self> {
        match (kind, value) {
            (_, Value::Null) => Some(Self::Null),
            (FieldKind::Id | FieldKind::Text, Value::String(s)) => Some(Self::Text(s.clone())),
            (FieldKind::Integer, Value::Number(n)) => n.as_i64().map(Self::Integer),
            (FieldKind::Timestamp, Value::String(s)) => Self::parse_timestamp(s),
            _ => None,
        }
    }

    /// Parse the textual form used in query strings
    pub fn parse(kind: FieldKind, raw: &str) -> Option<Self> {
        match kind {
            FieldKind::Id | FieldKind::Text => Some(Self::Text(raw.to_string())),
            FieldKind::Integer => raw.trim().parse().ok().map(Self::Integer),
            FieldKind::Timestamp => Self::parse_timestamp(raw),
        }
    }

    fn parse_timestamp(raw: &str) -> Option<Self> {
        DateTime::parse_from_rfc3339(raw.trim())
            .ok()
            .map(|dt| Self::Timestamp(dt.with_timezone(&Utc)))
    }

    /// Whether a value of this variant can be compared against a field of `kind`
    pub fn fits(&self, kind: FieldKind) -> bool {
        matches!(
            (self, kind),
            (Self::Null, _)
                | (Self::Text(_), FieldKind::Id | FieldKind::Text)
                | (Self::Integer(_), FieldKind::Integer)
                | (Self::Timestamp(_), FieldKind::Timestamp)
        )
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Text(s) => write!(f, "{}", s),
            Self::Integer(n) => write!(f, "{}", n),
            Self::Timestamp(ts) => write!(f, "{}", ts.to_rfc3339()),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<&String> for FieldValue {
    fn from(s: &String) -> Self {
        Self::Text(s.clone())
    }
}

impl From<i64> for FieldValue {
    fn from(n: i64) -> Self {
        Self::Integer(n)
    }
}

impl From<i32> for FieldValue {
    fn from(n: i32) -> Self {
        Self::Integer(i64::from(n))
    }
}

impl From<DateTime<Utc>> for FieldValue {
    fn from(ts: DateTime<Utc>) -> Self {
        Self::Timestamp(ts)
    }
}

/// Reference to an existing entity by id, as sent in relationship payloads
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityRef {
    pub id: String,
}

impl EntityRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

impl From<&str> for EntityRef {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Collect ids from a JSON list of `{"id": ...}` objects or bare strings
///
/// Entries without a usable id are skipped, duplicates keep their first position.
pub fn reference_ids(value: &Value) -> Vec<String> {
    let mut ids: Vec<String> = Vec::new();
    let Some(items) = value.as_array() else {
        return ids;
    };
    for item in items {
        let id = match item {
            Value::String(s) => Some(s.as_str()),
            Value::Object(map) => map.get("id").and_then(Value::as_str),
            _ => None,
        };
        if let Some(id) = id {
            if !ids.iter().any(|seen| seen == id) {
                ids.push(id.to_string());
            }
        }
    }
    ids
}

/// An entity managed by the generic repository
///
/// Implementors are plain serde structs whose JSON form matches the stored
/// body plus one id array per [`HasMany`] relation.
pub trait Entity: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Creation payload
    type Create: Serialize + DeserializeOwned + Send + Sync + 'static;
    /// Partial update payload
    type Update: Serialize + DeserializeOwned + Send + Sync + 'static;

    /// Human-readable type name used in errors, e.g. `Actor`
    const ENTITY_TYPE: &'static str;
    /// Store collection and URL segment, e.g. `actors`
    const COLLECTION: &'static str;
    /// TypeID prefix for store-assigned ids
    const ID_PREFIX: &'static str;
    /// Fields usable in filters and sorts
    const FIELDS: &'static [FieldDescriptor];
    /// Timestamps defaulted to the creation instant when not supplied
    const TIMESTAMPS: &'static [&'static str] = &["createdAt", "updatedAt"];
    const BELONGS_TO: &'static [BelongsTo] = &[];
    const HAS_MANY: &'static [HasMany] = &[];

    fn id(&self) -> &str;

    fn field(name: &str) -> Option<&'static FieldDescriptor> {
        Self::FIELDS.iter().find(|f| f.name == name)
    }

    fn belongs_to(foreign_key: &str) -> Option<&'static BelongsTo> {
        Self::BELONGS_TO.iter().find(|b| b.foreign_key == foreign_key)
    }

    fn has_many(name: &str) -> Option<&'static HasMany> {
        Self::HAS_MANY.iter().find(|h| h.name == name)
    }
}
