use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::repository::{Entity, EntityRef, FieldDescriptor, FieldKind, HasMany, Patch};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Actor {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub birth_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Ids of movies whose `actorId` points here
    #[serde(default)]
    pub movies: Vec<String>,
}

impl Entity for Actor {
    type Create = ActorCreateInput;
    type Update = ActorUpdateInput;

    const ENTITY_TYPE: &'static str = "Actor";
    const COLLECTION: &'static str = "actors";
    const ID_PREFIX: &'static str = "actor";
    const FIELDS: &'static [FieldDescriptor] = &[
        FieldDescriptor::new("id", FieldKind::Id),
        FieldDescriptor::new("firstName", FieldKind::Text),
        FieldDescriptor::new("lastName", FieldKind::Text),
        FieldDescriptor::new("birthDate", FieldKind::Timestamp),
        FieldDescriptor::new("createdAt", FieldKind::Timestamp),
        FieldDescriptor::new("updatedAt", FieldKind::Timestamp),
    ];
    const HAS_MANY: &'static [HasMany] = &[HasMany {
        name: "movies",
        child_collection: "movies",
        foreign_key: "actorId",
    }];

    fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActorCreateInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub birth_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    /// Existing movies to attach on creation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub movies: Option<Vec<EntityRef>>,
}

impl ActorCreateInput {
    pub fn new(first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        Self {
            id: None,
            first_name: first_name.into(),
            last_name: last_name.into(),
            birth_date: None,
            created_at: None,
            updated_at: None,
            movies: None,
        }
    }

    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActorUpdateInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Patch::is_absent")]
    pub birth_date: Patch<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    /// Full replacement of the actor's movies
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub movies: Option<Vec<EntityRef>>,
}
