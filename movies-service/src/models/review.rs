use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::repository::{BelongsTo, Entity, FieldDescriptor, FieldKind, Patch};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: String,
    pub comment: Option<String>,
    pub rating: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub movie_id: Option<String>,
}

impl Entity for Review {
    type Create = ReviewCreateInput;
    type Update = ReviewUpdateInput;

    const ENTITY_TYPE: &'static str = "Review";
    const COLLECTION: &'static str = "reviews";
    const ID_PREFIX: &'static str = "review";
    const FIELDS: &'static [FieldDescriptor] = &[
        FieldDescriptor::new("id", FieldKind::Id),
        FieldDescriptor::new("comment", FieldKind::Text),
        FieldDescriptor::new("rating", FieldKind::Integer),
        FieldDescriptor::new("createdAt", FieldKind::Timestamp),
        FieldDescriptor::new("updatedAt", FieldKind::Timestamp),
        FieldDescriptor::new("movieId", FieldKind::Id),
    ];
    const BELONGS_TO: &'static [BelongsTo] = &[BelongsTo {
        foreign_key: "movieId",
        owner_collection: "movies",
        relation: "movie",
    }];

    fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewCreateInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub rating: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub movie_id: Option<String>,
}

impl ReviewCreateInput {
    pub fn rated(rating: i64) -> Self {
        Self {
            rating: Some(rating),
            ..Self::default()
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
pub struct ReviewUpdateInput {
    #[serde(default, skip_serializing_if = "Patch::is_absent")]
    pub comment: Patch<String>,
    #[serde(default, skip_serializing_if = "Patch::is_absent")]
    pub rating: Patch<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Patch::is_absent")]
    pub movie_id: Patch<String>,
}
