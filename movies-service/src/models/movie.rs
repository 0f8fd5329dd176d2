use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::repository::{
    BelongsTo, Entity, EntityRef, FieldDescriptor, FieldKind, HasMany, Patch,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Movie {
    pub id: String,
    pub title: Option<String>,
    pub comment: Option<String>,
    pub release_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub actor_id: Option<String>,
    pub director_id: Option<String>,
    /// Ids of reviews whose `movieId` points here
    #[serde(default)]
    pub reviews: Vec<String>,
}

impl Entity for Movie {
    type Create = MovieCreateInput;
    type Update = MovieUpdateInput;

    const ENTITY_TYPE: &'static str = "Movie";
    const COLLECTION: &'static str = "movies";
    const ID_PREFIX: &'static str = "movie";
    const FIELDS: &'static [FieldDescriptor] = &[
        FieldDescriptor::new("id", FieldKind::Id),
        FieldDescriptor::new("title", FieldKind::Text),
        FieldDescriptor::new("comment", FieldKind::Text),
        FieldDescriptor::new("releaseDate", FieldKind::Timestamp),
        FieldDescriptor::new("createdAt", FieldKind::Timestamp),
        FieldDescriptor::new("updatedAt", FieldKind::Timestamp),
        FieldDescriptor::new("actorId", FieldKind::Id),
        FieldDescriptor::new("directorId", FieldKind::Id),
    ];
    const BELONGS_TO: &'static [BelongsTo] = &[
        BelongsTo {
            foreign_key: "actorId",
            owner_collection: "actors",
            relation: "actor",
        },
        BelongsTo {
            foreign_key: "directorId",
            owner_collection: "directors",
            relation: "director",
        },
    ];
    const HAS_MANY: &'static [HasMany] = &[HasMany {
        name: "reviews",
        child_collection: "reviews",
        foreign_key: "movieId",
    }];

    fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovieCreateInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub release_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub actor_id: Option<String>,
    #[serde(default)]
    pub director_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reviews: Option<Vec<EntityRef>>,
}

impl MovieCreateInput {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
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
pub struct MovieUpdateInput {
    #[serde(default, skip_serializing_if = "Patch::is_absent")]
    pub title: Patch<String>,
    #[serde(default, skip_serializing_if = "Patch::is_absent")]
    pub comment: Patch<String>,
    #[serde(default, skip_serializing_if = "Patch::is_absent")]
    pub release_date: Patch<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Patch::is_absent")]
    pub actor_id: Patch<String>,
    #[serde(default, skip_serializing_if = "Patch::is_absent")]
    pub director_id: Patch<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reviews: Option<Vec<EntityRef>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_owner_relations() {
        assert_eq!(Movie::belongs_to("actorId").unwrap().owner_collection, "actors");
        assert_eq!(Movie::belongs_to("directorId").unwrap().relation, "director");
        assert!(Movie::belongs_to("movieId").is_none());
    }

    #[test]
    fn test_update_input_only_serializes_sent_fields() {
        let input: MovieUpdateInput =
            serde_json::from_value(json!({ "title": "Heat", "actorId": null })).unwrap();
        assert_eq!(
            serde_json::to_value(&input).unwrap(),
            json!({ "title": "Heat", "actorId": null })
        );
    }

    #[test]
    fn test_create_input_serializes_optional_fields_as_null() {
        let value = serde_json::to_value(MovieCreateInput::titled("Heat")).unwrap();
        assert_eq!(value["title"], "Heat");
        assert!(value["comment"].is_null());
        assert!(value.get("id").is_none());
        assert!(value.get("reviews").is_none());
    }
}
