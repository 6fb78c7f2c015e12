//! Project field rules, queryable field registry, and request payloads.

use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;
use validator::{Validate, ValidationError};

use crate::query::{Collection, FieldKind, FieldSpec};
use crate::serde_util::{trimmed, trimmed_opt};
use crate::types::DbId;

/// `#rgb` or `#rrggbb`.
static HEX_COLOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^#([A-Fa-f0-9]{6}|[A-Fa-f0-9]{3})$").expect("hex color pattern is valid")
});

/// Custom validator for the optional `color` field.
pub fn validate_hex_color(color: &str) -> Result<(), ValidationError> {
    if HEX_COLOR.is_match(color) {
        Ok(())
    } else {
        let mut err = ValidationError::new("hex_color");
        err.message = Some("Please use a valid hex color".into());
        Err(err)
    }
}

static PROJECT_FIELDS: &[FieldSpec] = &[
    FieldSpec::new("id", "id", FieldKind::Id),
    FieldSpec::new("name", "name", FieldKind::Text),
    FieldSpec::new("description", "description", FieldKind::Text),
    FieldSpec::new("color", "color", FieldKind::Text),
    FieldSpec::new("owner", "owner_id", FieldKind::Id),
    FieldSpec::new("members", "member_ids", FieldKind::IdList),
    FieldSpec::new("isPrivate", "is_private", FieldKind::Bool),
    FieldSpec::new("createdAt", "created_at", FieldKind::Timestamp),
    FieldSpec::new("updatedAt", "updated_at", FieldKind::Timestamp),
];

/// Queryable fields of the `projects` collection.
pub static PROJECTS: Collection = Collection {
    name: "projects",
    fields: PROJECT_FIELDS,
    search_fields: &["name", "description"],
    default_sort: "-createdAt",
};

/// Body of `POST /api/projects`. Owner and members come from the caller.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateProjectRequest {
    #[serde(deserialize_with = "trimmed")]
    #[validate(length(min = 1, max = 100, message = "Name is required and cannot be more than 100 characters"))]
    pub name: String,
    #[validate(length(max = 500, message = "Description cannot be more than 500 characters"))]
    pub description: Option<String>,
    #[validate(custom(function = "validate_hex_color"))]
    pub color: Option<String>,
    pub is_private: Option<bool>,
}

/// Body of `PUT /api/projects/{id}`. Owner and members are not writable here.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProjectRequest {
    #[serde(default, deserialize_with = "trimmed_opt")]
    #[validate(length(min = 1, max = 100, message = "Name cannot be empty or more than 100 characters"))]
    pub name: Option<String>,
    #[validate(length(max = 500, message = "Description cannot be more than 500 characters"))]
    pub description: Option<String>,
    #[validate(custom(function = "validate_hex_color"))]
    pub color: Option<String>,
    pub is_private: Option<bool>,
}

/// Body of `POST /api/projects/{id}/members`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddMemberRequest {
    pub user_id: DbId,
}
