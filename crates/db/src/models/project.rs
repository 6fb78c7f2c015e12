//! Project entity model and DTOs.

use serde::Serialize;
use sqlx::FromRow;
use taskhub_core::guard::ProjectAccess;
use taskhub_core::query::{FieldValue, Queryable};
use taskhub_core::types::{DbId, Timestamp};

/// A row from the `projects` table.
///
/// `members` always contains the owner at creation time; the owner cannot
/// be removed through the members API.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: DbId,
    pub name: String,
    pub description: Option<String>,
    pub color: Option<String>,
    #[sqlx(rename = "owner_id")]
    pub owner: DbId,
    #[sqlx(rename = "member_ids")]
    pub members: Vec<DbId>,
    pub is_private: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Project {
    pub fn is_member(&self, user_id: DbId) -> bool {
        self.members.contains(&user_id)
    }
}

impl ProjectAccess for Project {
    fn owner_id(&self) -> DbId {
        self.owner
    }

    fn member_ids(&self) -> &[DbId] {
        &self.members
    }
}

impl Queryable for Project {
    fn field_value(&self, name: &str) -> FieldValue {
        match name {
            "id" => FieldValue::Integer(self.id),
            "name" => FieldValue::Text(self.name.clone()),
            "description" => self.description.clone().into(),
            "color" => self.color.clone().into(),
            "owner" => FieldValue::Integer(self.owner),
            "members" => FieldValue::IdList(self.members.clone()),
            "isPrivate" => FieldValue::Bool(self.is_private),
            "createdAt" => FieldValue::Timestamp(self.created_at),
            "updatedAt" => FieldValue::Timestamp(self.updated_at),
            _ => FieldValue::Null,
        }
    }
}

/// DTO for inserting a project. The owner becomes the first member.
#[derive(Debug, Clone)]
pub struct NewProject {
    pub name: String,
    pub description: Option<String>,
    pub color: Option<String>,
    pub owner: DbId,
    pub is_private: bool,
}

/// Partial update of a project's descriptive fields.
#[derive(Debug, Clone, Default)]
pub struct ProjectChanges {
    pub name: Option<String>,
    pub description: Option<String>,
    pub color: Option<String>,
    pub is_private: Option<bool>,
}

impl ProjectChanges {
    pub fn apply(&self, project: &mut Project) {
        if let Some(name) = &self.name {
            project.name = name.clone();
        }
        if let Some(description) = &self.description {
            project.description = Some(description.clone());
        }
        if let Some(color) = &self.color {
            project.color = Some(color.clone());
        }
        if let Some(is_private) = self.is_private {
            project.is_private = is_private;
        }
    }
}
