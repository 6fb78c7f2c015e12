//! Todo entity model, embedded sub-documents, and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use taskhub_core::guard::TodoAccess;
use taskhub_core::query::{FieldValue, Queryable};
use taskhub_core::todo::{TodoPriority, TodoStatus};
use taskhub_core::types::{DbId, Timestamp};

use crate::DbError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subtask {
    pub title: String,
    #[serde(default)]
    pub is_completed: bool,
}

/// A stored file descriptor appended by the attachment upload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub file_name: String,
    pub file_path: String,
    pub file_type: String,
    pub uploaded_at: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub user: DbId,
    pub message: String,
    pub created_at: Timestamp,
}

/// A todo document. Subtasks, attachments and comments are embedded and
/// keep their insertion order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    pub id: DbId,
    pub title: String,
    pub description: Option<String>,
    pub status: TodoStatus,
    pub priority: TodoPriority,
    pub due_date: Option<Timestamp>,
    pub completed_at: Option<Timestamp>,
    pub estimated_time: Option<i32>,
    pub actual_time: Option<i32>,
    pub tags: Vec<String>,
    pub project: DbId,
    pub created_by: DbId,
    pub assigned_to: Option<DbId>,
    pub subtasks: Vec<Subtask>,
    pub attachments: Vec<Attachment>,
    pub comments: Vec<Comment>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl TodoAccess for Todo {
    fn created_by(&self) -> DbId {
        self.created_by
    }
}

impl Queryable for Todo {
    fn field_value(&self, name: &str) -> FieldValue {
        match name {
            "id" => FieldValue::Integer(self.id),
            "title" => FieldValue::Text(self.title.clone()),
            "description" => self.description.clone().into(),
            "status" => FieldValue::Text(self.status.as_str().to_string()),
            "priority" => FieldValue::Text(self.priority.as_str().to_string()),
            "dueDate" => self.due_date.into(),
            "completedAt" => self.completed_at.into(),
            "estimatedTime" => self.estimated_time.into(),
            "actualTime" => self.actual_time.into(),
            "tags" => FieldValue::TextList(self.tags.clone()),
            "project" => FieldValue::Integer(self.project),
            "createdBy" => FieldValue::Integer(self.created_by),
            "assignedTo" => self.assigned_to.into(),
            "createdAt" => FieldValue::Timestamp(self.created_at),
            "updatedAt" => FieldValue::Timestamp(self.updated_at),
            _ => FieldValue::Null,
        }
    }
}

/// Raw `todos` row. Enum columns are stored as text and embedded lists as
/// JSONB; [`Todo::try_from`] decodes them.
#[derive(Debug, FromRow)]
pub(crate) struct TodoRow {
    pub id: DbId,
    pub title: String,
    pub description: Option<String>,
    pub status: String,
    pub priority: String,
    pub due_date: Option<Timestamp>,
    pub completed_at: Option<Timestamp>,
    pub estimated_time: Option<i32>,
    pub actual_time: Option<i32>,
    pub tags: Vec<String>,
    pub project_id: DbId,
    pub created_by: DbId,
    pub assigned_to: Option<DbId>,
    pub subtasks: Json<Vec<Subtask>>,
    pub attachments: Json<Vec<Attachment>>,
    pub comments: Json<Vec<Comment>>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl TryFrom<TodoRow> for Todo {
    type Error = DbError;

    fn try_from(row: TodoRow) -> Result<Self, Self::Error> {
        let status = row
            .status
            .parse()
            .map_err(|_| DbError::Corrupt(format!("todo {}: status '{}'", row.id, row.status)))?;
        let priority = row.priority.parse().map_err(|_| {
            DbError::Corrupt(format!("todo {}: priority '{}'", row.id, row.priority))
        })?;

        Ok(Self {
            id: row.id,
            title: row.title,
            description: row.description,
            status,
            priority,
            due_date: row.due_date,
            completed_at: row.completed_at,
            estimated_time: row.estimated_time,
            actual_time: row.actual_time,
            tags: row.tags,
            project: row.project_id,
            created_by: row.created_by,
            assigned_to: row.assigned_to,
            subtasks: row.subtasks.0,
            attachments: row.attachments.0,
            comments: row.comments.0,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// DTO for inserting a todo. `created_by` is always the caller.
#[derive(Debug, Clone)]
pub struct NewTodo {
    pub title: String,
    pub description: Option<String>,
    pub status: TodoStatus,
    pub priority: TodoPriority,
    pub due_date: Option<Timestamp>,
    pub completed_at: Option<Timestamp>,
    pub estimated_time: Option<i32>,
    pub actual_time: Option<i32>,
    pub tags: Vec<String>,
    pub project: DbId,
    pub created_by: DbId,
    pub assigned_to: Option<DbId>,
    pub subtasks: Vec<Subtask>,
}
