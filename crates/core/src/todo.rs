//! Todo field rules: status/priority enums, the `completedAt` transition,
//! the queryable field registry, and request payloads.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::CoreError;
use crate::query::{Collection, FieldKind, FieldSpec};
use crate::serde_util::trimmed;
use crate::types::{DbId, Timestamp};

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TodoStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
    Cancelled,
}

impl TodoStatus {
    pub const ALL: [TodoStatus; 4] = [
        TodoStatus::Pending,
        TodoStatus::InProgress,
        TodoStatus::Completed,
        TodoStatus::Cancelled,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TodoStatus::Pending => "pending",
            TodoStatus::InProgress => "in-progress",
            TodoStatus::Completed => "completed",
            TodoStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for TodoStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TodoStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|v| v.as_str() == s)
            .ok_or_else(|| {
                CoreError::Validation(format!(
                    "Invalid status '{s}'. Must be one of: pending, in-progress, completed, cancelled"
                ))
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TodoPriority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

impl TodoPriority {
    pub const ALL: [TodoPriority; 4] = [
        TodoPriority::Low,
        TodoPriority::Medium,
        TodoPriority::High,
        TodoPriority::Urgent,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TodoPriority::Low => "low",
            TodoPriority::Medium => "medium",
            TodoPriority::High => "high",
            TodoPriority::Urgent => "urgent",
        }
    }
}

impl fmt::Display for TodoPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TodoPriority {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|v| v.as_str() == s)
            .ok_or_else(|| {
                CoreError::Validation(format!(
                    "Invalid priority '{s}'. Must be one of: low, medium, high, urgent"
                ))
            })
    }
}

/// `completedAt` after a status change.
///
/// Stamped only on the transition into `completed`. Leaving `completed`
/// keeps the old stamp, and re-saving an already completed todo does not
/// move it.
pub fn next_completed_at(
    previous: TodoStatus,
    next: TodoStatus,
    current: Option<Timestamp>,
    now: Timestamp,
) -> Option<Timestamp> {
    if next == TodoStatus::Completed && previous != TodoStatus::Completed {
        Some(now)
    } else {
        current
    }
}

// ---------------------------------------------------------------------------
// Query registry
// ---------------------------------------------------------------------------

static TODO_FIELDS: &[FieldSpec] = &[
    FieldSpec::new("id", "id", FieldKind::Id),
    FieldSpec::new("title", "title", FieldKind::Text),
    FieldSpec::new("description", "description", FieldKind::Text),
    FieldSpec::new("status", "status", FieldKind::Keyword),
    FieldSpec::new("priority", "priority", FieldKind::Keyword),
    FieldSpec::new("dueDate", "due_date", FieldKind::Timestamp),
    FieldSpec::new("completedAt", "completed_at", FieldKind::Timestamp),
    FieldSpec::new("estimatedTime", "estimated_time", FieldKind::Integer),
    FieldSpec::new("actualTime", "actual_time", FieldKind::Integer),
    FieldSpec::new("tags", "tags", FieldKind::TextList),
    FieldSpec::new("project", "project_id", FieldKind::Id),
    FieldSpec::new("createdBy", "created_by", FieldKind::Id),
    FieldSpec::new("assignedTo", "assigned_to", FieldKind::Id),
    FieldSpec::new("createdAt", "created_at", FieldKind::Timestamp),
    FieldSpec::new("updatedAt", "updated_at", FieldKind::Timestamp),
];

/// Queryable fields of the `todos` collection.
pub static TODOS: Collection = Collection {
    name: "todos",
    fields: TODO_FIELDS,
    search_fields: &["title", "description"],
    default_sort: "-createdAt",
};

// ---------------------------------------------------------------------------
// Request payloads
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubtaskInput {
    #[serde(deserialize_with = "trimmed")]
    pub title: String,
    #[serde(default)]
    pub is_completed: bool,
}

/// Body of `POST /api/todos`.
///
/// `createdBy` is deliberately absent: the creator is always the caller.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateTodoRequest {
    #[serde(deserialize_with = "trimmed")]
    #[validate(length(min = 1, max = 100, message = "Title is required and cannot be more than 100 characters"))]
    pub title: String,
    #[validate(length(max = 1000, message = "Description cannot be more than 1000 characters"))]
    pub description: Option<String>,
    pub status: Option<TodoStatus>,
    pub priority: Option<TodoPriority>,
    pub due_date: Option<Timestamp>,
    #[validate(range(min = 0, message = "Estimated time cannot be negative"))]
    pub estimated_time: Option<i32>,
    #[validate(range(min = 0, message = "Actual time cannot be negative"))]
    pub actual_time: Option<i32>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub project: DbId,
    pub assigned_to: Option<DbId>,
    #[serde(default)]
    pub subtasks: Vec<SubtaskInput>,
}

/// Body of `PUT /api/todos/{id}`. Omitted optional fields keep their value.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTodoRequest {
    #[serde(deserialize_with = "trimmed")]
    #[validate(length(min = 1, max = 100, message = "Title is required and cannot be more than 100 characters"))]
    pub title: String,
    #[validate(length(max = 1000, message = "Description cannot be more than 1000 characters"))]
    pub description: Option<String>,
    pub status: Option<TodoStatus>,
    pub priority: Option<TodoPriority>,
    pub due_date: Option<Timestamp>,
    #[validate(range(min = 0, message = "Estimated time cannot be negative"))]
    pub estimated_time: Option<i32>,
    #[validate(range(min = 0, message = "Actual time cannot be negative"))]
    pub actual_time: Option<i32>,
    pub tags: Option<Vec<String>>,
    pub project: Option<DbId>,
    pub assigned_to: Option<DbId>,
    pub subtasks: Option<Vec<SubtaskInput>>,
}

/// Body of `PATCH /api/todos/{id}/status`. Parsed by hand so any value
/// outside the enum is a validation failure rather than a decode error.
#[derive(Debug, Clone, Deserialize)]
pub struct StatusUpdateRequest {
    pub status: String,
}

/// Body of `PATCH /api/todos/{id}/priority`.
#[derive(Debug, Clone, Deserialize)]
pub struct PriorityUpdateRequest {
    pub priority: String,
}

/// Body of `POST /api/todos/{id}/comments`.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct AddCommentRequest {
    #[serde(deserialize_with = "trimmed")]
    #[validate(length(min = 1, max = 1000, message = "Comment must be between 1 and 1000 characters"))]
    pub message: String,
}

/// Reject subtasks with a blank title.
pub fn validate_subtasks(subtasks: &[SubtaskInput]) -> Result<(), CoreError> {
    if subtasks.iter().any(|s| s.title.is_empty()) {
        return Err(CoreError::Validation("Subtask title is required".into()));
    }
    Ok(())
}

/// Trim tags and drop empty or duplicate entries, keeping first occurrence order.
pub fn normalize_tags(tags: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.trim().to_string();
        if !tag.is_empty() && !out.contains(&tag) {
            out.push(tag);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use chrono::{Duration, Utc};

    use super::*;

    #[test]
    fn status_parses_only_known_values() {
        assert_eq!("in-progress".parse::<TodoStatus>().unwrap(), TodoStatus::InProgress);
        assert_matches!("done".parse::<TodoStatus>(), Err(CoreError::Validation(_)));
        assert_matches!("Completed".parse::<TodoStatus>(), Err(CoreError::Validation(_)));
    }

    #[test]
    fn priority_parses_only_known_values() {
        assert_eq!("urgent".parse::<TodoPriority>().unwrap(), TodoPriority::Urgent);
        assert_matches!("critical".parse::<TodoPriority>(), Err(CoreError::Validation(_)));
    }

    #[test]
    fn defaults_are_pending_and_medium() {
        assert_eq!(TodoStatus::default(), TodoStatus::Pending);
        assert_eq!(TodoPriority::default(), TodoPriority::Medium);
    }

    #[test]
    fn completed_at_is_set_on_transition_into_completed() {
        let now = Utc::now();
        let stamped = next_completed_at(TodoStatus::Pending, TodoStatus::Completed, None, now);
        assert_eq!(stamped, Some(now));
    }

    #[test]
    fn completed_at_survives_leaving_completed() {
        let then = Utc::now() - Duration::hours(1);
        let now = Utc::now();
        let kept = next_completed_at(TodoStatus::Completed, TodoStatus::Pending, Some(then), now);
        assert_eq!(kept, Some(then));
    }

    #[test]
    fn completed_to_completed_does_not_restamp() {
        let then = Utc::now() - Duration::hours(1);
        let now = Utc::now();
        let kept = next_completed_at(TodoStatus::Completed, TodoStatus::Completed, Some(then), now);
        assert_eq!(kept, Some(then));
    }

    #[test]
    fn create_request_trims_and_validates_title() {
        let req: CreateTodoRequest =
            serde_json::from_value(serde_json::json!({"title": "   ", "project": 1})).unwrap();
        assert_eq!(req.title, "");
        assert!(req.validate().is_err());

        let req: CreateTodoRequest = serde_json::from_value(
            serde_json::json!({"title": "  Ship it ", "project": 1, "status": "in-progress"}),
        )
        .unwrap();
        assert_eq!(req.title, "Ship it");
        assert_eq!(req.status, Some(TodoStatus::InProgress));
        assert!(req.validate().is_ok());
    }

    #[test]
    fn create_request_rejects_long_description() {
        let req: CreateTodoRequest = serde_json::from_value(serde_json::json!({
            "title": "x",
            "project": 1,
            "description": "d".repeat(1001),
        }))
        .unwrap();
        let errors = req.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("description"));
    }

    #[test]
    fn create_request_rejects_unknown_status() {
        let result: Result<CreateTodoRequest, _> = serde_json::from_value(
            serde_json::json!({"title": "x", "project": 1, "status": "done"}),
        );
        assert!(result.is_err());
    }

    #[test]
    fn tags_are_normalized() {
        let tags = normalize_tags(vec![" a ".into(), "b".into(), "a".into(), "".into()]);
        assert_eq!(tags, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn blank_subtask_titles_are_rejected() {
        let subtasks = vec![SubtaskInput {
            title: String::new(),
            is_completed: false,
        }];
        assert_matches!(validate_subtasks(&subtasks), Err(CoreError::Validation(_)));
    }

    #[test]
    fn registry_exposes_search_and_set_fields() {
        assert_eq!(TODOS.field("status").unwrap().kind, FieldKind::Keyword);
        assert_eq!(TODOS.field("tags").unwrap().kind, FieldKind::TextList);
        assert_eq!(TODOS.field("project").unwrap().column, "project_id");
        assert!(TODOS.field("subtasks").is_none());
    }
}
