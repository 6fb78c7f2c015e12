use axum::body::Bytes;
use chrono::Utc;
use taskhub_core::attachment::validate_extension;
use taskhub_core::error::CoreError;
use taskhub_core::guard::{require_mutate_todo, require_read_project};
use taskhub_core::query::{Page, QueryPlan, Scope};
use taskhub_core::todo::{
    next_completed_at, normalize_tags, validate_subtasks, CreateTodoRequest, SubtaskInput,
    TodoPriority, TodoStatus, UpdateTodoRequest,
};
use taskhub_core::types::DbId;
use taskhub_db::models::todo::{Attachment, Comment, NewTodo, Subtask, Todo};
use taskhub_db::{ProjectRepository, TodoRepository, UserRepository};

use crate::error::{AppError, AppResult};
use crate::state::AppState;
use crate::ws::events::{DeletedTodo, RealtimeEvent};

/// A file received on the attachment endpoint, not yet stored.
#[derive(Debug, Clone)]
pub struct Upload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Bytes,
}

fn todo_not_found(id: DbId) -> CoreError {
    CoreError::NotFound { entity: "Todo", id }
}

fn to_subtasks(input: Vec<SubtaskInput>) -> AppResult<Vec<Subtask>> {
    validate_subtasks(&input)?;
    Ok(input
        .into_iter()
        .map(|s| Subtask {
            title: s.title,
            is_completed: s.is_completed,
        })
        .collect())
}

/// The project must exist and be readable by the caller.
async fn check_project(state: &AppState, user_id: DbId, project_id: DbId) -> AppResult<()> {
    let project = state
        .store
        .find_project(project_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "Project",
            id: project_id,
        })?;
    require_read_project(user_id, &project)?;
    Ok(())
}

/// An assignee must be a registered user.
async fn check_assignee(state: &AppState, assignee: Option<DbId>) -> AppResult<()> {
    let Some(user_id) = assignee else {
        return Ok(());
    };
    if state.store.find_user(user_id).await?.is_none() {
        return Err(CoreError::NotFound {
            entity: "User",
            id: user_id,
        }
        .into());
    }
    Ok(())
}

/// Load a todo the caller created. Anyone else gets 401, even project owners.
async fn load_own_todo(state: &AppState, user_id: DbId, id: DbId) -> AppResult<Todo> {
    let todo = state
        .store
        .find_todo(id)
        .await?
        .ok_or_else(|| todo_not_found(id))?;
    require_mutate_todo(user_id, &todo)?;
    Ok(todo)
}

async fn save(state: &AppState, todo: &Todo) -> AppResult<Todo> {
    Ok(state
        .store
        .save_todo(todo)
        .await?
        .ok_or_else(|| todo_not_found(todo.id))?)
}

pub async fn create_todo(
    state: &AppState,
    user_id: DbId,
    input: CreateTodoRequest,
) -> AppResult<Todo> {
    let subtasks = to_subtasks(input.subtasks)?;
    check_project(state, user_id, input.project).await?;
    check_assignee(state, input.assigned_to).await?;

    let status = input.status.unwrap_or_default();
    let todo = state
        .store
        .create_todo(&NewTodo {
            title: input.title,
            description: input.description,
            status,
            priority: input.priority.unwrap_or_default(),
            due_date: input.due_date,
            completed_at: next_completed_at(TodoStatus::Pending, status, None, Utc::now()),
            estimated_time: input.estimated_time,
            actual_time: input.actual_time,
            tags: normalize_tags(input.tags),
            project: input.project,
            created_by: user_id,
            assigned_to: input.assigned_to,
            subtasks,
        })
        .await?;

    tracing::info!(todo_id = todo.id, project_id = todo.project, "Todo created");
    state
        .rooms
        .emit(todo.project, RealtimeEvent::TodoCreated, &todo)
        .await;
    Ok(todo)
}

pub async fn get_todo(state: &AppState, user_id: DbId, id: DbId) -> AppResult<Todo> {
    load_own_todo(state, user_id, id).await
}

/// Todos created by the caller.
pub async fn list_todos(
    state: &AppState,
    user_id: DbId,
    plan: &QueryPlan,
) -> AppResult<Page<Todo>> {
    Ok(state.store.list_todos(Scope::CreatedBy(user_id), plan).await?)
}

/// Merge the request into the stored document and save it whole.
pub async fn update_todo(
    state: &AppState,
    user_id: DbId,
    id: DbId,
    input: UpdateTodoRequest,
) -> AppResult<Todo> {
    let mut todo = load_own_todo(state, user_id, id).await?;

    if let Some(project) = input.project {
        if project != todo.project {
            check_project(state, user_id, project).await?;
            todo.project = project;
        }
    }
    if let Some(subtasks) = input.subtasks {
        todo.subtasks = to_subtasks(subtasks)?;
    }
    if let Some(status) = input.status {
        todo.completed_at = next_completed_at(todo.status, status, todo.completed_at, Utc::now());
        todo.status = status;
    }

    todo.title = input.title;
    if input.description.is_some() {
        todo.description = input.description;
    }
    if let Some(priority) = input.priority {
        todo.priority = priority;
    }
    if input.due_date.is_some() {
        todo.due_date = input.due_date;
    }
    if input.estimated_time.is_some() {
        todo.estimated_time = input.estimated_time;
    }
    if input.actual_time.is_some() {
        todo.actual_time = input.actual_time;
    }
    if let Some(tags) = input.tags {
        todo.tags = normalize_tags(tags);
    }
    if input.assigned_to.is_some() && input.assigned_to != todo.assigned_to {
        check_assignee(state, input.assigned_to).await?;
        todo.assigned_to = input.assigned_to;
    }

    let todo = save(state, &todo).await?;
    state
        .rooms
        .emit(todo.project, RealtimeEvent::TodoUpdated, &todo)
        .await;
    Ok(todo)
}

pub async fn delete_todo(state: &AppState, user_id: DbId, id: DbId) -> AppResult<()> {
    let todo = load_own_todo(state, user_id, id).await?;
    if !state.store.delete_todo(id).await? {
        return Err(todo_not_found(id).into());
    }

    tracing::info!(todo_id = id, project_id = todo.project, "Todo deleted");
    state
        .rooms
        .emit(
            todo.project,
            RealtimeEvent::TodoDeleted,
            &DeletedTodo {
                id,
                project: todo.project,
            },
        )
        .await;
    Ok(())
}

/// Set the status from its wire name. Entering `completed` stamps `completedAt`.
pub async fn update_status(
    state: &AppState,
    user_id: DbId,
    id: DbId,
    status: &str,
) -> AppResult<Todo> {
    let status: TodoStatus = status.parse()?;
    let mut todo = load_own_todo(state, user_id, id).await?;

    todo.completed_at = next_completed_at(todo.status, status, todo.completed_at, Utc::now());
    todo.status = status;

    let todo = save(state, &todo).await?;
    state
        .rooms
        .emit(todo.project, RealtimeEvent::TodoUpdated, &todo)
        .await;
    Ok(todo)
}

pub async fn update_priority(
    state: &AppState,
    user_id: DbId,
    id: DbId,
    priority: &str,
) -> AppResult<Todo> {
    let priority: TodoPriority = priority.parse()?;
    let mut todo = load_own_todo(state, user_id, id).await?;
    todo.priority = priority;

    let todo = save(state, &todo).await?;
    state
        .rooms
        .emit(todo.project, RealtimeEvent::TodoUpdated, &todo)
        .await;
    Ok(todo)
}

/// Store the upload and append its descriptor. Returns every attachment.
///
/// The extension is checked before anything is written, and the file is
/// only stored once the caller is known to own the todo.
pub async fn add_attachment(
    state: &AppState,
    user_id: DbId,
    id: DbId,
    upload: Upload,
) -> AppResult<Vec<Attachment>> {
    validate_extension(&upload.file_name)?;
    load_own_todo(state, user_id, id).await?;

    let stored = state
        .blobs
        .put(&upload.file_name, &upload.content_type, &upload.bytes)
        .await
        .map_err(|e| AppError::InternalError(format!("store attachment: {e}")))?;

    let attachment = Attachment {
        file_name: stored.file_name,
        file_path: stored.file_path,
        file_type: stored.file_type,
        uploaded_at: Utc::now(),
    };
    let todo = state
        .store
        .push_attachment(id, &attachment)
        .await?
        .ok_or_else(|| todo_not_found(id))?;

    tracing::info!(todo_id = id, file = %attachment.file_name, "Attachment added");
    Ok(todo.attachments)
}

pub async fn add_comment(
    state: &AppState,
    user_id: DbId,
    id: DbId,
    message: String,
) -> AppResult<Todo> {
    load_own_todo(state, user_id, id).await?;

    let comment = Comment {
        user: user_id,
        message,
        created_at: Utc::now(),
    };
    let todo = state
        .store
        .push_comment(id, &comment)
        .await?
        .ok_or_else(|| todo_not_found(id))?;

    state
        .rooms
        .emit(todo.project, RealtimeEvent::TodoUpdated, &todo)
        .await;
    Ok(todo)
}
