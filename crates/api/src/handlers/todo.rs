//! Handlers for the `/todos` resource.

use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use serde_json::Value;
use taskhub_core::attachment::{validate_extension, ATTACHMENT_FIELD};
use taskhub_core::query::QueryPlan;
use taskhub_core::todo::{
    AddCommentRequest, CreateTodoRequest, PriorityUpdateRequest, StatusUpdateRequest,
    UpdateTodoRequest, TODOS,
};
use taskhub_core::types::DbId;
use taskhub_db::models::todo::{Attachment, Todo};

use crate::error::{AppError, AppResult};
use crate::extract::{ApiJson, ApiPath, QueryPairs, ValidJson};
use crate::middleware::auth::AuthUser;
use crate::response::{ApiResponse, Empty, TotalKey};
use crate::services::todo::{self as service, Upload};
use crate::state::AppState;

/// GET /api/todos
pub async fn list(
    State(state): State<AppState>,
    auth: AuthUser,
    QueryPairs(params): QueryPairs,
) -> AppResult<ApiResponse<Vec<Value>>> {
    let plan = QueryPlan::parse(&TODOS, &params)?;
    let page = service::list_todos(&state, auth.user_id, &plan).await?;
    ApiResponse::page(page, &plan, TotalKey::Todos)
}

/// POST /api/todos
pub async fn create(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidJson(input): ValidJson<CreateTodoRequest>,
) -> AppResult<(StatusCode, ApiResponse<Todo>)> {
    let todo = service::create_todo(&state, auth.user_id, input).await?;
    Ok((StatusCode::CREATED, ApiResponse::new(todo)))
}

/// GET /api/todos/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(id): ApiPath<DbId>,
) -> AppResult<ApiResponse<Todo>> {
    let todo = service::get_todo(&state, auth.user_id, id).await?;
    Ok(ApiResponse::new(todo))
}

/// PUT /api/todos/{id}
pub async fn update(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(id): ApiPath<DbId>,
    ValidJson(input): ValidJson<UpdateTodoRequest>,
) -> AppResult<ApiResponse<Todo>> {
    let todo = service::update_todo(&state, auth.user_id, id, input).await?;
    Ok(ApiResponse::new(todo))
}

/// DELETE /api/todos/{id}
pub async fn delete(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(id): ApiPath<DbId>,
) -> AppResult<ApiResponse<Empty>> {
    service::delete_todo(&state, auth.user_id, id).await?;
    Ok(ApiResponse::new(Empty {}))
}

/// PATCH /api/todos/{id}/status
pub async fn update_status(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(id): ApiPath<DbId>,
    ApiJson(input): ApiJson<StatusUpdateRequest>,
) -> AppResult<ApiResponse<Todo>> {
    let todo = service::update_status(&state, auth.user_id, id, &input.status).await?;
    Ok(ApiResponse::new(todo))
}

/// PATCH /api/todos/{id}/priority
pub async fn update_priority(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(id): ApiPath<DbId>,
    ApiJson(input): ApiJson<PriorityUpdateRequest>,
) -> AppResult<ApiResponse<Todo>> {
    let todo = service::update_priority(&state, auth.user_id, id, &input.priority).await?;
    Ok(ApiResponse::new(todo))
}

/// POST /api/todos/{id}/attachments
///
/// Multipart upload with the file in the `attachment` field. Other fields
/// are ignored.
pub async fn add_attachment(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(id): ApiPath<DbId>,
    multipart: Result<Multipart, MultipartRejection>,
) -> AppResult<ApiResponse<Vec<Attachment>>> {
    let mut multipart = multipart.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let mut upload = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        if field.name() != Some(ATTACHMENT_FIELD) {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        validate_extension(&file_name)?;
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(e.to_string()))?;
        if bytes.len() > state.config.max_upload_bytes {
            return Err(AppError::BadRequest("File too large".into()));
        }

        upload = Some(Upload {
            file_name,
            content_type,
            bytes,
        });
    }

    let upload = upload.ok_or_else(|| AppError::BadRequest("Please upload a file".into()))?;
    let attachments = service::add_attachment(&state, auth.user_id, id, upload).await?;
    Ok(ApiResponse::new(attachments))
}

/// POST /api/todos/{id}/comments
pub async fn add_comment(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(id): ApiPath<DbId>,
    ValidJson(input): ValidJson<AddCommentRequest>,
) -> AppResult<(StatusCode, ApiResponse<Todo>)> {
    let todo = service::add_comment(&state, auth.user_id, id, input.message).await?;
    Ok((StatusCode::CREATED, ApiResponse::new(todo)))
}
