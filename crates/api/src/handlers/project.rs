//! Handlers for the `/projects` resource.

use axum::extract::State;
use axum::http::StatusCode;
use serde_json::Value;
use taskhub_core::project::{AddMemberRequest, CreateProjectRequest, UpdateProjectRequest, PROJECTS};
use taskhub_core::query::QueryPlan;
use taskhub_core::types::DbId;
use taskhub_db::models::project::Project;

use crate::error::AppResult;
use crate::extract::{ApiJson, ApiPath, QueryPairs, ValidJson};
use crate::middleware::auth::AuthUser;
use crate::response::{ApiResponse, Empty, TotalKey};
use crate::services::project as service;
use crate::state::AppState;

/// GET /api/projects
pub async fn list(
    State(state): State<AppState>,
    auth: AuthUser,
    QueryPairs(params): QueryPairs,
) -> AppResult<ApiResponse<Vec<Value>>> {
    let plan = QueryPlan::parse(&PROJECTS, &params)?;
    let page = service::list_projects(&state, auth.user_id, &plan).await?;
    ApiResponse::page(page, &plan, TotalKey::Projects)
}

/// POST /api/projects
pub async fn create(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidJson(input): ValidJson<CreateProjectRequest>,
) -> AppResult<(StatusCode, ApiResponse<Project>)> {
    let project = service::create_project(&state, auth.user_id, input).await?;
    Ok((StatusCode::CREATED, ApiResponse::new(project)))
}

/// GET /api/projects/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(id): ApiPath<DbId>,
) -> AppResult<ApiResponse<Project>> {
    let project = service::get_project(&state, auth.user_id, id).await?;
    Ok(ApiResponse::new(project))
}

/// PUT /api/projects/{id}
pub async fn update(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(id): ApiPath<DbId>,
    ValidJson(input): ValidJson<UpdateProjectRequest>,
) -> AppResult<ApiResponse<Project>> {
    let project = service::update_project(&state, auth.user_id, id, input).await?;
    Ok(ApiResponse::new(project))
}

/// DELETE /api/projects/{id}
pub async fn delete(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(id): ApiPath<DbId>,
) -> AppResult<ApiResponse<Empty>> {
    service::delete_project(&state, auth.user_id, id).await?;
    Ok(ApiResponse::new(Empty {}))
}

/// POST /api/projects/{id}/members
pub async fn add_member(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(id): ApiPath<DbId>,
    ApiJson(input): ApiJson<AddMemberRequest>,
) -> AppResult<ApiResponse<Vec<DbId>>> {
    let members = service::add_member(&state, auth.user_id, id, input.user_id).await?;
    Ok(ApiResponse::new(members))
}

/// DELETE /api/projects/{id}/members/{user_id}
pub async fn remove_member(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath((id, user_id)): ApiPath<(DbId, DbId)>,
) -> AppResult<ApiResponse<Vec<DbId>>> {
    let members = service::remove_member(&state, auth.user_id, id, user_id).await?;
    Ok(ApiResponse::new(members))
}
