use taskhub_core::error::CoreError;
use taskhub_core::guard::{require_read_project, require_write_project};
use taskhub_core::project::{CreateProjectRequest, UpdateProjectRequest};
use taskhub_core::query::{Page, QueryPlan, Scope};
use taskhub_core::types::DbId;
use taskhub_db::models::project::{NewProject, Project, ProjectChanges};
use taskhub_db::{ProjectRepository, UserRepository};

use crate::error::AppResult;
use crate::state::AppState;
use crate::ws::events::RealtimeEvent;

fn project_not_found(id: DbId) -> CoreError {
    CoreError::NotFound {
        entity: "Project",
        id,
    }
}

async fn load_project(state: &AppState, id: DbId) -> AppResult<Project> {
    Ok(state
        .store
        .find_project(id)
        .await?
        .ok_or_else(|| project_not_found(id))?)
}

/// Create a project owned by the caller, who is also its first member.
pub async fn create_project(
    state: &AppState,
    user_id: DbId,
    input: CreateProjectRequest,
) -> AppResult<Project> {
    let project = state
        .store
        .create_project(&NewProject {
            name: input.name,
            description: input.description,
            color: input.color,
            owner: user_id,
            is_private: input.is_private.unwrap_or(true),
        })
        .await?;

    tracing::info!(project_id = project.id, owner = user_id, "Project created");
    Ok(project)
}

pub async fn get_project(state: &AppState, user_id: DbId, id: DbId) -> AppResult<Project> {
    let project = load_project(state, id).await?;
    require_read_project(user_id, &project)?;
    Ok(project)
}

/// Projects the caller owns or belongs to.
pub async fn list_projects(
    state: &AppState,
    user_id: DbId,
    plan: &QueryPlan,
) -> AppResult<Page<Project>> {
    Ok(state.store.list_projects(Scope::Member(user_id), plan).await?)
}

/// Owner-only update of name, description, color and privacy.
pub async fn update_project(
    state: &AppState,
    user_id: DbId,
    id: DbId,
    input: UpdateProjectRequest,
) -> AppResult<Project> {
    let project = load_project(state, id).await?;
    require_write_project(user_id, &project)?;

    let changes = ProjectChanges {
        name: input.name,
        description: input.description,
        color: input.color,
        is_private: input.is_private,
    };
    let project = state
        .store
        .update_project(id, &changes)
        .await?
        .ok_or_else(|| project_not_found(id))?;

    state
        .rooms
        .emit(project.id, RealtimeEvent::ProjectUpdated, &project)
        .await;
    Ok(project)
}

/// Owner-only delete. Todos referencing the project are kept.
pub async fn delete_project(state: &AppState, user_id: DbId, id: DbId) -> AppResult<()> {
    let project = load_project(state, id).await?;
    require_write_project(user_id, &project)?;

    if !state.store.delete_project(id).await? {
        return Err(project_not_found(id).into());
    }
    tracing::info!(project_id = id, "Project deleted");
    Ok(())
}

/// Owner-only. Returns the updated member list.
pub async fn add_member(
    state: &AppState,
    user_id: DbId,
    id: DbId,
    member_id: DbId,
) -> AppResult<Vec<DbId>> {
    let project = load_project(state, id).await?;
    require_write_project(user_id, &project)?;

    if state.store.find_user(member_id).await?.is_none() {
        return Err(CoreError::NotFound {
            entity: "User",
            id: member_id,
        }
        .into());
    }
    if project.is_member(member_id) {
        return Err(
            CoreError::Validation("User is already a member of this project".into()).into(),
        );
    }

    let project = state
        .store
        .add_member(id, member_id)
        .await?
        .ok_or_else(|| project_not_found(id))?;

    tracing::info!(project_id = id, member_id, "Member added");
    state
        .rooms
        .emit(project.id, RealtimeEvent::ProjectUpdated, &project)
        .await;
    Ok(project.members)
}

/// Owner-only, except that removing the owner is refused for every caller.
/// Removing a user who is not a member succeeds without change.
pub async fn remove_member(
    state: &AppState,
    user_id: DbId,
    id: DbId,
    member_id: DbId,
) -> AppResult<Vec<DbId>> {
    let project = load_project(state, id).await?;
    if member_id == project.owner {
        return Err(CoreError::Validation("Cannot remove the project owner".into()).into());
    }
    require_write_project(user_id, &project)?;

    let project = state
        .store
        .remove_member(id, member_id)
        .await?
        .ok_or_else(|| project_not_found(id))?;

    tracing::info!(project_id = id, member_id, "Member removed");
    state
        .rooms
        .emit(project.id, RealtimeEvent::ProjectUpdated, &project)
        .await;
    Ok(project.members)
}
