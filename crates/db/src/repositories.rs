//! Storage-agnostic repository traits.
//!
//! Services depend on [`Store`] only, so the PostgreSQL implementation and
//! the in-memory document store are interchangeable behind an `Arc<dyn Store>`.
//! Every method is a single-document operation; concurrent writers to the
//! same document are last-write-wins.

use async_trait::async_trait;
use taskhub_core::query::{Page, QueryPlan, Scope};
use taskhub_core::types::DbId;

use crate::models::project::{NewProject, Project, ProjectChanges};
use crate::models::todo::{Attachment, Comment, NewTodo, Todo};
use crate::models::user::{CreateUser, User};
use crate::DbError;

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a user. Fails with [`DbError::Duplicate`] on a taken email or username.
    async fn create_user(&self, input: &CreateUser) -> Result<User, DbError>;

    async fn find_user(&self, id: DbId) -> Result<Option<User>, DbError>;

    /// Lookup by (already lowercased) email.
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, DbError>;
}

#[async_trait]
pub trait ProjectRepository: Send + Sync {
    /// Insert a project with `members = [owner]`.
    async fn create_project(&self, input: &NewProject) -> Result<Project, DbError>;

    async fn find_project(&self, id: DbId) -> Result<Option<Project>, DbError>;

    async fn list_projects(&self, scope: Scope, plan: &QueryPlan) -> Result<Page<Project>, DbError>;

    /// Apply the non-`None` changes. Returns `None` if the project is gone.
    async fn update_project(
        &self,
        id: DbId,
        changes: &ProjectChanges,
    ) -> Result<Option<Project>, DbError>;

    /// Append `user_id` to members unless already present.
    async fn add_member(&self, id: DbId, user_id: DbId) -> Result<Option<Project>, DbError>;

    /// Remove `user_id` from members; a no-op when absent.
    async fn remove_member(&self, id: DbId, user_id: DbId) -> Result<Option<Project>, DbError>;

    /// Delete the project only. Its todos are left in place.
    async fn delete_project(&self, id: DbId) -> Result<bool, DbError>;
}

#[async_trait]
pub trait TodoRepository: Send + Sync {
    async fn create_todo(&self, input: &NewTodo) -> Result<Todo, DbError>;

    async fn find_todo(&self, id: DbId) -> Result<Option<Todo>, DbError>;

    async fn list_todos(&self, scope: Scope, plan: &QueryPlan) -> Result<Page<Todo>, DbError>;

    /// Replace every mutable field of the stored document with `todo`'s and
    /// bump `updated_at`. `id`, `created_by` and `created_at` are not written.
    async fn save_todo(&self, todo: &Todo) -> Result<Option<Todo>, DbError>;

    async fn push_attachment(
        &self,
        id: DbId,
        attachment: &Attachment,
    ) -> Result<Option<Todo>, DbError>;

    async fn push_comment(&self, id: DbId, comment: &Comment) -> Result<Option<Todo>, DbError>;

    async fn delete_todo(&self, id: DbId) -> Result<bool, DbError>;
}

/// The complete document store.
#[async_trait]
pub trait Store: UserRepository + ProjectRepository + TodoRepository {
    /// Cheap liveness probe for health checks.
    async fn ping(&self) -> Result<(), DbError>;
}
