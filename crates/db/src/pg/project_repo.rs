//! `projects` table.

use async_trait::async_trait;
use taskhub_core::query::{Page, QueryPlan, Scope};
use taskhub_core::types::DbId;

use super::query::fetch_page;
use super::PgStore;
use crate::models::project::{NewProject, Project, ProjectChanges};
use crate::repositories::ProjectRepository;
use crate::DbError;

const COLUMNS: &str =
    "id, name, description, color, owner_id, member_ids, is_private, created_at, updated_at";

#[async_trait]
impl ProjectRepository for PgStore {
    async fn create_project(&self, input: &NewProject) -> Result<Project, DbError> {
        let query = format!(
            "INSERT INTO projects (name, description, color, owner_id, member_ids, is_private)
             VALUES ($1, $2, $3, $4, ARRAY[$4]::BIGINT[], $5)
             RETURNING {COLUMNS}"
        );
        let project = sqlx::query_as::<_, Project>(&query)
            .bind(&input.name)
            .bind(&input.description)
            .bind(&input.color)
            .bind(input.owner)
            .bind(input.is_private)
            .fetch_one(&self.pool)
            .await?;
        Ok(project)
    }

    async fn find_project(&self, id: DbId) -> Result<Option<Project>, DbError> {
        let query = format!("SELECT {COLUMNS} FROM projects WHERE id = $1");
        let project = sqlx::query_as::<_, Project>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(project)
    }

    async fn list_projects(&self, scope: Scope, plan: &QueryPlan) -> Result<Page<Project>, DbError> {
        Ok(fetch_page(&self.pool, "projects", COLUMNS, scope, plan).await?)
    }

    async fn update_project(
        &self,
        id: DbId,
        changes: &ProjectChanges,
    ) -> Result<Option<Project>, DbError> {
        let query = format!(
            "UPDATE projects SET
                name = COALESCE($2, name),
                description = COALESCE($3, description),
                color = COALESCE($4, color),
                is_private = COALESCE($5, is_private),
                updated_at = NOW()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        let project = sqlx::query_as::<_, Project>(&query)
            .bind(id)
            .bind(&changes.name)
            .bind(&changes.description)
            .bind(&changes.color)
            .bind(changes.is_private)
            .fetch_optional(&self.pool)
            .await?;
        Ok(project)
    }

    async fn add_member(&self, id: DbId, user_id: DbId) -> Result<Option<Project>, DbError> {
        let query = format!(
            "UPDATE projects SET
                member_ids = CASE WHEN $2 = ANY(member_ids) THEN member_ids
                                  ELSE array_append(member_ids, $2) END,
                updated_at = NOW()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        let project = sqlx::query_as::<_, Project>(&query)
            .bind(id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(project)
    }

    async fn remove_member(&self, id: DbId, user_id: DbId) -> Result<Option<Project>, DbError> {
        let query = format!(
            "UPDATE projects SET
                member_ids = array_remove(member_ids, $2),
                updated_at = NOW()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        let project = sqlx::query_as::<_, Project>(&query)
            .bind(id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(project)
    }

    async fn delete_project(&self, id: DbId) -> Result<bool, DbError> {
        let result = sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
