//! `todos` table.

use async_trait::async_trait;
use sqlx::types::Json;
use taskhub_core::query::{Page, QueryPlan, Scope};
use taskhub_core::types::DbId;

use super::query::fetch_page;
use super::PgStore;
use crate::models::todo::{Attachment, Comment, NewTodo, Todo, TodoRow};
use crate::repositories::TodoRepository;
use crate::DbError;

const COLUMNS: &str = "id, title, description, status, priority, due_date, completed_at, \
                       estimated_time, actual_time, tags, project_id, created_by, assigned_to, \
                       subtasks, attachments, comments, created_at, updated_at";

fn decode(row: Option<TodoRow>) -> Result<Option<Todo>, DbError> {
    row.map(Todo::try_from).transpose()
}

#[async_trait]
impl TodoRepository for PgStore {
    async fn create_todo(&self, input: &NewTodo) -> Result<Todo, DbError> {
        let query = format!(
            "INSERT INTO todos (title, description, status, priority, due_date, completed_at,
                                estimated_time, actual_time, tags, project_id, created_by,
                                assigned_to, subtasks)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
             RETURNING {COLUMNS}"
        );
        let row = sqlx::query_as::<_, TodoRow>(&query)
            .bind(&input.title)
            .bind(&input.description)
            .bind(input.status.as_str())
            .bind(input.priority.as_str())
            .bind(input.due_date)
            .bind(input.completed_at)
            .bind(input.estimated_time)
            .bind(input.actual_time)
            .bind(&input.tags)
            .bind(input.project)
            .bind(input.created_by)
            .bind(input.assigned_to)
            .bind(Json(&input.subtasks))
            .fetch_one(&self.pool)
            .await?;
        Todo::try_from(row)
    }

    async fn find_todo(&self, id: DbId) -> Result<Option<Todo>, DbError> {
        let query = format!("SELECT {COLUMNS} FROM todos WHERE id = $1");
        let row = sqlx::query_as::<_, TodoRow>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        decode(row)
    }

    async fn list_todos(&self, scope: Scope, plan: &QueryPlan) -> Result<Page<Todo>, DbError> {
        let page = fetch_page::<TodoRow>(&self.pool, "todos", COLUMNS, scope, plan).await?;
        let items = page
            .items
            .into_iter()
            .map(Todo::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Page {
            items,
            total: page.total,
        })
    }

    async fn save_todo(&self, todo: &Todo) -> Result<Option<Todo>, DbError> {
        let query = format!(
            "UPDATE todos SET
                title = $2,
                description = $3,
                status = $4,
                priority = $5,
                due_date = $6,
                completed_at = $7,
                estimated_time = $8,
                actual_time = $9,
                tags = $10,
                project_id = $11,
                assigned_to = $12,
                subtasks = $13,
                attachments = $14,
                comments = $15,
                updated_at = NOW()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        let row = sqlx::query_as::<_, TodoRow>(&query)
            .bind(todo.id)
            .bind(&todo.title)
            .bind(&todo.description)
            .bind(todo.status.as_str())
            .bind(todo.priority.as_str())
            .bind(todo.due_date)
            .bind(todo.completed_at)
            .bind(todo.estimated_time)
            .bind(todo.actual_time)
            .bind(&todo.tags)
            .bind(todo.project)
            .bind(todo.assigned_to)
            .bind(Json(&todo.subtasks))
            .bind(Json(&todo.attachments))
            .bind(Json(&todo.comments))
            .fetch_optional(&self.pool)
            .await?;
        decode(row)
    }

    async fn push_attachment(
        &self,
        id: DbId,
        attachment: &Attachment,
    ) -> Result<Option<Todo>, DbError> {
        let query = format!(
            "UPDATE todos SET attachments = attachments || $2::jsonb, updated_at = NOW()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        let row = sqlx::query_as::<_, TodoRow>(&query)
            .bind(id)
            .bind(Json([attachment]))
            .fetch_optional(&self.pool)
            .await?;
        decode(row)
    }

    async fn push_comment(&self, id: DbId, comment: &Comment) -> Result<Option<Todo>, DbError> {
        let query = format!(
            "UPDATE todos SET comments = comments || $2::jsonb, updated_at = NOW()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        let row = sqlx::query_as::<_, TodoRow>(&query)
            .bind(id)
            .bind(Json([comment]))
            .fetch_optional(&self.pool)
            .await?;
        decode(row)
    }

    async fn delete_todo(&self, id: DbId) -> Result<bool, DbError> {
        let result = sqlx::query("DELETE FROM todos WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
