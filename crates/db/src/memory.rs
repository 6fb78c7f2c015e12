//! In-memory document store.
//!
//! Used when no `DATABASE_URL` is configured and by the test suites. Listing
//! queries run through [`QueryPlan::execute`], so filter, search, sort and
//! pagination semantics match the SQL compilation in [`crate::pg`].

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use taskhub_core::query::{Page, QueryPlan, Scope};
use taskhub_core::types::DbId;
use tokio::sync::RwLock;

use crate::models::project::{NewProject, Project, ProjectChanges};
use crate::models::todo::{Attachment, Comment, NewTodo, Todo};
use crate::models::user::{CreateUser, User};
use crate::repositories::{ProjectRepository, Store, TodoRepository, UserRepository};
use crate::DbError;

#[derive(Debug, Default)]
struct Collections {
    next_id: DbId,
    users: BTreeMap<DbId, User>,
    projects: BTreeMap<DbId, Project>,
    todos: BTreeMap<DbId, Todo>,
}

impl Collections {
    fn allocate_id(&mut self) -> DbId {
        self.next_id += 1;
        self.next_id
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Collections>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn create_user(&self, input: &CreateUser) -> Result<User, DbError> {
        let mut db = self.inner.write().await;
        if db.users.values().any(|u| u.email == input.email) {
            return Err(DbError::Duplicate { field: "email" });
        }
        if db.users.values().any(|u| u.username == input.username) {
            return Err(DbError::Duplicate { field: "username" });
        }

        let now = Utc::now();
        let user = User {
            id: db.allocate_id(),
            username: input.username.clone(),
            email: input.email.clone(),
            password_hash: input.password_hash.clone(),
            created_at: now,
            updated_at: now,
        };
        db.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_user(&self, id: DbId) -> Result<Option<User>, DbError> {
        Ok(self.inner.read().await.users.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, DbError> {
        let db = self.inner.read().await;
        Ok(db.users.values().find(|u| u.email == email).cloned())
    }
}

#[async_trait]
impl ProjectRepository for MemoryStore {
    async fn create_project(&self, input: &NewProject) -> Result<Project, DbError> {
        let mut db = self.inner.write().await;
        let now = Utc::now();
        let project = Project {
            id: db.allocate_id(),
            name: input.name.clone(),
            description: input.description.clone(),
            color: input.color.clone(),
            owner: input.owner,
            members: vec![input.owner],
            is_private: input.is_private,
            created_at: now,
            updated_at: now,
        };
        db.projects.insert(project.id, project.clone());
        Ok(project)
    }

    async fn find_project(&self, id: DbId) -> Result<Option<Project>, DbError> {
        Ok(self.inner.read().await.projects.get(&id).cloned())
    }

    async fn list_projects(&self, scope: Scope, plan: &QueryPlan) -> Result<Page<Project>, DbError> {
        let db = self.inner.read().await;
        let scoped = db.projects.values().filter(|p| scope.admits(*p)).cloned();
        Ok(plan.execute(scoped))
    }

    async fn update_project(
        &self,
        id: DbId,
        changes: &ProjectChanges,
    ) -> Result<Option<Project>, DbError> {
        let mut db = self.inner.write().await;
        Ok(db.projects.get_mut(&id).map(|project| {
            changes.apply(project);
            project.updated_at = Utc::now();
            project.clone()
        }))
    }

    async fn add_member(&self, id: DbId, user_id: DbId) -> Result<Option<Project>, DbError> {
        let mut db = self.inner.write().await;
        Ok(db.projects.get_mut(&id).map(|project| {
            if !project.members.contains(&user_id) {
                project.members.push(user_id);
            }
            project.updated_at = Utc::now();
            project.clone()
        }))
    }

    async fn remove_member(&self, id: DbId, user_id: DbId) -> Result<Option<Project>, DbError> {
        let mut db = self.inner.write().await;
        Ok(db.projects.get_mut(&id).map(|project| {
            project.members.retain(|m| *m != user_id);
            project.updated_at = Utc::now();
            project.clone()
        }))
    }

    async fn delete_project(&self, id: DbId) -> Result<bool, DbError> {
        Ok(self.inner.write().await.projects.remove(&id).is_some())
    }
}

#[async_trait]
impl TodoRepository for MemoryStore {
    async fn create_todo(&self, input: &NewTodo) -> Result<Todo, DbError> {
        let mut db = self.inner.write().await;
        let now = Utc::now();
        let todo = Todo {
            id: db.allocate_id(),
            title: input.title.clone(),
            description: input.description.clone(),
            status: input.status,
            priority: input.priority,
            due_date: input.due_date,
            completed_at: input.completed_at,
            estimated_time: input.estimated_time,
            actual_time: input.actual_time,
            tags: input.tags.clone(),
            project: input.project,
            created_by: input.created_by,
            assigned_to: input.assigned_to,
            subtasks: input.subtasks.clone(),
            attachments: Vec::new(),
            comments: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        db.todos.insert(todo.id, todo.clone());
        Ok(todo)
    }

    async fn find_todo(&self, id: DbId) -> Result<Option<Todo>, DbError> {
        Ok(self.inner.read().await.todos.get(&id).cloned())
    }

    async fn list_todos(&self, scope: Scope, plan: &QueryPlan) -> Result<Page<Todo>, DbError> {
        let db = self.inner.read().await;
        let scoped = db.todos.values().filter(|t| scope.admits(*t)).cloned();
        Ok(plan.execute(scoped))
    }

    async fn save_todo(&self, todo: &Todo) -> Result<Option<Todo>, DbError> {
        let mut db = self.inner.write().await;
        Ok(db.todos.get_mut(&todo.id).map(|stored| {
            *stored = Todo {
                id: stored.id,
                created_by: stored.created_by,
                created_at: stored.created_at,
                updated_at: Utc::now(),
                ..todo.clone()
            };
            stored.clone()
        }))
    }

    async fn push_attachment(
        &self,
        id: DbId,
        attachment: &Attachment,
    ) -> Result<Option<Todo>, DbError> {
        let mut db = self.inner.write().await;
        Ok(db.todos.get_mut(&id).map(|todo| {
            todo.attachments.push(attachment.clone());
            todo.updated_at = Utc::now();
            todo.clone()
        }))
    }

    async fn push_comment(&self, id: DbId, comment: &Comment) -> Result<Option<Todo>, DbError> {
        let mut db = self.inner.write().await;
        Ok(db.todos.get_mut(&id).map(|todo| {
            todo.comments.push(comment.clone());
            todo.updated_at = Utc::now();
            todo.clone()
        }))
    }

    async fn delete_todo(&self, id: DbId) -> Result<bool, DbError> {
        Ok(self.inner.write().await.todos.remove(&id).is_some())
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> Result<(), DbError> {
        Ok(())
    }
}
