pub mod auth;
pub mod health;
pub mod project;
pub mod todo;

use axum::Router;

use crate::state::AppState;

/// Build the `/api` route tree.
///
/// ```text
/// /auth/register                        register (public)
/// /auth/login                           login (public)
/// /auth/me                              current user
///
/// /todos                                list, create
/// /todos/{id}                           get, update, delete
/// /todos/{id}/status                    update status (PATCH)
/// /todos/{id}/priority                  update priority (PATCH)
/// /todos/{id}/attachments               upload attachment (POST, multipart)
/// /todos/{id}/comments                  add comment (POST)
///
/// /projects                             list, create
/// /projects/{id}                        get, update, delete
/// /projects/{id}/members                add member (POST)
/// /projects/{id}/members/{user_id}      remove member (DELETE)
/// ```
pub fn api_routes(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/todos", todo::router(max_upload_bytes))
        .nest("/projects", project::router())
}
