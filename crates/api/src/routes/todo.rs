//! Route definitions for the `/todos` resource.

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, patch, post};
use axum::Router;

use crate::handlers::todo;
use crate::state::AppState;

/// Room for multipart boundaries and part headers on top of the file itself.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Routes mounted at `/todos`.
///
/// ```text
/// GET    /                    -> list
/// POST   /                    -> create
/// GET    /{id}                -> get_by_id
/// PUT    /{id}                -> update
/// DELETE /{id}                -> delete
/// PATCH  /{id}/status         -> update_status
/// PATCH  /{id}/priority       -> update_priority
/// POST   /{id}/attachments    -> add_attachment (file capped at `max_upload_bytes`)
/// POST   /{id}/comments       -> add_comment
/// ```
pub fn router(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route("/", get(todo::list).post(todo::create))
        .route(
            "/{id}",
            get(todo::get_by_id).put(todo::update).delete(todo::delete),
        )
        .route("/{id}/status", patch(todo::update_status))
        .route("/{id}/priority", patch(todo::update_priority))
        .route(
            "/{id}/attachments",
            post(todo::add_attachment).layer(DefaultBodyLimit::max(
                max_upload_bytes.saturating_add(MULTIPART_OVERHEAD),
            )),
        )
        .route("/{id}/comments", post(todo::add_comment))
}
