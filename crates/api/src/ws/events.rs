//! Realtime event vocabulary and frame encoding.

use axum::extract::ws::Message;
use serde::{Deserialize, Serialize};
use taskhub_core::types::DbId;

/// Events pushed to project rooms after a successful mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RealtimeEvent {
    ProjectUpdated,
    TodoCreated,
    TodoUpdated,
    TodoDeleted,
}

impl RealtimeEvent {
    pub fn as_str(self) -> &'static str {
        match self {
            RealtimeEvent::ProjectUpdated => "project:updated",
            RealtimeEvent::TodoCreated => "todo:created",
            RealtimeEvent::TodoUpdated => "todo:updated",
            RealtimeEvent::TodoDeleted => "todo:deleted",
        }
    }
}

/// Payload of `todo:deleted`; the document itself no longer exists.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct DeletedTodo {
    pub id: DbId,
    pub project: DbId,
}

/// Frames a client may send.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum ClientMessage {
    #[serde(rename = "joinProjects")]
    JoinProjects(Vec<DbId>),
}

#[derive(Serialize)]
struct Frame<'a, T: Serialize> {
    event: &'a str,
    data: &'a T,
}

/// Server reply to `joinProjects`.
pub const JOINED_EVENT: &str = "joined";

/// Encode `{"event": ..., "data": ...}` as a text frame.
pub fn encode_frame(event: &str, data: &impl Serialize) -> Option<Message> {
    match serde_json::to_string(&Frame { event, data }) {
        Ok(json) => Some(Message::Text(json.into())),
        Err(e) => {
            tracing::error!(event, error = %e, "Failed to encode realtime frame");
            None
        }
    }
}
