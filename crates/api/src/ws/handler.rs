use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::Response;
use futures::{SinkExt, StreamExt};
use taskhub_core::guard::can_read_project;
use taskhub_core::types::DbId;
use taskhub_db::ProjectRepository;

use crate::error::{AppError, AppResult};
use crate::extract::QueryPairs;
use crate::middleware::auth::{authenticate, request_token};
use crate::state::AppState;
use crate::ws::events::{encode_frame, ClientMessage, JOINED_EVENT};

/// Upgrade an authenticated request to a WebSocket.
///
/// The token is read from the `token` query parameter (browsers cannot set
/// headers on a WebSocket handshake), then the usual header and cookie.
/// Unauthenticated handshakes are refused with 401 before upgrading.
pub async fn ws_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    QueryPairs(params): QueryPairs,
    ws: WebSocketUpgrade,
) -> AppResult<Response> {
    let token = params
        .into_iter()
        .find(|(key, value)| key == "token" && !value.is_empty())
        .map(|(_, value)| value)
        .or_else(|| request_token(&headers))
        .ok_or_else(AppError::not_authorized)?;
    let user = authenticate(&state, &token).await?;

    Ok(ws.on_upgrade(move |socket| handle_socket(socket, state, user.id)))
}

/// Drive one connection: a sender task drains the registry channel while
/// this task reads client frames.
async fn handle_socket(socket: WebSocket, state: AppState, user_id: DbId) {
    let conn_id = uuid::Uuid::new_v4().to_string();
    tracing::info!(conn_id = %conn_id, user_id, "WebSocket connected");

    let mut rx = state.rooms.add(conn_id.clone(), user_id).await;
    let (mut sink, mut stream) = socket.split();

    let sender_conn_id = conn_id.clone();
    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sink.send(msg).await.is_err() {
                tracing::debug!(conn_id = %sender_conn_id, "WebSocket sink closed");
                break;
            }
        }
    });

    while let Some(result) = stream.next().await {
        match result {
            Ok(Message::Close(_)) => break,
            Ok(Message::Pong(_)) => {
                tracing::trace!(conn_id = %conn_id, "Pong received");
            }
            Ok(Message::Text(text)) => match serde_json::from_str::<ClientMessage>(text.as_str()) {
                Ok(ClientMessage::JoinProjects(ids)) => {
                    join_projects(&state, &conn_id, user_id, &ids).await;
                }
                Err(e) => {
                    tracing::debug!(conn_id = %conn_id, error = %e, "Ignoring malformed frame");
                }
            },
            Ok(_) => {}
            Err(e) => {
                tracing::debug!(conn_id = %conn_id, error = %e, "WebSocket receive error");
                break;
            }
        }
    }

    state.rooms.remove(&conn_id).await;
    send_task.abort();
    tracing::info!(conn_id = %conn_id, "WebSocket disconnected");
}

/// Subscribe the connection to every requested project the user can read.
/// Unknown or foreign projects are skipped silently.
async fn join_projects(state: &AppState, conn_id: &str, user_id: DbId, ids: &[DbId]) {
    let mut readable = Vec::with_capacity(ids.len());
    for &id in ids {
        match state.store.find_project(id).await {
            Ok(Some(project)) if can_read_project(user_id, &project) => readable.push(id),
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(conn_id, project_id = id, error = %e, "Project lookup failed during join");
            }
        }
    }

    let joined = state.rooms.join(conn_id, &readable).await;
    tracing::debug!(conn_id, rooms = ?joined, "Joined project rooms");

    if let Some(frame) = encode_frame(JOINED_EVENT, &joined) {
        state.rooms.send_to(conn_id, frame).await;
    }
}
