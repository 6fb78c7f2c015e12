//! Room registry for realtime fan-out.
//!
//! Connections are keyed by a generated id. Each project id maps to the set
//! of connections that joined its room, and each connection remembers its
//! rooms so a disconnect can leave all of them in one step. Both maps live
//! behind a single lock so they never disagree.

use std::collections::{HashMap, HashSet};

use axum::body::Bytes;
use axum::extract::ws::Message;
use serde::Serialize;
use taskhub_core::types::{DbId, Timestamp};
use tokio::sync::{mpsc, RwLock};

use crate::ws::events::{encode_frame, RealtimeEvent};

/// Channel sender half for pushing messages to a WebSocket connection.
pub type WsSender = mpsc::UnboundedSender<Message>;

/// Metadata for a single WebSocket connection.
pub struct WsConnection {
    /// Authenticated user behind the socket.
    pub user_id: DbId,
    /// Channel sender for outbound messages to this connection.
    pub sender: WsSender,
    /// When this connection was established.
    pub connected_at: Timestamp,
    /// Project rooms this connection has joined.
    pub rooms: HashSet<DbId>,
}

#[derive(Default)]
struct Registry {
    connections: HashMap<String, WsConnection>,
    rooms: HashMap<DbId, HashSet<String>>,
}

/// Tracks live connections and their project rooms.
///
/// Thread-safe via interior `RwLock`; designed to be wrapped in `Arc` and
/// shared across the application.
#[derive(Default)]
pub struct RoomRegistry {
    inner: RwLock<Registry>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new connection.
    ///
    /// Returns the receiver half of the message channel so the caller can
    /// forward messages to the WebSocket sink.
    pub async fn add(&self, conn_id: String, user_id: DbId) -> mpsc::UnboundedReceiver<Message> {
        let (tx, rx) = mpsc::unbounded_channel();
        let conn = WsConnection {
            user_id,
            sender: tx,
            connected_at: chrono::Utc::now(),
            rooms: HashSet::new(),
        };
        self.inner.write().await.connections.insert(conn_id, conn);
        rx
    }

    /// Remove a connection and leave every room it joined. Rooms left empty
    /// are dropped.
    pub async fn remove(&self, conn_id: &str) {
        let mut registry = self.inner.write().await;
        let Some(conn) = registry.connections.remove(conn_id) else {
            return;
        };
        for project_id in conn.rooms {
            if let Some(members) = registry.rooms.get_mut(&project_id) {
                members.remove(conn_id);
                if members.is_empty() {
                    registry.rooms.remove(&project_id);
                }
            }
        }
    }

    /// Add a connection to each listed room. Joining a room twice is a no-op.
    ///
    /// Returns the rooms the connection is now in out of `project_ids`, or
    /// nothing if the connection is unknown.
    pub async fn join(&self, conn_id: &str, project_ids: &[DbId]) -> Vec<DbId> {
        let mut registry = self.inner.write().await;
        let Registry { connections, rooms } = &mut *registry;
        let Some(conn) = connections.get_mut(conn_id) else {
            return Vec::new();
        };

        let mut joined = Vec::with_capacity(project_ids.len());
        for &project_id in project_ids {
            conn.rooms.insert(project_id);
            rooms
                .entry(project_id)
                .or_default()
                .insert(conn_id.to_string());
            if !joined.contains(&project_id) {
                joined.push(project_id);
            }
        }
        joined
    }

    /// Send a message to every connection in a room.
    ///
    /// Returns the number of connections the message was handed to. A room
    /// nobody joined yields zero; closed channels are skipped.
    pub async fn broadcast(&self, project_id: DbId, message: Message) -> usize {
        let registry = self.inner.read().await;
        let Some(members) = registry.rooms.get(&project_id) else {
            return 0;
        };
        members
            .iter()
            .filter_map(|id| registry.connections.get(id))
            .filter(|conn| conn.sender.send(message.clone()).is_ok())
            .count()
    }

    /// Serialize `{event, data}` and broadcast it to the project's room.
    ///
    /// Delivery is best-effort; failures are logged and never surface to the
    /// caller.
    pub async fn emit(&self, project_id: DbId, event: RealtimeEvent, payload: &impl Serialize) {
        let Some(message) = encode_frame(event.as_str(), payload) else {
            return;
        };
        let delivered = self.broadcast(project_id, message).await;
        tracing::debug!(project_id, event = event.as_str(), delivered, "Realtime event emitted");
    }

    /// Send a message to one connection. Returns `false` if it is gone.
    pub async fn send_to(&self, conn_id: &str, message: Message) -> bool {
        self.inner
            .read()
            .await
            .connections
            .get(conn_id)
            .is_some_and(|conn| conn.sender.send(message).is_ok())
    }

    /// Number of connections currently in a room.
    pub async fn room_size(&self, project_id: DbId) -> usize {
        self.inner
            .read()
            .await
            .rooms
            .get(&project_id)
            .map_or(0, HashSet::len)
    }

    /// Rooms a connection has joined, sorted.
    pub async fn rooms_of(&self, conn_id: &str) -> Vec<DbId> {
        let registry = self.inner.read().await;
        let mut rooms: Vec<DbId> = registry
            .connections
            .get(conn_id)
            .map(|conn| conn.rooms.iter().copied().collect())
            .unwrap_or_default();
        rooms.sort_unstable();
        rooms
    }

    /// Return the current number of active connections.
    pub async fn connection_count(&self) -> usize {
        self.inner.read().await.connections.len()
    }

    /// Send a Close frame to every connection, then clear all state.
    ///
    /// Used during graceful shutdown.
    pub async fn shutdown_all(&self) {
        let mut registry = self.inner.write().await;
        let count = registry.connections.len();
        for conn in registry.connections.values() {
            let _ = conn.sender.send(Message::Close(None));
        }
        registry.connections.clear();
        registry.rooms.clear();
        tracing::info!(count, "Closed all WebSocket connections");
    }

    /// Send a Ping frame to every connected client.
    pub async fn ping_all(&self) {
        let registry = self.inner.read().await;
        for conn in registry.connections.values() {
            let _ = conn.sender.send(Message::Ping(Bytes::new()));
        }
    }
}
