use std::sync::Arc;

use taskhub_db::Store;

use crate::config::ServerConfig;
use crate::storage::BlobStore;
use crate::ws::RoomRegistry;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc`).
#[derive(Clone)]
pub struct AppState {
    /// Document store (PostgreSQL or in-memory).
    pub store: Arc<dyn Store>,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Realtime project rooms.
    pub rooms: Arc<RoomRegistry>,
    /// Attachment storage.
    pub blobs: Arc<dyn BlobStore>,
}
