//! Realtime project rooms over WebSocket.
//!
//! Clients authenticate at upgrade time, then send `joinProjects` to
//! subscribe to the rooms of projects they can read. Services push
//! mutation events through [`RoomRegistry::emit`].

pub mod events;
mod handler;
mod heartbeat;
pub mod manager;

pub use handler::ws_handler;
pub use heartbeat::start_heartbeat;
pub use manager::RoomRegistry;
