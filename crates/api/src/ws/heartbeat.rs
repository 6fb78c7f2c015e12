use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::ws::manager::RoomRegistry;

const PING_EVERY: Duration = Duration::from_secs(30);

/// Keep idle sockets alive through proxies. The returned handle is aborted at shutdown.
pub fn start_heartbeat(rooms: Arc<RoomRegistry>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(PING_EVERY);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let sockets = rooms.connection_count().await;
            tracing::trace!(sockets, "heartbeat");
            rooms.ping_all().await;
        }
    })
}
