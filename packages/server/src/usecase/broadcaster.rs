//! EventBroadcaster: fan-out of server events to the connections of a room.
//!
//! Recipients are read from a [`RoomGuard`], so the audience of an event is
//! always the online set the triggering decision was made against.

use std::sync::Arc;

use crate::domain::{ConnectionId, MessagePusher, RoomGuard, ServerEvent};

#[derive(Clone)]
pub struct EventBroadcaster {
    pusher: Arc<dyn MessagePusher>,
}

impl EventBroadcaster {
    pub fn new(pusher: Arc<dyn MessagePusher>) -> Self {
        Self { pusher }
    }

    /// Every connection joined to the room, the triggering one included.
    pub async fn to_room(&self, room: &RoomGuard, event: &ServerEvent) {
        self.send(&room.connections(), event).await;
    }

    /// Every connection joined to the room except `sender`.
    pub async fn to_room_except(
        &self,
        room: &RoomGuard,
        sender: &ConnectionId,
        event: &ServerEvent,
    ) {
        self.send(&room.connections_except(sender), event).await;
    }

    pub async fn to_connection(&self, connection: &ConnectionId, event: &ServerEvent) {
        if let Err(e) = self.pusher.push_to(connection, event).await {
            tracing::debug!("Dropped event for connection '{}': {}", connection, e);
        }
    }

    async fn send(&self, targets: &[ConnectionId], event: &ServerEvent) {
        if targets.is_empty() {
            return;
        }
        if let Err(e) = self.pusher.broadcast(targets, event).await {
            tracing::warn!("Broadcast to {} connection(s) failed: {}", targets.len(), e);
        }
    }
}
