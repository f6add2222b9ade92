//! UseCase: 入力中通知の中継
//!
//! Typing state is not stored; start and stop are relayed to the rest of the room.

use crate::domain::{ConnectionId, PresenceRegistry, RoomId, ServerEvent, UserId};

use super::broadcaster::EventBroadcaster;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Typing {
    Started,
    Stopped,
}

/// 入力中通知のユースケース
pub struct NotifyTypingUseCase {
    registry: PresenceRegistry,
    broadcaster: EventBroadcaster,
}

impl NotifyTypingUseCase {
    pub fn new(registry: PresenceRegistry, broadcaster: EventBroadcaster) -> Self {
        Self {
            registry,
            broadcaster,
        }
    }

    pub async fn execute(
        &self,
        connection: &ConnectionId,
        user: &UserId,
        room: &RoomId,
        typing: Typing,
    ) {
        let event = match typing {
            Typing::Started => ServerEvent::TypingStarted(user.clone()),
            Typing::Stopped => ServerEvent::TypingStopped(user.clone()),
        };
        let guard = self.registry.enter(room).await;
        self.broadcaster
            .to_room_except(&guard, connection, &event)
            .await;
    }
}
