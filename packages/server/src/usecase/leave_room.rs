//! UseCase: Room からの退出処理
//!
//! Runs when a session rebinds to another room or its connection closes.

use std::sync::Arc;

use tayori_shared::time::Clock;

use crate::domain::{
    ConnectionId, Departure, PresenceRegistry, RoomId, ServerEvent, Timestamp, UserId,
    UserRepository,
};

use super::{broadcaster::EventBroadcaster, error::LeaveRoomError};

/// Room 退出のユースケース
pub struct LeaveRoomUseCase {
    registry: PresenceRegistry,
    users: Arc<dyn UserRepository>,
    broadcaster: EventBroadcaster,
    clock: Arc<dyn Clock>,
}

impl LeaveRoomUseCase {
    pub fn new(
        registry: PresenceRegistry,
        users: Arc<dyn UserRepository>,
        broadcaster: EventBroadcaster,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            registry,
            users,
            broadcaster,
            clock,
        }
    }

    /// Room 退出を実行
    ///
    /// The connection is removed from the room first and unconditionally.
    /// `user:offline` goes to the remaining members unless the user still
    /// holds another connection in the room; it carries the last-seen time
    /// only when storing it succeeded.
    pub async fn execute(
        &self,
        connection: &ConnectionId,
        user: &UserId,
        room: &RoomId,
    ) -> Result<Departure, LeaveRoomError> {
        let mut guard = self.registry.enter(room).await;
        let departure = guard.leave(user, connection);

        if departure == Departure::StillConnected {
            tracing::debug!(
                "'{}' closed one connection but is still online in room '{}'",
                user,
                room
            );
            return Ok(departure);
        }

        let now = Timestamp::new(self.clock.now_millis());
        let stored = self.users.upsert_last_seen(user, now).await;
        if let Err(e) = &stored {
            tracing::warn!("Failed to store last-seen of '{}': {}", user, e);
        }

        self.broadcaster
            .to_room(
                &guard,
                &ServerEvent::UserOffline {
                    user: user.clone(),
                    last_seen: stored.is_ok().then_some(now),
                },
            )
            .await;

        tracing::info!(
            "'{}' left room '{}' ({} online)",
            user,
            room,
            guard.online_count()
        );

        stored?;
        Ok(departure)
    }
}
