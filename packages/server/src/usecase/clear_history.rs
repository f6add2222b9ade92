//! UseCase: 履歴クリア
//!
//! Clearing is per user and per room: only the cutoff is stored, messages stay.
//! Later joins of that user to that room receive messages created after it.

use std::sync::Arc;

use tayori_shared::time::Clock;

use crate::domain::{ConnectionId, RoomId, ServerEvent, Timestamp, UserId, UserRepository};

use super::{broadcaster::EventBroadcaster, error::ClearHistoryError};

/// 履歴クリアのユースケース
pub struct ClearHistoryUseCase {
    users: Arc<dyn UserRepository>,
    broadcaster: EventBroadcaster,
    clock: Arc<dyn Clock>,
}

impl ClearHistoryUseCase {
    pub fn new(
        users: Arc<dyn UserRepository>,
        broadcaster: EventBroadcaster,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            users,
            broadcaster,
            clock,
        }
    }

    /// Store the cutoff, then confirm with `clear:complete` to the requester.
    pub async fn execute(
        &self,
        connection: &ConnectionId,
        user: &UserId,
        room: &RoomId,
    ) -> Result<Timestamp, ClearHistoryError> {
        let cutoff = Timestamp::new(self.clock.now_millis());
        self.users.set_cleared_cutoff(user, room, cutoff).await?;

        self.broadcaster
            .to_connection(connection, &ServerEvent::ClearComplete)
            .await;
        tracing::info!("'{}' cleared history of room '{}'", user, room);
        Ok(cutoff)
    }
}
