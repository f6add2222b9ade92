//! UseCase: Room と presence の一覧取得

use std::collections::BTreeSet;

use crate::domain::{PresenceRegistry, RoomId, UserId};

/// Online users of one room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomPresenceSummary {
    pub room: RoomId,
    pub online: BTreeSet<UserId>,
}

/// Room 一覧取得のユースケース
pub struct GetRoomsUseCase {
    registry: PresenceRegistry,
}

impl GetRoomsUseCase {
    pub fn new(registry: PresenceRegistry) -> Self {
        Self { registry }
    }

    /// Rooms with at least one online user, sorted by name.
    pub async fn execute(&self) -> Vec<RoomPresenceSummary> {
        let mut summaries = Vec::new();
        for room in self.registry.room_ids() {
            let online = self.registry.snapshot(&room).await;
            // emptied between listing and snapshot
            if online.is_empty() {
                continue;
            }
            summaries.push(RoomPresenceSummary { room, online });
        }
        summaries
    }

    /// Presence of a single room; empty when nobody is online.
    pub async fn room(&self, room: &RoomId) -> RoomPresenceSummary {
        RoomPresenceSummary {
            room: room.clone(),
            online: self.registry.snapshot(room).await,
        }
    }
}
