//! UseCase: last-seen の問い合わせ

use std::sync::Arc;

use crate::domain::{PresenceRegistry, Timestamp, UserId, UserRepository};

use super::error::LastSeenError;

/// Last-seen time of a user combined with their current presence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LastSeen {
    pub user: UserId,
    pub last_seen: Option<Timestamp>,
    pub is_online: bool,
}

/// last-seen 問い合わせのユースケース
pub struct GetLastSeenUseCase {
    registry: PresenceRegistry,
    users: Arc<dyn UserRepository>,
}

impl GetLastSeenUseCase {
    pub fn new(registry: PresenceRegistry, users: Arc<dyn UserRepository>) -> Self {
        Self { registry, users }
    }

    /// Unknown users are reported as never seen and offline.
    pub async fn execute(&self, user: &UserId) -> Result<LastSeen, LastSeenError> {
        let last_seen = self
            .users
            .find(user)
            .await?
            .and_then(|record| record.last_seen);
        Ok(LastSeen {
            user: user.clone(),
            last_seen,
            is_online: self.registry.is_online(user),
        })
    }
}
