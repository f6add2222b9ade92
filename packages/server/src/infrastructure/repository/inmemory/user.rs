//! InMemory User Repository 実装
//!
//! ドメインモデル（`UserPresenceRecord`）をそのまま保持します。

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{RepositoryError, RoomId, Timestamp, UserId, UserPresenceRecord, UserRepository};

#[derive(Debug, Default)]
pub struct InMemoryUserRepository {
    records: Mutex<HashMap<UserId, UserPresenceRecord>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find(&self, user: &UserId) -> Result<Option<UserPresenceRecord>, RepositoryError> {
        let records = self.records.lock().await;
        Ok(records.get(user).cloned())
    }

    async fn upsert_last_seen(&self, user: &UserId, at: Timestamp) -> Result<(), RepositoryError> {
        let mut records = self.records.lock().await;
        records
            .entry(user.clone())
            .or_insert_with(|| UserPresenceRecord::new(user.clone()))
            .last_seen = Some(at);
        Ok(())
    }

    async fn set_cleared_cutoff(
        &self,
        user: &UserId,
        room: &RoomId,
        at: Timestamp,
    ) -> Result<(), RepositoryError> {
        let mut records = self.records.lock().await;
        records
            .entry(user.clone())
            .or_insert_with(|| UserPresenceRecord::new(user.clone()))
            .cleared_at
            .insert(room.clone(), at);
        Ok(())
    }
}
