//! Room access policy (membership / privacy lists live outside this service).

use async_trait::async_trait;

use super::{RoomId, UserId};

#[async_trait]
pub trait RoomAccessPolicy: Send + Sync {
    /// Whether `user` may join `room`.
    async fn can_join(&self, room: &RoomId, user: &UserId) -> bool;
}
