//! Configuration-driven room access policy.
//!
//! Rooms listed as private only admit their members; every other room is public.

use std::{
    collections::{HashMap, HashSet},
    str::FromStr,
};

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{RoomAccessPolicy, RoomId, UserId, ValueObjectError};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PrivateRoomParseError {
    #[error("expected ROOM=user1,user2 but got '{0}'")]
    MissingSeparator(String),

    #[error(transparent)]
    InvalidName(#[from] ValueObjectError),
}

/// One `ROOM=user1,user2` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrivateRoom {
    pub room: RoomId,
    pub members: HashSet<UserId>,
}

impl FromStr for PrivateRoom {
    type Err = PrivateRoomParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (room, members) = s
            .split_once('=')
            .ok_or_else(|| PrivateRoomParseError::MissingSeparator(s.to_string()))?;

        let room = RoomId::new(room.trim().to_string())?;
        let members = members
            .split(',')
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .map(|m| UserId::new(m.to_string()))
            .collect::<Result<HashSet<_>, _>>()?;

        Ok(Self { room, members })
    }
}

#[derive(Debug, Clone, Default)]
pub struct StaticRoomAccessPolicy {
    private_rooms: HashMap<RoomId, HashSet<UserId>>,
}

impl StaticRoomAccessPolicy {
    /// Every room is public.
    pub fn open() -> Self {
        Self::default()
    }

    pub fn with_private_rooms(rooms: impl IntoIterator<Item = PrivateRoom>) -> Self {
        let mut private_rooms: HashMap<RoomId, HashSet<UserId>> = HashMap::new();
        for PrivateRoom { room, members } in rooms {
            private_rooms.entry(room).or_default().extend(members);
        }
        Self { private_rooms }
    }
}

#[async_trait]
impl RoomAccessPolicy for StaticRoomAccessPolicy {
    async fn can_join(&self, room: &RoomId, user: &UserId) -> bool {
        self.private_rooms
            .get(room)
            .is_none_or(|members| members.contains(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(name: &str) -> UserId {
        UserId::new(name.to_string()).unwrap()
    }

    fn room(name: &str) -> RoomId {
        RoomId::new(name.to_string()).unwrap()
    }

    #[test]
    fn test_parse_private_room() {
        // テスト項目: "ROOM=user1,user2" 形式を解析できる
        // given (前提条件):
        let input = "staff = alice, bob ,";

        // when (操作):
        let parsed: PrivateRoom = input.parse().unwrap();

        // then (期待する結果):
        assert_eq!(parsed.room, room("staff"));
        assert_eq!(parsed.members, HashSet::from([user("alice"), user("bob")]));
    }

    #[test]
    fn test_parse_private_room_without_separator() {
        // テスト項目: "=" を含まない入力はエラー
        // given (前提条件):
        let input = "staff";

        // when (操作):
        let result = input.parse::<PrivateRoom>();

        // then (期待する結果):
        assert_eq!(
            result,
            Err(PrivateRoomParseError::MissingSeparator("staff".to_string()))
        );
    }

    #[tokio::test]
    async fn test_private_room_admits_members_only() {
        // テスト項目: private Room はメンバーのみ参加でき、それ以外の Room は誰でも参加できる
        // given (前提条件):
        let policy = StaticRoomAccessPolicy::with_private_rooms(["staff=alice".parse().unwrap()]);

        // when (操作):
        let alice_staff = policy.can_join(&room("staff"), &user("alice")).await;
        let bob_staff = policy.can_join(&room("staff"), &user("bob")).await;
        let bob_lobby = policy.can_join(&room("lobby"), &user("bob")).await;

        // then (期待する結果):
        assert!(alice_staff);
        assert!(!bob_staff);
        assert!(bob_lobby);
    }
}
