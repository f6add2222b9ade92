//! Presence registry: which users are online in which room.
//!
//! Each room is its own ordering domain. [`PresenceRegistry::enter`] hands out
//! a [`RoomGuard`] that serializes every decision reading or mutating that
//! room's online set (joins, leaves, instant-read on send, catch-up). Guards
//! for different rooms never contend.
//!
//! Nothing here is persisted; after a restart every user is offline until
//! they join again.

use std::{
    collections::{BTreeSet, HashMap, HashSet},
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use super::{ConnectionId, RoomId, UserId};

type RoomSlot = Arc<AsyncMutex<RoomPresence>>;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Online set of one room.
#[derive(Debug)]
pub struct RoomPresence {
    room: RoomId,
    /// Online users and the connections holding them online.
    members: HashMap<UserId, HashSet<ConnectionId>>,
    /// Set once the slot has been dropped from the registry map.
    evicted: bool,
}

impl RoomPresence {
    fn new(room: RoomId) -> Self {
        Self {
            room,
            members: HashMap::new(),
            evicted: false,
        }
    }
}

#[derive(Debug, Default)]
struct Registry {
    rooms: Mutex<HashMap<RoomId, RoomSlot>>,
    /// Number of rooms each online user is present in.
    online_rooms: Mutex<HashMap<UserId, usize>>,
}

/// Outcome of removing a connection from a room.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Departure {
    /// The user was online in the room and no longer is.
    Offline,
    /// The user still holds another connection in the room.
    StillConnected,
    /// The user was not online in the room.
    Absent,
}

/// Process-wide registry of room presence.
#[derive(Debug, Clone, Default)]
pub struct PresenceRegistry {
    inner: Arc<Registry>,
}

impl PresenceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the ordering guard of `room`, creating its entry if needed.
    pub async fn enter(&self, room: &RoomId) -> RoomGuard {
        loop {
            let slot = {
                let mut rooms = lock(&self.inner.rooms);
                rooms
                    .entry(room.clone())
                    .or_insert_with(|| Arc::new(AsyncMutex::new(RoomPresence::new(room.clone()))))
                    .clone()
            };

            let presence = slot.lock_owned().await;
            // The room emptied out while we were waiting; start over on a fresh slot.
            if !presence.evicted {
                return RoomGuard {
                    presence,
                    registry: self.inner.clone(),
                };
            }
        }
    }

    /// Add `user` (via `connection`) to the room. Returns `true` if the user
    /// was not online in the room before.
    pub async fn join(&self, room: &RoomId, user: &UserId, connection: ConnectionId) -> bool {
        self.enter(room).await.join(user, connection)
    }

    pub async fn leave(
        &self,
        room: &RoomId,
        user: &UserId,
        connection: &ConnectionId,
    ) -> Departure {
        self.enter(room).await.leave(user, connection)
    }

    /// `true` iff the user is online in at least one room.
    pub fn is_online(&self, user: &UserId) -> bool {
        lock(&self.inner.online_rooms).contains_key(user)
    }

    pub async fn snapshot(&self, room: &RoomId) -> BTreeSet<UserId> {
        self.enter(room).await.online_users()
    }

    /// Rooms that currently have at least one online user (sorted).
    pub fn room_ids(&self) -> Vec<RoomId> {
        let mut ids: Vec<RoomId> = lock(&self.inner.rooms).keys().cloned().collect();
        ids.sort();
        ids
    }
}

/// Exclusive access to one room's online set.
///
/// Dropping the guard of a room that has nobody online evicts the room.
#[derive(Debug)]
pub struct RoomGuard {
    presence: OwnedMutexGuard<RoomPresence>,
    registry: Arc<Registry>,
}

impl RoomGuard {
    pub fn room(&self) -> &RoomId {
        &self.presence.room
    }

    pub fn join(&mut self, user: &UserId, connection: ConnectionId) -> bool {
        let connections = self.presence.members.entry(user.clone()).or_default();
        let newly_online = connections.is_empty();
        connections.insert(connection);

        if newly_online {
            *lock(&self.registry.online_rooms)
                .entry(user.clone())
                .or_insert(0) += 1;
        }
        newly_online
    }

    pub fn leave(&mut self, user: &UserId, connection: &ConnectionId) -> Departure {
        let Some(connections) = self.presence.members.get_mut(user) else {
            return Departure::Absent;
        };
        connections.remove(connection);
        if !connections.is_empty() {
            return Departure::StillConnected;
        }

        self.presence.members.remove(user);
        let mut online_rooms = lock(&self.registry.online_rooms);
        if let Some(count) = online_rooms.get_mut(user) {
            *count -= 1;
            if *count == 0 {
                online_rooms.remove(user);
            }
        }
        Departure::Offline
    }

    pub fn online_users(&self) -> BTreeSet<UserId> {
        self.presence.members.keys().cloned().collect()
    }

    pub fn online_count(&self) -> usize {
        self.presence.members.len()
    }

    /// Every connection joined to the room.
    pub fn connections(&self) -> Vec<ConnectionId> {
        self.presence.members.values().flatten().copied().collect()
    }

    pub fn connections_except(&self, exclude: &ConnectionId) -> Vec<ConnectionId> {
        self.presence
            .members
            .values()
            .flatten()
            .filter(|c| *c != exclude)
            .copied()
            .collect()
    }
}

impl Drop for RoomGuard {
    fn drop(&mut self) {
        if !self.presence.members.is_empty() || self.presence.evicted {
            return;
        }
        self.presence.evicted = true;

        let slot = OwnedMutexGuard::mutex(&self.presence);
        let mut rooms = lock(&self.registry.rooms);
        if rooms
            .get(&self.presence.room)
            .is_some_and(|current| Arc::ptr_eq(current, slot))
        {
            rooms.remove(&self.presence.room);
        }
    }
}
