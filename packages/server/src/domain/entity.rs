//! Entities.

use std::collections::{BTreeSet, HashMap};

use super::value_object::{MessageBody, MessageId, RoomId, Timestamp, UserId};

/// Display status of a message.
///
/// Always derived from the reader set, see [`Message::status`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageStatus {
    Delivered,
    Read,
}

impl MessageStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Delivered => "delivered",
            Self::Read => "read",
        }
    }
}

/// Copy of the quoted message taken when the reply was sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplySnapshot {
    pub id: MessageId,
    pub author: UserId,
    pub body: MessageBody,
    pub created_at: Timestamp,
}

impl From<&Message> for ReplySnapshot {
    fn from(message: &Message) -> Self {
        Self {
            id: message.id.clone(),
            author: message.author.clone(),
            body: message.body.clone(),
            created_at: message.created_at,
        }
    }
}

/// Chat message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub id: MessageId,
    pub author: UserId,
    pub room: RoomId,
    pub body: MessageBody,
    pub reply_to: Option<ReplySnapshot>,
    pub created_at: Timestamp,
    read_by: BTreeSet<UserId>,
}

impl Message {
    /// A freshly sent message: new id, nobody has read it yet.
    pub fn new(
        author: UserId,
        room: RoomId,
        body: MessageBody,
        reply_to: Option<ReplySnapshot>,
        created_at: Timestamp,
    ) -> Self {
        Self {
            id: MessageId::generate(),
            author,
            room,
            body,
            reply_to,
            created_at,
            read_by: BTreeSet::new(),
        }
    }

    /// Rebuild a message loaded from storage.
    ///
    /// The author is dropped from `read_by` if a stored record ever carried it.
    pub fn restore(
        id: MessageId,
        author: UserId,
        room: RoomId,
        body: MessageBody,
        reply_to: Option<ReplySnapshot>,
        created_at: Timestamp,
        read_by: impl IntoIterator<Item = UserId>,
    ) -> Self {
        let read_by = read_by.into_iter().filter(|u| u != &author).collect();
        Self {
            id,
            author,
            room,
            body,
            reply_to,
            created_at,
            read_by,
        }
    }

    pub fn read_by(&self) -> &BTreeSet<UserId> {
        &self.read_by
    }

    pub fn is_read_by(&self, user: &UserId) -> bool {
        self.read_by.contains(user)
    }

    pub fn status(&self) -> MessageStatus {
        if self.read_by.is_empty() {
            MessageStatus::Delivered
        } else {
            MessageStatus::Read
        }
    }

    /// Add `reader` to the reader set.
    ///
    /// Returns `false` when nothing changed: the reader is the author or has
    /// already read the message.
    pub fn mark_read_by(&mut self, reader: &UserId) -> bool {
        if reader == &self.author {
            return false;
        }
        self.read_by.insert(reader.clone())
    }
}

/// Persisted presence record of a user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserPresenceRecord {
    pub user: UserId,
    pub last_seen: Option<Timestamp>,
    /// Per-room cutoff: messages created at or before it are hidden from this user.
    pub cleared_at: HashMap<RoomId, Timestamp>,
}

impl UserPresenceRecord {
    pub fn new(user: UserId) -> Self {
        Self {
            user,
            last_seen: None,
            cleared_at: HashMap::new(),
        }
    }

    pub fn cleared_cutoff(&self, room: &RoomId) -> Option<Timestamp> {
        self.cleared_at.get(room).copied()
    }
}
