//! Validated client commands and server events.
//!
//! The transport layer converts wire DTOs into these types; anything that
//! fails validation never reaches a use case.

use super::{
    entity::Message,
    value_object::{MessageBody, MessageId, RoomId, Timestamp, UserId},
};

/// Command received from a client connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientCommand {
    Join { user: UserId, room: RoomId },
    Send {
        body: MessageBody,
        reply_to: Option<MessageId>,
    },
    AcknowledgeRead { id: MessageId },
    TypingStart,
    TypingStop,
    ClearHistory,
    LastSeenRequest { user: UserId },
}

/// Event pushed to one or more client connections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerEvent {
    History(Vec<Message>),
    MessagePosted(Message),
    /// `reader` is `None` when the message was read by the online set at send time.
    MessageRead {
        id: MessageId,
        reader: Option<UserId>,
    },
    TypingStarted(UserId),
    TypingStopped(UserId),
    UserOnline(UserId),
    UserOffline {
        user: UserId,
        last_seen: Option<Timestamp>,
    },
    ClearComplete,
    LastSeen {
        user: UserId,
        last_seen: Option<Timestamp>,
        is_online: bool,
    },
    JoinDenied {
        room: RoomId,
        reason: String,
    },
    Error {
        message: String,
    },
}
