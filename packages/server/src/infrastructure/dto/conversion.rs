//! Conversion logic between DTOs and domain types.

use tayori_shared::time::timestamp_to_rfc3339;

use crate::domain::{
    ClientCommand, Message, MessageBody, MessageId, ReplySnapshot, RoomId, ServerEvent, UserId,
    ValueObjectError,
};
use crate::infrastructure::dto::websocket as dto;

// ========================================
// DTO → Domain
// ========================================

impl TryFrom<dto::ClientEventDto> for ClientCommand {
    type Error = ValueObjectError;

    fn try_from(event: dto::ClientEventDto) -> Result<Self, Self::Error> {
        Ok(match event {
            dto::ClientEventDto::Join { user, room } => ClientCommand::Join {
                user: UserId::new(user)?,
                room: RoomId::new(room)?,
            },
            dto::ClientEventDto::Msg { text, reply_to } => ClientCommand::Send {
                body: MessageBody::new(text)?,
                reply_to: reply_to.map(MessageId::new).transpose()?,
            },
            dto::ClientEventDto::MsgRead { id } => ClientCommand::AcknowledgeRead {
                id: MessageId::new(id)?,
            },
            dto::ClientEventDto::TypingStart => ClientCommand::TypingStart,
            dto::ClientEventDto::TypingStop => ClientCommand::TypingStop,
            dto::ClientEventDto::ClearHistory => ClientCommand::ClearHistory,
            dto::ClientEventDto::LastSeenRequest { user } => ClientCommand::LastSeenRequest {
                user: UserId::new(user)?,
            },
        })
    }
}

// ========================================
// Domain → DTO
// ========================================

impl From<&ReplySnapshot> for dto::ReplyDto {
    fn from(reply: &ReplySnapshot) -> Self {
        Self {
            id: reply.id.as_str().to_string(),
            user: reply.author.as_str().to_string(),
            text: reply.body.as_str().to_string(),
            created: reply.created_at.value(),
        }
    }
}

impl From<&Message> for dto::MessageDto {
    fn from(message: &Message) -> Self {
        Self {
            id: message.id.as_str().to_string(),
            user: message.author.as_str().to_string(),
            room: message.room.as_str().to_string(),
            text: message.body.as_str().to_string(),
            reply_to: message.reply_to.as_ref().map(dto::ReplyDto::from),
            created: message.created_at.value(),
            created_at: timestamp_to_rfc3339(message.created_at.value()).unwrap_or_default(),
            read_by: message
                .read_by()
                .iter()
                .map(|u| u.as_str().to_string())
                .collect(),
            status: message.status().as_str().to_string(),
        }
    }
}

impl From<&ServerEvent> for dto::ServerEventDto {
    fn from(event: &ServerEvent) -> Self {
        match event {
            ServerEvent::History(messages) => Self::History {
                messages: messages.iter().map(dto::MessageDto::from).collect(),
            },
            ServerEvent::MessagePosted(message) => Self::Msg {
                message: message.into(),
            },
            ServerEvent::MessageRead { id, reader } => Self::MsgRead {
                id: id.as_str().to_string(),
                user: reader.as_ref().map(|u| u.as_str().to_string()),
            },
            ServerEvent::TypingStarted(user) => Self::TypingStart {
                user: user.as_str().to_string(),
            },
            ServerEvent::TypingStopped(user) => Self::TypingStop {
                user: user.as_str().to_string(),
            },
            ServerEvent::UserOnline(user) => Self::UserOnline {
                user: user.as_str().to_string(),
            },
            ServerEvent::UserOffline { user, last_seen } => Self::UserOffline {
                user: user.as_str().to_string(),
                last_seen: last_seen.map(|t| t.value()),
            },
            ServerEvent::ClearComplete => Self::ClearComplete,
            ServerEvent::LastSeen {
                user,
                last_seen,
                is_online,
            } => Self::LastSeenResponse {
                user: user.as_str().to_string(),
                timestamp: last_seen.map(|t| t.value()),
                is_online: *is_online,
            },
            ServerEvent::JoinDenied { room, reason } => Self::JoinDenied {
                room: room.as_str().to_string(),
                reason: reason.clone(),
            },
            ServerEvent::Error { message } => Self::Error {
                message: message.clone(),
            },
        }
    }
}
