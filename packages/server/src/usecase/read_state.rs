//! ReadStateReconciler: applies read transitions and announces them.
//!
//! Three triggers move a message from delivered to read:
//!
//! - catch-up: a user joins a room and everything they have not read is read
//! - instant-read: a message is sent while other members are online
//! - acknowledgement: a client explicitly reports a message as read
//!
//! Every method takes the room's [`RoomGuard`], so decisions are serialized
//! per room. A transition is broadcast only after the store accepted it.

use std::sync::Arc;

use crate::domain::{
    Message, MessageId, MessageRepository, RepositoryError, RoomGuard, ServerEvent, UserId,
    read_state::{instant_readers, plan_catch_up},
};

use super::broadcaster::EventBroadcaster;

pub struct ReadStateReconciler {
    messages: Arc<dyn MessageRepository>,
    broadcaster: EventBroadcaster,
}

impl ReadStateReconciler {
    pub fn new(messages: Arc<dyn MessageRepository>, broadcaster: EventBroadcaster) -> Self {
        Self {
            messages,
            broadcaster,
        }
    }

    /// Mark every message of the room that `reader` has not read as read by them.
    ///
    /// Returns the ids that changed, oldest first. Stops at the first store
    /// failure; transitions already stored before it stay stored and announced.
    pub async fn catch_up(
        &self,
        room: &RoomGuard,
        reader: &UserId,
    ) -> Result<Vec<MessageId>, RepositoryError> {
        let candidates = self.messages.find_unread_for(room.room(), reader).await?;

        let mut marked = Vec::new();
        for mut message in plan_catch_up(candidates, reader) {
            if !message.mark_read_by(reader) {
                continue;
            }
            self.messages
                .update_read_set(&message.id, message.read_by())
                .await?;
            self.broadcaster
                .to_room(
                    room,
                    &ServerEvent::MessageRead {
                        id: message.id.clone(),
                        reader: Some(reader.clone()),
                    },
                )
                .await;
            marked.push(message.id);
        }

        if !marked.is_empty() {
            tracing::debug!(
                "Caught up {} message(s) for '{}' in room '{}'",
                marked.len(),
                reader,
                room.room()
            );
        }
        Ok(marked)
    }

    /// Treat a just-sent message as read by everyone else online in the room.
    ///
    /// `message` is only updated once the store accepted the new reader set.
    /// Returns `false` when the author is alone.
    pub async fn instant_read(
        &self,
        room: &RoomGuard,
        message: &mut Message,
    ) -> Result<bool, RepositoryError> {
        let readers = instant_readers(&room.online_users(), &message.author);
        if readers.is_empty() {
            return Ok(false);
        }

        let mut updated = message.clone();
        for reader in &readers {
            updated.mark_read_by(reader);
        }
        self.messages
            .update_read_set(&updated.id, updated.read_by())
            .await?;
        *message = updated;

        self.broadcaster
            .to_room(
                room,
                &ServerEvent::MessageRead {
                    id: message.id.clone(),
                    reader: None,
                },
            )
            .await;
        Ok(true)
    }

    /// Record an explicit read acknowledgement.
    ///
    /// Unknown ids, messages of another room, the author's own messages and
    /// repeated acknowledgements are no-ops (`Ok(false)`).
    pub async fn acknowledge(
        &self,
        room: &RoomGuard,
        id: &MessageId,
        reader: &UserId,
    ) -> Result<bool, RepositoryError> {
        let Some(mut message) = self.messages.find_by_id(id).await? else {
            tracing::debug!("Read ack for unknown message '{}' ignored", id);
            return Ok(false);
        };
        if &message.room != room.room() {
            tracing::debug!("Read ack for message '{}' from another room ignored", id);
            return Ok(false);
        }
        if !message.mark_read_by(reader) {
            return Ok(false);
        }

        self.messages
            .update_read_set(&message.id, message.read_by())
            .await?;
        self.broadcaster
            .to_room(
                room,
                &ServerEvent::MessageRead {
                    id: message.id,
                    reader: Some(reader.clone()),
                },
            )
            .await;
        Ok(true)
    }
}
