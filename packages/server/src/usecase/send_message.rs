//! UseCase: メッセージ送信処理
//!
//! The message is stored, then broadcast to the whole room (sender included),
//! then marked read by whoever else is online. All three happen under the
//! room's guard, so a concurrent join is either part of the instant-read set
//! or catches the message up afterwards.

use std::sync::Arc;

use tayori_shared::time::Clock;

use crate::domain::{
    Message, MessageBody, MessageId, MessageRepository, PresenceRegistry, ReplySnapshot, RoomId,
    ServerEvent, Timestamp, UserId,
};

use super::{
    broadcaster::EventBroadcaster, error::SendMessageError, read_state::ReadStateReconciler,
};

/// メッセージ送信のユースケース
pub struct SendMessageUseCase {
    registry: PresenceRegistry,
    messages: Arc<dyn MessageRepository>,
    reconciler: Arc<ReadStateReconciler>,
    broadcaster: EventBroadcaster,
    clock: Arc<dyn Clock>,
}

impl SendMessageUseCase {
    pub fn new(
        registry: PresenceRegistry,
        messages: Arc<dyn MessageRepository>,
        reconciler: Arc<ReadStateReconciler>,
        broadcaster: EventBroadcaster,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            registry,
            messages,
            reconciler,
            broadcaster,
            clock,
        }
    }

    /// メッセージ送信を実行
    ///
    /// # Arguments
    ///
    /// * `author` - 送信者
    /// * `room` - 送信先の Room
    /// * `body` - 本文（検証済み）
    /// * `reply_to` - 返信先メッセージの ID。存在しないか別 Room のものなら無視される
    ///
    /// # Returns
    ///
    /// * `Ok(Message)` - 保存されたメッセージ（instant-read 後の既読者集合を含む）
    /// * `Err(SendMessageError)` - 保存に失敗。この場合ブロードキャストは行われない
    pub async fn execute(
        &self,
        author: &UserId,
        room: &RoomId,
        body: MessageBody,
        reply_to: Option<&MessageId>,
    ) -> Result<Message, SendMessageError> {
        let guard = self.registry.enter(room).await;

        let reply = match reply_to {
            Some(id) => self.resolve_reply(room, id).await?,
            None => None,
        };

        let mut message = Message::new(
            author.clone(),
            room.clone(),
            body,
            reply,
            Timestamp::new(self.clock.now_millis()),
        );
        self.messages.append(&message).await?;

        self.broadcaster
            .to_room(&guard, &ServerEvent::MessagePosted(message.clone()))
            .await;

        self.reconciler.instant_read(&guard, &mut message).await?;

        tracing::debug!(
            "'{}' posted '{}' to room '{}' ({})",
            author,
            message.id,
            room,
            message.status().as_str()
        );
        Ok(message)
    }

    async fn resolve_reply(
        &self,
        room: &RoomId,
        id: &MessageId,
    ) -> Result<Option<ReplySnapshot>, SendMessageError> {
        let reply = self
            .messages
            .find_by_id(id)
            .await?
            .filter(|target| &target.room == room)
            .map(|target| ReplySnapshot::from(&target));
        if reply.is_none() {
            tracing::debug!("Reply target '{}' not found in room '{}'", id, room);
        }
        Ok(reply)
    }
}
