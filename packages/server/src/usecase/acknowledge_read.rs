//! UseCase: 既読通知の処理

use std::sync::Arc;

use crate::domain::{MessageId, PresenceRegistry, RoomId, UserId};

use super::{error::AcknowledgeReadError, read_state::ReadStateReconciler};

/// 既読通知のユースケース
pub struct AcknowledgeReadUseCase {
    registry: PresenceRegistry,
    reconciler: Arc<ReadStateReconciler>,
}

impl AcknowledgeReadUseCase {
    pub fn new(registry: PresenceRegistry, reconciler: Arc<ReadStateReconciler>) -> Self {
        Self {
            registry,
            reconciler,
        }
    }

    /// `reader` が `room` で `id` を読んだことを記録する
    ///
    /// Returns `Ok(true)` when the reader set changed and `msg:read` was broadcast.
    pub async fn execute(
        &self,
        reader: &UserId,
        room: &RoomId,
        id: &MessageId,
    ) -> Result<bool, AcknowledgeReadError> {
        let guard = self.registry.enter(room).await;
        Ok(self.reconciler.acknowledge(&guard, id, reader).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{ConnectionId, Message, MessageRepository, ServerEvent, Timestamp},
        usecase::test_support::{Fixture, body, room, user},
    };

    #[tokio::test]
    async fn test_acknowledge_broadcasts_reader_to_room() {
        // テスト項目: 既読通知で msg:read（既読者付き）が Room 全員に届く
        // given (前提条件):
        let fixture = Fixture::new();
        let ack = AcknowledgeReadUseCase::new(fixture.registry.clone(), fixture.reconciler.clone());
        let message = Message::new(
            user("alice"),
            room("lobby"),
            body("hi"),
            None,
            Timestamp::new(1),
        );
        fixture.messages.append(&message).await.unwrap();
        let alice_conn = ConnectionId::generate();
        let bob_conn = ConnectionId::generate();
        fixture.registry.join(&room("lobby"), &user("alice"), alice_conn).await;
        fixture.registry.join(&room("lobby"), &user("bob"), bob_conn).await;

        // when (操作):
        let changed = ack
            .execute(&user("bob"), &room("lobby"), &message.id)
            .await
            .unwrap();

        // then (期待する結果):
        assert!(changed);
        let expected = ServerEvent::MessageRead {
            id: message.id.clone(),
            reader: Some(user("bob")),
        };
        assert_eq!(fixture.pusher.received_by(&alice_conn).await, vec![expected.clone()]);
        assert_eq!(fixture.pusher.received_by(&bob_conn).await, vec![expected]);
    }

    #[tokio::test]
    async fn test_author_acknowledging_own_message_is_noop() {
        // テスト項目: 作者自身の既読通知は何も変えない
        // given (前提条件):
        let fixture = Fixture::new();
        let ack = AcknowledgeReadUseCase::new(fixture.registry.clone(), fixture.reconciler.clone());
        let message = Message::new(
            user("alice"),
            room("lobby"),
            body("hi"),
            None,
            Timestamp::new(1),
        );
        fixture.messages.append(&message).await.unwrap();

        // when (操作):
        let changed = ack
            .execute(&user("alice"), &room("lobby"), &message.id)
            .await
            .unwrap();

        // then (期待する結果):
        assert!(!changed);
        assert!(fixture.pusher.events().await.is_empty());
    }
}
