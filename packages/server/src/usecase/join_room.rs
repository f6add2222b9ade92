//! UseCase: Room への参加処理
//!
//! Under the room's guard, in this order:
//!
//! 1. read catch-up for the joining user
//! 2. history load (newest `history_limit`, after the user's clear cutoff)
//! 3. last-seen update
//! 4. presence registration
//! 5. `history` to the joining connection, `user:online` to everyone else
//!
//! Any failure before step 4 leaves the user outside the room.

use std::sync::Arc;

use tayori_shared::time::Clock;

use crate::domain::{
    ConnectionId, MessageRepository, PresenceRegistry, RoomAccessPolicy, RoomId, ServerEvent,
    SortOrder, Timestamp, UserId, UserRepository,
};

use super::{broadcaster::EventBroadcaster, error::JoinRoomError, read_state::ReadStateReconciler};

/// Default number of history messages sent on join.
pub const DEFAULT_HISTORY_LIMIT: usize = 100;

/// Summary of a successful join.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinedRoom {
    /// `true` when the user was not online in the room before.
    pub newly_online: bool,
    pub history_len: usize,
    pub caught_up: usize,
}

/// Room 参加のユースケース
pub struct JoinRoomUseCase {
    access: Arc<dyn RoomAccessPolicy>,
    registry: PresenceRegistry,
    messages: Arc<dyn MessageRepository>,
    users: Arc<dyn UserRepository>,
    reconciler: Arc<ReadStateReconciler>,
    broadcaster: EventBroadcaster,
    clock: Arc<dyn Clock>,
    history_limit: usize,
}

impl JoinRoomUseCase {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        access: Arc<dyn RoomAccessPolicy>,
        registry: PresenceRegistry,
        messages: Arc<dyn MessageRepository>,
        users: Arc<dyn UserRepository>,
        reconciler: Arc<ReadStateReconciler>,
        broadcaster: EventBroadcaster,
        clock: Arc<dyn Clock>,
        history_limit: usize,
    ) -> Self {
        Self {
            access,
            registry,
            messages,
            users,
            reconciler,
            broadcaster,
            clock,
            history_limit,
        }
    }

    /// アクセス権を確認
    pub async fn authorize(&self, room: &RoomId, user: &UserId) -> Result<(), JoinRoomError> {
        if self.access.can_join(room, user).await {
            Ok(())
        } else {
            Err(JoinRoomError::AccessDenied(room.clone()))
        }
    }

    /// Room 参加を実行
    ///
    /// # Arguments
    ///
    /// * `connection` - 参加する接続
    /// * `user` - 参加するユーザー
    /// * `room` - 参加先の Room
    ///
    /// # Returns
    ///
    /// * `Ok(JoinedRoom)` - 参加完了
    /// * `Err(JoinRoomError)` - アクセス拒否、または永続化の失敗（Room には未登録のまま）
    pub async fn execute(
        &self,
        connection: ConnectionId,
        user: &UserId,
        room: &RoomId,
    ) -> Result<JoinedRoom, JoinRoomError> {
        self.authorize(room, user).await?;

        let mut guard = self.registry.enter(room).await;

        let cutoff = self
            .users
            .find(user)
            .await?
            .and_then(|record| record.cleared_cutoff(room));

        let caught_up = self.reconciler.catch_up(&guard, user).await?;

        let mut history = self
            .messages
            .range_by_room(room, SortOrder::Descending, cutoff, self.history_limit)
            .await?;
        history.reverse();

        self.users
            .upsert_last_seen(user, Timestamp::new(self.clock.now_millis()))
            .await?;

        let newly_online = guard.join(user, connection);
        let history_len = history.len();

        self.broadcaster
            .to_connection(&connection, &ServerEvent::History(history))
            .await;
        self.broadcaster
            .to_room_except(&guard, &connection, &ServerEvent::UserOnline(user.clone()))
            .await;

        tracing::info!(
            "'{}' joined room '{}' ({} online)",
            user,
            room,
            guard.online_count()
        );

        Ok(JoinedRoom {
            newly_online,
            history_len,
            caught_up: caught_up.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{Message, MessageStatus, MockUserRepository, RepositoryError},
        infrastructure::access::StaticRoomAccessPolicy,
        usecase::{
            SendMessageUseCase,
            test_support::{Fixture, body, room, user},
        },
    };
    use serde_json::json;

    fn usecase(fixture: &Fixture, history_limit: usize) -> JoinRoomUseCase {
        usecase_with_users(fixture, fixture.users.clone(), history_limit)
    }

    fn usecase_with_users(
        fixture: &Fixture,
        users: Arc<dyn UserRepository>,
        history_limit: usize,
    ) -> JoinRoomUseCase {
        JoinRoomUseCase::new(
            Arc::new(StaticRoomAccessPolicy::with_private_rooms([
                "staff=alice".parse().unwrap(),
            ])),
            fixture.registry.clone(),
            fixture.messages.clone(),
            users,
            fixture.reconciler.clone(),
            fixture.broadcaster.clone(),
            fixture.clock.clone(),
            history_limit,
        )
    }

    async fn post(
        fixture: &Fixture,
        author: &str,
        room_name: &str,
        text: &str,
        at: i64,
    ) -> Message {
        let message = Message::new(
            user(author),
            room(room_name),
            body(text),
            None,
            Timestamp::new(at),
        );
        fixture.messages.append(&message).await.unwrap();
        message
    }

    fn history_of(events: &[ServerEvent]) -> Vec<Message> {
        events
            .iter()
            .find_map(|e| match e {
                ServerEvent::History(messages) => Some(messages.clone()),
                _ => None,
            })
            .unwrap_or_default()
    }

    #[tokio::test]
    async fn test_join_sends_history_and_announces_online() {
        // テスト項目: join で履歴が本人に、user:online が他メンバーに届く
        // given (前提条件):
        let fixture = Fixture::new();
        let join = usecase(&fixture, DEFAULT_HISTORY_LIMIT);
        let alice_conn = ConnectionId::generate();
        let bob_conn = ConnectionId::generate();
        join.execute(alice_conn, &user("alice"), &room("lobby"))
            .await
            .unwrap();
        post(&fixture, "alice", "lobby", "hi", 10).await;
        fixture.pusher.clear().await;

        // when (操作):
        let joined = join
            .execute(bob_conn, &user("bob"), &room("lobby"))
            .await
            .unwrap();

        // then (期待する結果):
        assert!(joined.newly_online);
        assert_eq!(joined.history_len, 1);
        let to_bob = fixture.pusher.received_by(&bob_conn).await;
        let history = history_of(&to_bob);
        assert_eq!(history.len(), 1);
        assert!(!to_bob.contains(&ServerEvent::UserOnline(user("bob"))));
        let to_alice = fixture.pusher.received_by(&alice_conn).await;
        assert!(to_alice.contains(&ServerEvent::UserOnline(user("bob"))));
        assert!(fixture.registry.is_online(&user("bob")));
    }

    #[tokio::test]
    async fn test_join_catches_up_before_history_is_sent() {
        // テスト項目: 参加時に未読メッセージが既読になり、履歴にも既読として含まれる
        // given (前提条件):
        let fixture = Fixture::new();
        let join = usecase(&fixture, DEFAULT_HISTORY_LIMIT);
        let m1 = post(&fixture, "alice", "lobby", "one", 10).await;
        let m2 = post(&fixture, "alice", "lobby", "two", 20).await;
        let carol_conn = ConnectionId::generate();

        // when (操作):
        let joined = join
            .execute(carol_conn, &user("carol"), &room("lobby"))
            .await
            .unwrap();

        // then (期待する結果):
        assert_eq!(joined.caught_up, 2);
        let history = history_of(&fixture.pusher.received_by(&carol_conn).await);
        assert_eq!(
            history.iter().map(|m| m.id.clone()).collect::<Vec<_>>(),
            vec![m1.id, m2.id]
        );
        assert!(history.iter().all(|m| m.status() == MessageStatus::Read));
    }

    #[tokio::test]
    async fn test_join_history_is_newest_n_in_ascending_order() {
        // テスト項目: 履歴は新しい N 件を古い順に並べたもの
        // given (前提条件):
        let fixture = Fixture::new();
        let join = usecase(&fixture, 2);
        post(&fixture, "alice", "lobby", "one", 10).await;
        let m2 = post(&fixture, "alice", "lobby", "two", 20).await;
        let m3 = post(&fixture, "alice", "lobby", "three", 30).await;
        let conn = ConnectionId::generate();

        // when (操作):
        join.execute(conn, &user("bob"), &room("lobby")).await.unwrap();

        // then (期待する結果):
        let history = history_of(&fixture.pusher.received_by(&conn).await);
        assert_eq!(
            history.iter().map(|m| m.id.clone()).collect::<Vec<_>>(),
            vec![m2.id, m3.id]
        );
    }

    #[tokio::test]
    async fn test_join_history_respects_clear_cutoff() {
        // テスト項目: 履歴クリア時刻以前のメッセージは履歴に含まれない
        // given (前提条件):
        let fixture = Fixture::new();
        let join = usecase(&fixture, DEFAULT_HISTORY_LIMIT);
        post(&fixture, "alice", "lobby", "old", 10).await;
        let fresh = post(&fixture, "alice", "lobby", "new", 30).await;
        fixture
            .users
            .set_cleared_cutoff(&user("bob"), &room("lobby"), Timestamp::new(20))
            .await
            .unwrap();
        let conn = ConnectionId::generate();

        // when (操作):
        join.execute(conn, &user("bob"), &room("lobby")).await.unwrap();

        // then (期待する結果):
        let history = history_of(&fixture.pusher.received_by(&conn).await);
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].id, fresh.id);
    }

    #[tokio::test]
    async fn test_join_private_room_denied() {
        // テスト項目: private Room に非メンバーは参加できず、Room にも登録されない
        // given (前提条件):
        let fixture = Fixture::new();
        let join = usecase(&fixture, DEFAULT_HISTORY_LIMIT);
        let conn = ConnectionId::generate();

        // when (操作):
        let result = join.execute(conn, &user("bob"), &room("staff")).await;

        // then (期待する結果):
        assert_eq!(result, Err(JoinRoomError::AccessDenied(room("staff"))));
        assert!(!fixture.registry.is_online(&user("bob")));
        assert!(fixture.pusher.events().await.is_empty());
    }

    #[tokio::test]
    async fn test_join_last_seen_failure_leaves_user_outside() {
        // テスト項目: last-seen の永続化に失敗すると参加は失敗し、presence も変わらない
        // given (前提条件):
        let fixture = Fixture::new();
        let mut users = MockUserRepository::new();
        users.expect_find().returning(|_| Ok(None));
        users
            .expect_upsert_last_seen()
            .returning(|_, _| Err(RepositoryError::Unavailable("down".to_string())));
        let join = usecase_with_users(&fixture, Arc::new(users), DEFAULT_HISTORY_LIMIT);
        let conn = ConnectionId::generate();

        // when (操作):
        let result = join.execute(conn, &user("bob"), &room("lobby")).await;

        // then (期待する結果):
        assert_eq!(
            result,
            Err(JoinRoomError::Repository(RepositoryError::Unavailable(
                "down".to_string()
            )))
        );
        assert!(fixture.registry.snapshot(&room("lobby")).await.is_empty());
        assert!(fixture.pusher.received_by(&conn).await.is_empty());
    }

    #[tokio::test]
    async fn test_second_connection_of_same_user_is_not_newly_online() {
        // テスト項目: 同じユーザーの二つ目の接続では newly_online が false
        // given (前提条件):
        let fixture = Fixture::new();
        let join = usecase(&fixture, DEFAULT_HISTORY_LIMIT);
        join.execute(ConnectionId::generate(), &user("alice"), &room("lobby"))
            .await
            .unwrap();

        // when (操作):
        let joined = join
            .execute(ConnectionId::generate(), &user("alice"), &room("lobby"))
            .await
            .unwrap();

        // then (期待する結果):
        assert!(!joined.newly_online);
        assert_eq!(fixture.registry.snapshot(&room("lobby")).await.len(), 1);
    }

    #[tokio::test]
    async fn test_join_room_with_legacy_empty_message_succeeds() {
        // テスト項目: 本文が空の古いメッセージが残る Room にも参加でき、履歴と既読に含まれる
        // given (前提条件):
        let fixture = Fixture::new();
        let join = usecase(&fixture, DEFAULT_HISTORY_LIMIT);
        fixture
            .messages
            .insert_document(json!({
                "id": "legacy-1",
                "user": "alice",
                "room": "lobby",
                "text": "",
                "created": 10
            }))
            .await
            .unwrap();
        let conn = ConnectionId::generate();

        // when (操作):
        let joined = join
            .execute(conn, &user("bob"), &room("lobby"))
            .await
            .unwrap();

        // then (期待する結果):
        assert_eq!(joined.caught_up, 1);
        let history = history_of(&fixture.pusher.received_by(&conn).await);
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].body.as_str(), "");
        assert!(history[0].is_read_by(&user("bob")));
        assert!(fixture.registry.is_online(&user("bob")));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_send_and_join_mark_read_exactly_once() {
        // テスト項目: 同じ Room への送信と参加が並行しても、参加者は必ず既読者になり、既読通知は一度だけ
        for _ in 0..50 {
            // given (前提条件):
            let fixture = Fixture::new();
            let join = Arc::new(usecase(&fixture, DEFAULT_HISTORY_LIMIT));
            let send = Arc::new(SendMessageUseCase::new(
                fixture.registry.clone(),
                fixture.messages.clone(),
                fixture.reconciler.clone(),
                fixture.broadcaster.clone(),
                fixture.clock.clone(),
            ));
            let alice_conn = ConnectionId::generate();
            let bob_conn = ConnectionId::generate();
            fixture
                .registry
                .join(&room("lobby"), &user("alice"), alice_conn)
                .await;

            // when (操作):
            let sending = tokio::spawn({
                let send = send.clone();
                async move {
                    send.execute(&user("alice"), &room("lobby"), body("race"), None)
                        .await
                }
            });
            let joining = tokio::spawn({
                let join = join.clone();
                async move { join.execute(bob_conn, &user("bob"), &room("lobby")).await }
            });
            let message = sending.await.unwrap().unwrap();
            let joined = joining.await.unwrap().unwrap();

            // then (期待する結果):
            let stored = fixture.messages.find_by_id(&message.id).await.unwrap().unwrap();
            assert!(stored.is_read_by(&user("bob")));
            assert_eq!(stored.status(), MessageStatus::Read);
            let reads: Vec<_> = fixture
                .pusher
                .received_by(&alice_conn)
                .await
                .into_iter()
                .filter(|e| matches!(e, ServerEvent::MessageRead { id, .. } if id == &message.id))
                .collect();
            assert_eq!(reads.len(), 1);
            let expected_reader = if joined.caught_up == 1 {
                Some(user("bob"))
            } else {
                None
            };
            assert_eq!(
                reads[0],
                ServerEvent::MessageRead {
                    id: message.id.clone(),
                    reader: expected_reader,
                }
            );
        }
    }
}
