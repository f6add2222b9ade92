//! Repository trait 定義
//!
//! ドメイン層が必要とするデータアクセスのインターフェースを定義します。
//! 具体的な実装は Infrastructure 層が提供します（依存性の逆転）。

use std::collections::BTreeSet;

use async_trait::async_trait;

use super::{
    Message, MessageId, RepositoryError, RoomId, Timestamp, UserId, UserPresenceRecord,
};

/// Sort order for range queries over a room's log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    /// Oldest first
    Ascending,
    /// Newest first
    Descending,
}

/// Message Repository trait
///
/// Ordered append log of messages per room. Point updates of the reader set
/// are atomic on the store side; callers never hold a store lock across calls.
///
/// Loaded messages always carry a normalized reader set: a stored record
/// without one is returned with an empty set.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessageRepository: Send + Sync {
    /// メッセージを追加し、その ID を返す
    async fn append(&self, message: &Message) -> Result<MessageId, RepositoryError>;

    /// ID でメッセージを取得（存在しなければ `None`）
    async fn find_by_id(&self, id: &MessageId) -> Result<Option<Message>, RepositoryError>;

    /// 既読者集合を更新
    ///
    /// The stored set only grows: `read_by` is merged into it.
    async fn update_read_set(
        &self,
        id: &MessageId,
        read_by: &BTreeSet<UserId>,
    ) -> Result<(), RepositoryError>;

    /// Room のメッセージを作成時刻順に取得
    ///
    /// `after` excludes messages created at or before the given time.
    async fn range_by_room(
        &self,
        room: &RoomId,
        order: SortOrder,
        after: Option<Timestamp>,
        limit: usize,
    ) -> Result<Vec<Message>, RepositoryError>;

    /// `reader` が未読の（かつ作者ではない）メッセージを作成時刻の昇順で取得
    async fn find_unread_for(
        &self,
        room: &RoomId,
        reader: &UserId,
    ) -> Result<Vec<Message>, RepositoryError>;
}

/// User Repository trait
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// ユーザーの presence レコードを取得
    async fn find(&self, user: &UserId) -> Result<Option<UserPresenceRecord>, RepositoryError>;

    /// last-seen を更新（レコードがなければ作成）
    async fn upsert_last_seen(&self, user: &UserId, at: Timestamp) -> Result<(), RepositoryError>;

    /// Room ごとの履歴クリア時刻を設定（レコードがなければ作成）
    async fn set_cleared_cutoff(
        &self,
        user: &UserId,
        room: &RoomId,
        at: Timestamp,
    ) -> Result<(), RepositoryError>;
}
