//! MessagePusher trait 定義
//!
//! クライアントへのイベント送信を抽象化します。
//! WebSocket 接続の生成は UI 層、送信は Infrastructure 層が担当します。

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::{ConnectionId, MessagePushError, ServerEvent};

/// Outbound channel of one connection (serialized frames).
pub type PusherChannel = mpsc::UnboundedSender<String>;

#[async_trait]
pub trait MessagePusher: Send + Sync {
    /// 接続を登録
    async fn register_connection(&self, connection: ConnectionId, sender: PusherChannel);

    /// 接続を登録解除（以降この接続には何も送られない）
    async fn unregister_connection(&self, connection: &ConnectionId);

    /// 特定の接続に送信
    async fn push_to(
        &self,
        connection: &ConnectionId,
        event: &ServerEvent,
    ) -> Result<(), MessagePushError>;

    /// 複数の接続に送信
    ///
    /// Never blocks on a recipient. A failed or unknown recipient is skipped.
    async fn broadcast(
        &self,
        targets: &[ConnectionId],
        event: &ServerEvent,
    ) -> Result<(), MessagePushError>;
}
