//! WebSocket connection handler.

use std::sync::Arc;

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use futures_util::{
    sink::SinkExt,
    stream::{SplitSink, StreamExt},
};
use tokio::sync::{mpsc, oneshot};

use crate::{
    domain::ClientCommand,
    infrastructure::dto::websocket::ClientEventDto,
    ui::{session::RoomSession, state::AppState},
};

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Forwards serialized events from the pusher channel to the socket.
///
/// Ends when the channel closes (connection unregistered) or a write fails.
async fn pusher_loop(
    mut rx: mpsc::UnboundedReceiver<String>,
    mut sender: SplitSink<WebSocket, Message>,
) {
    while let Some(frame) = rx.recv().await {
        if sender.send(Message::Text(frame.into())).await.is_err() {
            break;
        }
    }
}

/// Parse one text frame. Malformed or invalid input yields `None`.
fn parse_command(text: &str) -> Option<ClientCommand> {
    let event = match serde_json::from_str::<ClientEventDto>(text) {
        Ok(event) => event,
        Err(e) => {
            tracing::warn!("Ignoring malformed frame: {}", e);
            return None;
        }
    };
    match ClientCommand::try_from(event) {
        Ok(command) => Some(command),
        Err(e) => {
            tracing::warn!("Ignoring invalid command: {}", e);
            None
        }
    }
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (sender, mut receiver) = socket.split();
    let (tx, rx) = mpsc::unbounded_channel();
    let mut session = RoomSession::open(state, tx).await;
    let connection = session.connection();

    // The writer reports its exit so the reader stops between commands.
    let (writer_done_tx, mut writer_done_rx) = oneshot::channel::<()>();
    let send_task = tokio::spawn(async move {
        pusher_loop(rx, sender).await;
        let _ = writer_done_tx.send(());
    });

    loop {
        tokio::select! {
            frame = receiver.next() => match frame {
                Some(Ok(Message::Text(text))) => {
                    if let Some(command) = parse_command(text.as_str()) {
                        // already reported to the client by the session
                        let _ = session.handle(command).await;
                    }
                }
                Some(Ok(Message::Close(_))) | None => {
                    tracing::debug!("Connection '{}' closed by peer", connection);
                    break;
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    tracing::debug!("Connection '{}' read error: {}", connection, e);
                    break;
                }
            },
            _ = &mut writer_done_rx => {
                tracing::debug!("Connection '{}' writer stopped", connection);
                break;
            }
        }
    }

    if let Err(e) = session.close().await {
        tracing::warn!("Connection '{}' cleanup failed: {}", connection, e);
    }
    // Unregistering dropped the channel sender; the writer drains and exits.
    if let Err(e) = send_task.await {
        tracing::debug!("Writer task of '{}' ended abnormally: {}", connection, e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{MessageId, RoomId, UserId};

    #[test]
    fn test_parse_valid_command() {
        // テスト項目: 正しい JSON はコマンドに変換される
        // given (前提条件):
        let text = r#"{"type":"msg:read","id":"m-1"}"#;

        // when (操作):
        let command = parse_command(text);

        // then (期待する結果):
        assert_eq!(
            command,
            Some(ClientCommand::AcknowledgeRead {
                id: MessageId::new("m-1".to_string()).unwrap(),
            })
        );
    }

    #[test]
    fn test_parse_ignores_malformed_and_invalid_input() {
        // テスト項目: 不正な JSON、未知の type、空のユーザー名は無視される
        // given (前提条件):
        let inputs = [
            "not json",
            r#"{"type":"dance"}"#,
            r#"{"type":"join","user":"","room":"lobby"}"#,
        ];

        // when (操作):
        let parsed: Vec<_> = inputs.iter().map(|text| parse_command(text)).collect();

        // then (期待する結果):
        assert_eq!(parsed, vec![None, None, None]);
    }

    #[test]
    fn test_parse_join() {
        // テスト項目: join コマンドの解析
        // given (前提条件):
        let text = r#"{"type":"join","user":"alice","room":"lobby"}"#;

        // when (操作):
        let command = parse_command(text);

        // then (期待する結果):
        assert_eq!(
            command,
            Some(ClientCommand::Join {
                user: UserId::new("alice".to_string()).unwrap(),
                room: RoomId::new("lobby".to_string()).unwrap(),
            })
        );
    }
}
