//! WebSocket event DTOs.
//!
//! Every frame is a JSON object tagged by `type`, e.g.
//! `{"type":"msg","text":"hi","replyTo":null}`.

use serde::{Deserialize, Serialize};

/// Event sent by a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all_fields = "camelCase")]
pub enum ClientEventDto {
    #[serde(rename = "join")]
    Join { user: String, room: String },
    #[serde(rename = "msg")]
    Msg {
        text: String,
        #[serde(default)]
        reply_to: Option<String>,
    },
    #[serde(rename = "msg:read")]
    MsgRead { id: String },
    #[serde(rename = "typing:start")]
    TypingStart,
    #[serde(rename = "typing:stop")]
    TypingStop,
    #[serde(rename = "clear:history")]
    ClearHistory,
    #[serde(rename = "lastseen:request")]
    LastSeenRequest { user: String },
}

/// Quoted message inside a reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplyDto {
    pub id: String,
    pub user: String,
    pub text: String,
    pub created: i64,
}

/// Full message record as seen by clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageDto {
    pub id: String,
    pub user: String,
    pub room: String,
    pub text: String,
    pub reply_to: Option<ReplyDto>,
    /// Unix milliseconds
    pub created: i64,
    /// RFC 3339 rendering of `created`
    pub created_at: String,
    pub read_by: Vec<String>,
    /// "delivered" or "read"
    pub status: String,
}

/// Event sent by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all_fields = "camelCase")]
pub enum ServerEventDto {
    #[serde(rename = "history")]
    History { messages: Vec<MessageDto> },
    #[serde(rename = "msg")]
    Msg { message: MessageDto },
    #[serde(rename = "msg:read")]
    MsgRead {
        id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        user: Option<String>,
    },
    #[serde(rename = "typing:start")]
    TypingStart { user: String },
    #[serde(rename = "typing:stop")]
    TypingStop { user: String },
    #[serde(rename = "user:online")]
    UserOnline { user: String },
    #[serde(rename = "user:offline")]
    UserOffline {
        user: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        last_seen: Option<i64>,
    },
    #[serde(rename = "clear:complete")]
    ClearComplete,
    #[serde(rename = "lastseen:response")]
    LastSeenResponse {
        user: String,
        timestamp: Option<i64>,
        is_online: bool,
    },
    #[serde(rename = "join:denied")]
    JoinDenied { room: String, reason: String },
    #[serde(rename = "error")]
    Error { message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_msg_with_reply() {
        // テスト項目: replyTo 付きの msg を解析できる
        // given (前提条件):
        let json = r#"{"type":"msg","text":"hi","replyTo":"abc"}"#;

        // when (操作):
        let event: ClientEventDto = serde_json::from_str(json).unwrap();

        // then (期待する結果):
        assert_eq!(
            event,
            ClientEventDto::Msg {
                text: "hi".to_string(),
                reply_to: Some("abc".to_string()),
            }
        );
    }

    #[test]
    fn test_parse_unit_event() {
        // テスト項目: ペイロードを持たないイベントを解析できる
        // given (前提条件):
        let json = r#"{"type":"typing:start"}"#;

        // when (操作):
        let event: ClientEventDto = serde_json::from_str(json).unwrap();

        // then (期待する結果):
        assert_eq!(event, ClientEventDto::TypingStart);
    }

    #[test]
    fn test_reject_malformed_payload() {
        // テスト項目: 必須フィールドを欠いたイベントは解析エラー
        // given (前提条件):
        let json = r#"{"type":"join","user":"alice"}"#;

        // when (操作):
        let result = serde_json::from_str::<ClientEventDto>(json);

        // then (期待する結果):
        assert!(result.is_err());
    }

    #[test]
    fn test_serialize_read_event_without_user() {
        // テスト項目: user の無い msg:read は {id} だけを出力する
        // given (前提条件):
        let event = ServerEventDto::MsgRead {
            id: "m1".to_string(),
            user: None,
        };

        // when (操作):
        let json = serde_json::to_value(&event).unwrap();

        // then (期待する結果):
        assert_eq!(json, serde_json::json!({"type": "msg:read", "id": "m1"}));
    }

    #[test]
    fn test_serialize_last_seen_response() {
        // テスト項目: lastseen:response は timestamp を null でも出力し、camelCase になる
        // given (前提条件):
        let event = ServerEventDto::LastSeenResponse {
            user: "bob".to_string(),
            timestamp: None,
            is_online: false,
        };

        // when (操作):
        let json = serde_json::to_value(&event).unwrap();

        // then (期待する結果):
        assert_eq!(
            json,
            serde_json::json!({
                "type": "lastseen:response",
                "user": "bob",
                "timestamp": null,
                "isOnline": false
            })
        );
    }
}
