//! InMemory Message Repository 実装
//!
//! メッセージを「ドキュメント」（`MessageDocument`）として保持します。
//! ドキュメントはスキーマの変遷を許容するため、`readBy` / `status` を
//! 欠いた古いレコードも読み込めます。
//!
//! - 読み込み時: `readBy` が無ければ空集合として扱う。`status` は無視して再計算する
//! - 書き込み時: `readBy` を更新するたびに `status` も上書きする

use std::collections::BTreeSet;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::domain::{
    Message, MessageBody, MessageId, MessageRepository, ReplySnapshot, RepositoryError, RoomId,
    SortOrder, Timestamp, UserId,
};

/// Stored shape of a reply snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplyDocument {
    pub id: String,
    pub user: String,
    #[serde(default)]
    pub text: String,
    pub created: i64,
}

/// Stored shape of a message.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageDocument {
    pub id: String,
    pub user: String,
    pub room: String,
    /// Older records may hold empty text or none at all.
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub reply_to: Option<ReplyDocument>,
    pub created: i64,
    /// Missing on records written before read receipts existed.
    #[serde(default)]
    pub read_by: Option<Vec<String>>,
    /// Query convenience only; never read back as truth.
    #[serde(default)]
    pub status: Option<String>,
}

impl MessageDocument {
    fn reader_names(&self) -> impl Iterator<Item = &str> {
        self.read_by.iter().flatten().map(String::as_str)
    }

    fn is_read_by(&self, reader: &UserId) -> bool {
        self.reader_names().any(|r| r == reader.as_str())
    }

    fn merge_readers(&mut self, readers: &BTreeSet<UserId>) {
        let mut merged: BTreeSet<String> = self.reader_names().map(str::to_string).collect();
        merged.extend(
            readers
                .iter()
                .filter(|r| r.as_str() != self.user)
                .map(|r| r.as_str().to_string()),
        );
        self.status = Some(status_of(merged.len()).to_string());
        self.read_by = Some(merged.into_iter().collect());
    }
}

fn status_of(reader_count: usize) -> &'static str {
    if reader_count == 0 { "delivered" } else { "read" }
}

fn corrupt(id: &str, field: &str) -> RepositoryError {
    RepositoryError::Corrupt(format!("message {} has invalid {}", id, field))
}

impl From<&Message> for MessageDocument {
    fn from(message: &Message) -> Self {
        Self {
            id: message.id.as_str().to_string(),
            user: message.author.as_str().to_string(),
            room: message.room.as_str().to_string(),
            text: message.body.as_str().to_string(),
            reply_to: message.reply_to.as_ref().map(|reply| ReplyDocument {
                id: reply.id.as_str().to_string(),
                user: reply.author.as_str().to_string(),
                text: reply.body.as_str().to_string(),
                created: reply.created_at.value(),
            }),
            created: message.created_at.value(),
            read_by: Some(
                message
                    .read_by()
                    .iter()
                    .map(|u| u.as_str().to_string())
                    .collect(),
            ),
            status: Some(message.status().as_str().to_string()),
        }
    }
}

impl TryFrom<&MessageDocument> for Message {
    type Error = RepositoryError;

    fn try_from(doc: &MessageDocument) -> Result<Self, Self::Error> {
        let reply_to = doc
            .reply_to
            .as_ref()
            .map(|reply| -> Result<ReplySnapshot, RepositoryError> {
                Ok(ReplySnapshot {
                    id: MessageId::new(reply.id.clone())
                        .map_err(|_| corrupt(&doc.id, "replyTo.id"))?,
                    author: UserId::new(reply.user.clone())
                        .map_err(|_| corrupt(&doc.id, "replyTo.user"))?,
                    body: MessageBody::restore(reply.text.clone()),
                    created_at: Timestamp::new(reply.created),
                })
            })
            .transpose()?;

        let read_by = doc
            .reader_names()
            .map(|r| UserId::new(r.to_string()).map_err(|_| corrupt(&doc.id, "readBy")))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Message::restore(
            MessageId::new(doc.id.clone()).map_err(|_| corrupt(&doc.id, "id"))?,
            UserId::new(doc.user.clone()).map_err(|_| corrupt(&doc.id, "user"))?,
            RoomId::new(doc.room.clone()).map_err(|_| corrupt(&doc.id, "room"))?,
            MessageBody::restore(doc.text.clone()),
            reply_to,
            Timestamp::new(doc.created),
            read_by,
        ))
    }
}

/// インメモリ Message Repository 実装
///
/// Documents are kept in append order.
#[derive(Debug, Default)]
pub struct InMemoryMessageRepository {
    documents: Mutex<Vec<MessageDocument>>,
}

impl InMemoryMessageRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a raw JSON document as-is, e.g. a record from an older schema.
    pub async fn insert_document(
        &self,
        document: serde_json::Value,
    ) -> Result<(), RepositoryError> {
        let document: MessageDocument = serde_json::from_value(document)
            .map_err(|e| RepositoryError::Corrupt(e.to_string()))?;
        self.documents.lock().await.push(document);
        Ok(())
    }

    /// Raw stored document, for inspecting what was persisted.
    pub async fn document(&self, id: &MessageId) -> Option<MessageDocument> {
        self.documents
            .lock()
            .await
            .iter()
            .find(|d| d.id == id.as_str())
            .cloned()
    }

    /// Documents of `room` sorted by creation time, ties in append order.
    fn room_documents<'a>(
        documents: &'a [MessageDocument],
        room: &RoomId,
    ) -> Vec<&'a MessageDocument> {
        let mut docs: Vec<&MessageDocument> =
            documents.iter().filter(|d| d.room == room.as_str()).collect();
        docs.sort_by_key(|d| d.created);
        docs
    }
}

#[async_trait]
impl MessageRepository for InMemoryMessageRepository {
    async fn append(&self, message: &Message) -> Result<MessageId, RepositoryError> {
        let mut documents = self.documents.lock().await;
        documents.push(MessageDocument::from(message));
        Ok(message.id.clone())
    }

    async fn find_by_id(&self, id: &MessageId) -> Result<Option<Message>, RepositoryError> {
        let documents = self.documents.lock().await;
        documents
            .iter()
            .find(|d| d.id == id.as_str())
            .map(Message::try_from)
            .transpose()
    }

    async fn update_read_set(
        &self,
        id: &MessageId,
        read_by: &BTreeSet<UserId>,
    ) -> Result<(), RepositoryError> {
        let mut documents = self.documents.lock().await;
        let document = documents
            .iter_mut()
            .find(|d| d.id == id.as_str())
            .ok_or_else(|| RepositoryError::MessageNotFound(id.as_str().to_string()))?;
        document.merge_readers(read_by);
        Ok(())
    }

    async fn range_by_room(
        &self,
        room: &RoomId,
        order: SortOrder,
        after: Option<Timestamp>,
        limit: usize,
    ) -> Result<Vec<Message>, RepositoryError> {
        let documents = self.documents.lock().await;
        let mut docs = Self::room_documents(&documents, room);
        if let Some(after) = after {
            docs.retain(|d| d.created > after.value());
        }
        if order == SortOrder::Descending {
            docs.reverse();
        }
        docs.into_iter().take(limit).map(Message::try_from).collect()
    }

    async fn find_unread_for(
        &self,
        room: &RoomId,
        reader: &UserId,
    ) -> Result<Vec<Message>, RepositoryError> {
        let documents = self.documents.lock().await;
        Self::room_documents(&documents, room)
            .into_iter()
            .filter(|d| d.user != reader.as_str() && !d.is_read_by(reader))
            .map(Message::try_from)
            .collect()
    }
}
