//! HTTP API response DTOs.

use serde::{Deserialize, Serialize};

/// Room with its online users
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomPresenceDto {
    pub room: String,
    pub online: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LastSeenDto {
    pub user: String,
    pub last_seen: Option<i64>,
    /// RFC 3339 rendering of `last_seen`
    pub last_seen_at: Option<String>,
    pub is_online: bool,
}
