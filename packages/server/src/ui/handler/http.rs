//! HTTP API endpoint handlers.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use tayori_shared::time::timestamp_to_rfc3339;

use crate::{
    domain::{RoomId, UserId},
    infrastructure::dto::http::{LastSeenDto, RoomPresenceDto},
    ui::state::AppState,
    usecase::RoomPresenceSummary,
};

impl From<RoomPresenceSummary> for RoomPresenceDto {
    fn from(summary: RoomPresenceSummary) -> Self {
        Self {
            room: summary.room.into_string(),
            online: summary.online.into_iter().map(UserId::into_string).collect(),
        }
    }
}

/// Health check endpoint
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

/// Rooms with at least one online user
pub async fn get_rooms(State(state): State<Arc<AppState>>) -> Json<Vec<RoomPresenceDto>> {
    let rooms = state.get_rooms_usecase.execute().await;
    Json(rooms.into_iter().map(RoomPresenceDto::from).collect())
}

/// Online users of one room
pub async fn get_room_presence(
    State(state): State<Arc<AppState>>,
    Path(room): Path<String>,
) -> Result<Json<RoomPresenceDto>, StatusCode> {
    let room = RoomId::new(room).map_err(|e| {
        tracing::debug!("Invalid room name: {}", e);
        StatusCode::BAD_REQUEST
    })?;
    let summary = state.get_rooms_usecase.room(&room).await;
    Ok(Json(summary.into()))
}

/// Last-seen time and presence of a user
pub async fn get_last_seen(
    State(state): State<Arc<AppState>>,
    Path(user): Path<String>,
) -> Result<Json<LastSeenDto>, StatusCode> {
    let user = UserId::new(user).map_err(|e| {
        tracing::debug!("Invalid user name: {}", e);
        StatusCode::BAD_REQUEST
    })?;
    let seen = state
        .get_last_seen_usecase
        .execute(&user)
        .await
        .map_err(|e| {
            tracing::warn!("Failed to load last-seen of '{}': {}", user, e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

    let last_seen = seen.last_seen.map(|t| t.value());
    Ok(Json(LastSeenDto {
        user: seen.user.into_string(),
        last_seen,
        last_seen_at: last_seen.and_then(timestamp_to_rfc3339),
        is_online: seen.is_online,
    }))
}
