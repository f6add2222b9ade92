//! UseCase 層のエラー型

use thiserror::Error;

use crate::domain::{RepositoryError, RoomId};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JoinRoomError {
    #[error("not allowed to join room '{0}'")]
    AccessDenied(RoomId),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LeaveRoomError {
    #[error("failed to record last-seen: {0}")]
    Repository(#[from] RepositoryError),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SendMessageError {
    #[error("failed to store message: {0}")]
    Repository(#[from] RepositoryError),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AcknowledgeReadError {
    #[error("failed to store read receipt: {0}")]
    Repository(#[from] RepositoryError),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClearHistoryError {
    #[error("failed to clear history: {0}")]
    Repository(#[from] RepositoryError),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LastSeenError {
    #[error("failed to load last-seen: {0}")]
    Repository(#[from] RepositoryError),
}
