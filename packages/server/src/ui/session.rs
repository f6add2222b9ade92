//! Per-connection session.
//!
//! A session is bound to at most one room at a time:
//!
//! ```text
//! Unbound --join ok--> Joined{user, room} --join other room--> Joined{..}
//!    |                        |
//!    +-------- close ---------+-----> Closed
//! ```
//!
//! Only `join` is accepted while unbound. Leaving the previous room happens
//! after the access check for the new one, so a denied join keeps the
//! current binding.

use std::sync::Arc;

use thiserror::Error;

use crate::{
    domain::{
        ClientCommand, ConnectionId, MessageBody, MessageId, PusherChannel, RoomId, ServerEvent,
        UserId,
    },
    usecase::{
        AcknowledgeReadError, ClearHistoryError, JoinRoomError, LastSeenError, LeaveRoomError,
        SendMessageError, Typing,
    },
};

use super::state::AppState;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error(transparent)]
    Join(#[from] JoinRoomError),
    #[error(transparent)]
    Leave(#[from] LeaveRoomError),
    #[error(transparent)]
    Send(#[from] SendMessageError),
    #[error(transparent)]
    AcknowledgeRead(#[from] AcknowledgeReadError),
    #[error(transparent)]
    ClearHistory(#[from] ClearHistoryError),
    #[error(transparent)]
    LastSeen(#[from] LastSeenError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Unbound,
    Joined { user: UserId, room: RoomId },
    Closed,
}

pub struct RoomSession {
    connection: ConnectionId,
    state: SessionState,
    app: Arc<AppState>,
}

impl RoomSession {
    /// Register a new connection and start unbound.
    pub async fn open(app: Arc<AppState>, sender: PusherChannel) -> Self {
        let connection = ConnectionId::generate();
        app.message_pusher
            .register_connection(connection, sender)
            .await;
        tracing::debug!("Connection '{}' opened", connection);
        Self {
            connection,
            state: SessionState::Unbound,
            app,
        }
    }

    pub fn connection(&self) -> ConnectionId {
        self.connection
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Apply one client command.
    ///
    /// Failures are logged and reported to this connection as an `error`
    /// event before being returned.
    pub async fn handle(&mut self, command: ClientCommand) -> Result<(), SessionError> {
        if self.state == SessionState::Closed {
            return Ok(());
        }

        let result = match command {
            ClientCommand::Join { user, room } => self.join(user, room).await,
            command => match &self.state {
                SessionState::Joined { user, room } => {
                    let (user, room) = (user.clone(), room.clone());
                    self.dispatch(user, room, command).await
                }
                _ => {
                    tracing::debug!(
                        "Connection '{}' is not in a room, ignoring {:?}",
                        self.connection,
                        command
                    );
                    Ok(())
                }
            },
        };

        if let Err(e) = &result {
            self.report(e).await;
        }
        result
    }

    /// Leave the current room, if any. Only the first call has an effect.
    pub async fn close(&mut self) -> Result<(), SessionError> {
        let previous = std::mem::replace(&mut self.state, SessionState::Closed);
        if previous == SessionState::Closed {
            return Ok(());
        }

        self.app
            .message_pusher
            .unregister_connection(&self.connection)
            .await;
        tracing::debug!("Connection '{}' closed", self.connection);

        if let SessionState::Joined { user, room } = previous {
            self.app
                .leave_room_usecase
                .execute(&self.connection, &user, &room)
                .await?;
        }
        Ok(())
    }

    async fn dispatch(
        &self,
        user: UserId,
        room: RoomId,
        command: ClientCommand,
    ) -> Result<(), SessionError> {
        match command {
            ClientCommand::Send { body, reply_to } => {
                self.send(&user, &room, body, reply_to.as_ref()).await
            }
            ClientCommand::AcknowledgeRead { id } => {
                self.app
                    .acknowledge_read_usecase
                    .execute(&user, &room, &id)
                    .await?;
                Ok(())
            }
            ClientCommand::TypingStart => {
                self.typing(&user, &room, Typing::Started).await;
                Ok(())
            }
            ClientCommand::TypingStop => {
                self.typing(&user, &room, Typing::Stopped).await;
                Ok(())
            }
            ClientCommand::ClearHistory => {
                self.app
                    .clear_history_usecase
                    .execute(&self.connection, &user, &room)
                    .await?;
                Ok(())
            }
            ClientCommand::LastSeenRequest { user: target } => {
                let seen = self.app.get_last_seen_usecase.execute(&target).await?;
                self.app
                    .broadcaster
                    .to_connection(
                        &self.connection,
                        &ServerEvent::LastSeen {
                            user: seen.user,
                            last_seen: seen.last_seen,
                            is_online: seen.is_online,
                        },
                    )
                    .await;
                Ok(())
            }
            // handled before dispatch
            ClientCommand::Join { .. } => Ok(()),
        }
    }

    async fn join(&mut self, user: UserId, room: RoomId) -> Result<(), SessionError> {
        let join = &self.app.join_room_usecase;

        if let Err(e) = join.authorize(&room, &user).await {
            tracing::info!("'{}' was denied room '{}'", user, room);
            self.app
                .broadcaster
                .to_connection(
                    &self.connection,
                    &ServerEvent::JoinDenied {
                        room: room.clone(),
                        reason: e.to_string(),
                    },
                )
                .await;
            return Err(e.into());
        }

        let rejoin = matches!(
            &self.state,
            SessionState::Joined { user: u, room: r } if u == &user && r == &room
        );
        if !rejoin {
            let previous = std::mem::replace(&mut self.state, SessionState::Unbound);
            if let SessionState::Joined { user: prev_user, room: prev_room } = previous {
                if let Err(e) = self
                    .app
                    .leave_room_usecase
                    .execute(&self.connection, &prev_user, &prev_room)
                    .await
                {
                    tracing::warn!("Leaving room '{}' failed: {}", prev_room, e);
                }
            }
        }

        join.execute(self.connection, &user, &room).await?;
        self.state = SessionState::Joined { user, room };
        Ok(())
    }

    async fn send(
        &self,
        user: &UserId,
        room: &RoomId,
        body: MessageBody,
        reply_to: Option<&MessageId>,
    ) -> Result<(), SessionError> {
        self.app
            .send_message_usecase
            .execute(user, room, body, reply_to)
            .await?;
        Ok(())
    }

    async fn typing(&self, user: &UserId, room: &RoomId, typing: Typing) {
        self.app
            .notify_typing_usecase
            .execute(&self.connection, user, room, typing)
            .await;
    }

    async fn report(&self, error: &SessionError) {
        // join:denied was already sent
        if matches!(error, SessionError::Join(JoinRoomError::AccessDenied(_))) {
            return;
        }
        tracing::warn!("Connection '{}': {}", self.connection, error);
        self.app
            .broadcaster
            .to_connection(
                &self.connection,
                &ServerEvent::Error {
                    message: error.to_string(),
                },
            )
            .await;
    }
}
