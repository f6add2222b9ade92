//! UseCase 層
//!
//! One struct per operation; each holds its dependencies as trait objects and
//! exposes an `execute` method. Read-state transitions are shared through
//! [`ReadStateReconciler`].

pub mod acknowledge_read;
pub mod broadcaster;
pub mod clear_history;
pub mod error;
pub mod get_rooms;
pub mod join_room;
pub mod last_seen;
pub mod leave_room;
pub mod read_state;
pub mod send_message;
pub mod typing;

#[cfg(test)]
pub(crate) mod test_support;

pub use acknowledge_read::AcknowledgeReadUseCase;
pub use broadcaster::EventBroadcaster;
pub use clear_history::ClearHistoryUseCase;
pub use error::{
    AcknowledgeReadError, ClearHistoryError, JoinRoomError, LastSeenError, LeaveRoomError,
    SendMessageError,
};
pub use get_rooms::{GetRoomsUseCase, RoomPresenceSummary};
pub use join_room::{DEFAULT_HISTORY_LIMIT, JoinRoomUseCase, JoinedRoom};
pub use last_seen::{GetLastSeenUseCase, LastSeen};
pub use leave_room::LeaveRoomUseCase;
pub use read_state::ReadStateReconciler;
pub use send_message::SendMessageUseCase;
pub use typing::{NotifyTypingUseCase, Typing};
