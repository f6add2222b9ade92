//! Domain layer: entities, value objects, the presence registry and the
//! interfaces (traits) the outer layers implement.

pub mod access;
pub mod entity;
pub mod error;
pub mod event;
pub mod presence;
pub mod pusher;
pub mod read_state;
pub mod repository;
pub mod value_object;

pub use access::RoomAccessPolicy;
pub use entity::{Message, MessageStatus, ReplySnapshot, UserPresenceRecord};
pub use error::{MessagePushError, RepositoryError, ValueObjectError};
pub use event::{ClientCommand, ServerEvent};
pub use presence::{Departure, PresenceRegistry, RoomGuard};
pub use pusher::{MessagePusher, PusherChannel};
pub use repository::{MessageRepository, SortOrder, UserRepository};
pub use value_object::{ConnectionId, MessageBody, MessageId, RoomId, Timestamp, UserId};

#[cfg(test)]
pub use repository::{MockMessageRepository, MockUserRepository};
