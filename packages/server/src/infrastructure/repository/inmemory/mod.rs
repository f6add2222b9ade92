//! In-memory stores standing in for the document database.

mod message;
mod user;

pub use message::{InMemoryMessageRepository, MessageDocument, ReplyDocument};
pub use user::InMemoryUserRepository;
