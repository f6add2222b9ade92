//! UI layer: WebSocket and HTTP transport.

mod handler;
mod server;
pub mod session;
mod signal;
pub mod state;

pub use server::Server;
pub use session::{RoomSession, SessionState};
pub use state::{AppDependencies, AppState};
