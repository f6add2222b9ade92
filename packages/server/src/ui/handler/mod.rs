mod http;
mod websocket;

pub use http::{get_last_seen, get_room_presence, get_rooms, health_check};
pub use websocket::websocket_handler;
