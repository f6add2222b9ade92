//! Infrastructure layer: store implementations, the WebSocket pusher, the
//! access policy and the wire DTOs.

pub mod access;
pub mod dto;
pub mod message_pusher;
pub mod repository;
