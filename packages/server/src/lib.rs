//! Tayori chat server library.
//!
//! Room-based chat over WebSocket with per-room presence and read receipts
//! reconciled from who is online when a message is sent or a user joins.

// layers
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;
