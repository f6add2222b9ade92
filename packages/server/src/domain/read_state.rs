//! Read-state decisions, free of I/O.
//!
//! The use cases own persistence and broadcasting; these functions only decide
//! which transitions should happen.

use std::collections::BTreeSet;

use super::{Message, UserId};

/// Messages that become read when `reader` joins a room, oldest first.
///
/// Drops anything `reader` authored or has already read, so re-running a
/// catch-up over the same messages yields nothing.
pub fn plan_catch_up(candidates: Vec<Message>, reader: &UserId) -> Vec<Message> {
    let mut pending: Vec<Message> = candidates
        .into_iter()
        .filter(|m| &m.author != reader && !m.is_read_by(reader))
        .collect();
    pending.sort_by_key(|m| m.created_at);
    pending
}

/// Users who read a message instantly because they were online when it was sent.
pub fn instant_readers(online: &BTreeSet<UserId>, author: &UserId) -> BTreeSet<UserId> {
    online.iter().filter(|u| *u != author).cloned().collect()
}
