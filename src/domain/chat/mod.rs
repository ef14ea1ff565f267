//! Chat domain module.
//!
//! Messages are either public (everyone in the room) or scoped to one team.
//! Team messages are also visible to spectators, never to the other team.

mod message;

pub use message::{ChatChannel, ChatMessage, MessageKind, DEFAULT_MAX_MESSAGE_LENGTH};
