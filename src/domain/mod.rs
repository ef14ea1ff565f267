//! Domain layer containing the rules of scrim rooms.
//!
//! # Module Organization
//!
//! - `foundation` - Shared primitives (IDs, timestamps, auth, error codes)
//! - `room` - Room aggregate, draft engine and error taxonomy
//! - `chat` - Chat messages and channel visibility
//! - `presence` - Ephemeral connection sessions and voice channels

pub mod chat;
pub mod foundation;
pub mod presence;
pub mod room;
