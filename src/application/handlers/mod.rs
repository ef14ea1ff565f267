//! Application handlers.
//!
//! Command handlers that orchestrate room operations, one per client event.

pub mod room;

pub use room::{Actor, RoomContext, RoomSettings};
