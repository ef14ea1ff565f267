//! Application layer - protocol, live-connection services and handlers.
//!
//! This layer orchestrates domain operations and coordinates between ports.
//! It is transport-agnostic: the WebSocket adapter feeds it envelopes and
//! drains per-connection outboxes.

mod dispatcher;
pub mod handlers;
pub mod protocol;
pub mod realtime;

pub use dispatcher::RoomDispatcher;
