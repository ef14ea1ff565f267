//! WebSocket transport for live room connections.
//!
//! # Architecture
//!
//! ```text
//! socket ──► reader task ──► RoomDispatcher ──► handlers
//!                                 │                 │
//!                                 ▼                 ▼ pushes
//!                               ack ──► outbox ◄── PresenceBroadcaster
//!                                         │
//! socket ◄── writer task ◄────────────────┘
//! ```
//!
//! Each connection owns one bounded outbox. Acknowledgments wait for
//! space; pushes are dropped when it is full.

pub mod handler;

pub use handler::{bearer_token, websocket_router, ws_handler, ConnectQuery, WebSocketState};
