//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the room engine to external systems:
//! - `auth` - JWT and mock bearer token resolution
//! - `memory` - process-local room, message and user stores
//! - `room_list` - room list change fan-out
//! - `websocket` - the live connection transport

pub mod auth;
pub mod memory;
pub mod room_list;
pub mod websocket;

pub use auth::{JwtAuthProvider, MockAuthProvider};
pub use memory::{InMemoryMessageStore, InMemoryRoomStore, InMemoryUserDirectory};
pub use room_list::{BroadcastRoomListNotifier, NoopRoomListNotifier};
pub use websocket::{websocket_router, WebSocketState};
