//! Ports - Interfaces for external collaborators.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the room engine and the outside world. Adapters implement these ports.
//!
//! - `RoomStore` - durable room documents
//! - `MessageStore` - append-only chat log
//! - `AuthProvider` - bearer credential to user resolution
//! - `UserDirectory` - usernames and avatars for presentation
//! - `RoomListNotifier` - best-effort room list change signal

mod auth_provider;
mod message_store;
mod room_list_notifier;
mod room_store;
mod user_directory;

pub use auth_provider::AuthProvider;
pub use message_store::MessageStore;
pub use room_list_notifier::{RoomListChange, RoomListNotifier, RoomSummary};
pub use room_store::RoomStore;
pub use user_directory::{UserDirectory, UserProfile};
