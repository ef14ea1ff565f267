//! In-memory adapters.
//!
//! Process-local implementations of the storage and directory ports. They
//! back the default binary and every integration test.

mod message_store;
mod room_store;
mod user_directory;

pub use message_store::InMemoryMessageStore;
pub use room_store::InMemoryRoomStore;
pub use user_directory::InMemoryUserDirectory;
