//! Live-connection services: presence, fan-out, chat and voice routing.
//!
//! These hold only ephemeral state. The durable room is always mutated
//! and saved first; the registry is then re-synced from it.

mod broadcaster;
mod chat_router;
mod registry;
mod room_locks;
mod voice;

pub use broadcaster::PresenceBroadcaster;
pub use chat_router::ChatRouter;
pub use registry::{Attachment, ConnectionRegistry, Outbox, SyncReport};
pub use room_locks::RoomLocks;
pub use voice::VoiceRouter;
