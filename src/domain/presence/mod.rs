//! Presence domain module.
//!
//! Ephemeral, per-connection state mirrored from the room aggregate. None of
//! it is persisted; it is rebuilt from the room on every join.

mod session;
mod voice_channel;

pub use crate::domain::room::MemberRole;
pub use session::ConnectionSession;
pub use voice_channel::VoiceChannel;
