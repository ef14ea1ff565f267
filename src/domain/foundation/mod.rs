//! Foundation module - Shared domain primitives.
//!
//! Contains identifiers, timestamps, auth types and error vocabulary shared
//! by the room, chat and presence modules.

mod auth;
mod errors;
mod ids;
mod timestamp;

pub use auth::{AuthError, AuthenticatedUser};
pub use errors::{ErrorCode, ValidationError};
pub use ids::{ConnectionId, MessageId, RoomId, UserId};
pub use timestamp::Timestamp;
