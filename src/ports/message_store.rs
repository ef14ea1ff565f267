//! Message store port.

use async_trait::async_trait;

use crate::domain::chat::ChatMessage;
use crate::domain::foundation::RoomId;
use crate::domain::room::RoomError;

/// Append-only chat log.
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Append a message, user or system.
    async fn append(&self, message: &ChatMessage) -> Result<(), RoomError>;

    /// The last `limit` messages of a room, oldest first.
    async fn recent(&self, room_id: &RoomId, limit: usize) -> Result<Vec<ChatMessage>, RoomError>;

    /// Drop a room's log when the room is deleted.
    async fn purge(&self, room_id: &RoomId) -> Result<(), RoomError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_store_is_object_safe() {
        fn _accepts_dyn(_store: &dyn MessageStore) {}
    }
}
