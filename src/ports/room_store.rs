//! Room store port.
//!
//! Persists the durable room document. Saves are whole-document and
//! all-or-nothing; callers mutate a copy and save it only once every
//! validation has passed.

use async_trait::async_trait;

use crate::domain::foundation::RoomId;
use crate::domain::room::{Room, RoomError};

/// Repository port for the Room aggregate.
#[async_trait]
pub trait RoomStore: Send + Sync {
    /// Persist a newly created room.
    ///
    /// # Errors
    ///
    /// - `Conflict` if a room with the same id exists
    /// - `Infrastructure` on persistence failure
    async fn create(&self, room: &Room) -> Result<(), RoomError>;

    /// Load a room. Returns `None` if it does not exist.
    async fn find(&self, id: &RoomId) -> Result<Option<Room>, RoomError>;

    /// Replace the stored room.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the room was deleted meanwhile
    /// - `Infrastructure` on persistence failure
    async fn save(&self, room: &Room) -> Result<(), RoomError>;

    /// Remove a room. Deleting a missing room is not an error.
    async fn delete(&self, id: &RoomId) -> Result<(), RoomError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn room_store_is_object_safe() {
        fn _accepts_dyn(_store: &dyn RoomStore) {}
    }
}
