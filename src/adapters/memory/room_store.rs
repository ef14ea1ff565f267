//! In-memory room store.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::foundation::RoomId;
use crate::domain::room::{Room, RoomError};
use crate::ports::RoomStore;

/// Rooms keyed by id, stored as whole documents.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRoomStore {
    rooms: Arc<RwLock<HashMap<RoomId, Room>>>,
}

impl InMemoryRoomStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored rooms.
    pub async fn len(&self) -> usize {
        self.rooms.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rooms.read().await.is_empty()
    }
}

#[async_trait]
impl RoomStore for InMemoryRoomStore {
    async fn create(&self, room: &Room) -> Result<(), RoomError> {
        let mut rooms = self.rooms.write().await;
        if rooms.contains_key(room.id()) {
            return Err(RoomError::conflict(format!("Room {} already exists", room.id())));
        }
        rooms.insert(*room.id(), room.clone());
        Ok(())
    }

    async fn find(&self, id: &RoomId) -> Result<Option<Room>, RoomError> {
        Ok(self.rooms.read().await.get(id).cloned())
    }

    async fn save(&self, room: &Room) -> Result<(), RoomError> {
        let mut rooms = self.rooms.write().await;
        match rooms.get_mut(room.id()) {
            Some(stored) => {
                *stored = room.clone();
                Ok(())
            }
            None => Err(RoomError::not_found("Room")),
        }
    }

    async fn delete(&self, id: &RoomId) -> Result<(), RoomError> {
        self.rooms.write().await.remove(id);
        Ok(())
    }
}
