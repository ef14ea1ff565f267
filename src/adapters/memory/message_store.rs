//! In-memory chat log.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::chat::ChatMessage;
use crate::domain::foundation::RoomId;
use crate::domain::room::RoomError;
use crate::ports::MessageStore;

/// Per-room message vectors in append order.
#[derive(Debug, Clone, Default)]
pub struct InMemoryMessageStore {
    messages: Arc<RwLock<HashMap<RoomId, Vec<ChatMessage>>>>,
}

impl InMemoryMessageStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every stored message of a room (test helper).
    pub async fn all(&self, room_id: &RoomId) -> Vec<ChatMessage> {
        self.messages
            .read()
            .await
            .get(room_id)
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl MessageStore for InMemoryMessageStore {
    async fn append(&self, message: &ChatMessage) -> Result<(), RoomError> {
        self.messages
            .write()
            .await
            .entry(message.room_id)
            .or_default()
            .push(message.clone());
        Ok(())
    }

    async fn recent(&self, room_id: &RoomId, limit: usize) -> Result<Vec<ChatMessage>, RoomError> {
        let messages = self.messages.read().await;
        let log = match messages.get(room_id) {
            Some(log) => log,
            None => return Ok(Vec::new()),
        };
        let start = log.len().saturating_sub(limit);
        Ok(log[start..].to_vec())
    }

    async fn purge(&self, room_id: &RoomId) -> Result<(), RoomError> {
        self.messages.write().await.remove(room_id);
        Ok(())
    }
}
