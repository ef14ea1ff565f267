//! Room list notifier port.
//!
//! Best-effort signal for room-listing views outside this service. Failures
//! are logged by callers and never fail the triggering operation.

use async_trait::async_trait;
use serde::Serialize;

use crate::domain::foundation::RoomId;
use crate::domain::room::{PickMode, Room, RoomError, RoomStatus};

/// What a room list needs to render one entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSummary {
    pub id: RoomId,
    pub name: String,
    pub status: RoomStatus,
    pub pick_mode: PickMode,
    pub player_count: u8,
    pub players: usize,
    pub spectators: usize,
    pub has_password: bool,
}

impl From<&Room> for RoomSummary {
    fn from(room: &Room) -> Self {
        Self {
            id: *room.id(),
            name: room.name().to_string(),
            status: room.status(),
            pick_mode: room.pick_mode(),
            player_count: room.player_count(),
            players: room.players().len(),
            spectators: room.spectators().len(),
            has_password: room.has_password(),
        }
    }
}

/// A change to the set of rooms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", content = "room", rename_all = "lowercase")]
pub enum RoomListChange {
    Created(RoomSummary),
    Updated(RoomSummary),
    Deleted(RoomId),
}

#[async_trait]
pub trait RoomListNotifier: Send + Sync {
    async fn notify(&self, change: RoomListChange) -> Result<(), RoomError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deleted_change_serializes_with_action_tag() {
        let id = RoomId::new();
        let json = serde_json::to_value(RoomListChange::Deleted(id)).unwrap();
        assert_eq!(json["action"], "deleted");
        assert_eq!(json["room"], id.to_string());
    }
}
