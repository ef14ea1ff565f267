//! GetSnapshotHandler - full state for the caller's room.

use std::sync::Arc;

use crate::domain::room::RoomError;

use super::context::{Actor, RoomContext};
use crate::application::protocol::RoomSnapshot;

pub struct GetSnapshotHandler {
    ctx: Arc<RoomContext>,
}

impl GetSnapshotHandler {
    pub fn new(ctx: Arc<RoomContext>) -> Self {
        Self { ctx }
    }

    pub async fn handle(&self, actor: &Actor) -> Result<RoomSnapshot, RoomError> {
        let session = self.ctx.current_session(actor).await?;
        let room = self.ctx.load(&session.room_id).await?;
        self.ctx.snapshot(&room, &session).await
    }
}
