//! EndGameHandler - close the match.

use std::sync::Arc;

use serde_json::json;

use crate::domain::room::{DraftEngine, RoomError};

use super::context::{Actor, RoomContext};
use crate::application::protocol::{PushKind, RoomView};

#[derive(Debug, Clone)]
pub struct EndGameResult {
    pub room: RoomView,
}

pub struct EndGameHandler {
    ctx: Arc<RoomContext>,
}

impl EndGameHandler {
    pub fn new(ctx: Arc<RoomContext>) -> Self {
        Self { ctx }
    }

    pub async fn handle(&self, actor: &Actor) -> Result<EndGameResult, RoomError> {
        let locked = self.ctx.lock_current(actor).await?;
        let mut room = locked.room.clone();
        DraftEngine::end_game(&mut room, &actor.user.id)?;

        self.ctx.rooms.save(&room).await?;
        self.ctx.sync(&room).await;

        self.ctx.chat.announce(room.id(), "The game has ended").await;
        self.ctx
            .broadcaster
            .notify_room(
                room.id(),
                PushKind::GameEnded,
                json!({ "endedAt": room.ended_at() }),
                None,
            )
            .await;
        let view = self.ctx.publish_update(&room).await;

        tracing::info!(room_id = %room.id(), "Game ended");
        Ok(EndGameResult { room: view })
    }
}
