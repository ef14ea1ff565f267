//! CreateRoomHandler - opens a room with the caller seated as creator.

use std::sync::Arc;

use crate::domain::room::{Room, RoomError, RoomParams};
use crate::ports::{RoomListChange, RoomSummary};

use super::context::{Actor, RoomContext};
use crate::application::protocol::RoomSnapshot;

#[derive(Debug, Clone)]
pub struct CreateRoomCommand {
    pub params: RoomParams,
}

#[derive(Debug, Clone)]
pub struct CreateRoomResult {
    pub snapshot: RoomSnapshot,
}

pub struct CreateRoomHandler {
    ctx: Arc<RoomContext>,
}

impl CreateRoomHandler {
    pub fn new(ctx: Arc<RoomContext>) -> Self {
        Self { ctx }
    }

    pub async fn handle(
        &self,
        actor: &Actor,
        cmd: CreateRoomCommand,
    ) -> Result<CreateRoomResult, RoomError> {
        let room = Room::create(actor.user.id.clone(), cmd.params)?;
        self.ctx.rooms.create(&room).await?;

        let _guard = self.ctx.locks.lock(room.id()).await;
        self.ctx.remember(&actor.user).await;
        self.ctx
            .chat
            .announce(
                room.id(),
                format!("{} created the room", actor.user.display_name),
            )
            .await;
        let session = self.ctx.attach(actor, &room).await?;
        self.ctx
            .notify_room_list(RoomListChange::Created(RoomSummary::from(&room)))
            .await;

        tracing::info!(
            room_id = %room.id(),
            user_id = %actor.user.id,
            pick_mode = %room.pick_mode(),
            player_count = room.player_count(),
            "Room created"
        );

        let snapshot = self.ctx.snapshot(&room, &session).await?;
        Ok(CreateRoomResult { snapshot })
    }
}
