//! SelectSideHandler - a captain chooses blue or red.

use std::sync::Arc;

use serde_json::json;

use crate::domain::room::{DraftEngine, RoomError, Side, SideOutcome, TeamId};

use super::context::{Actor, RoomContext};
use crate::application::protocol::{PushKind, RoomView};

#[derive(Debug, Clone, Copy)]
pub struct SelectSideCommand {
    pub team_id: TeamId,
    pub side: Side,
}

#[derive(Debug, Clone)]
pub struct SelectSideResult {
    pub outcome: SideOutcome,
    pub room: RoomView,
}

pub struct SelectSideHandler {
    ctx: Arc<RoomContext>,
}

impl SelectSideHandler {
    pub fn new(ctx: Arc<RoomContext>) -> Self {
        Self { ctx }
    }

    pub async fn handle(&self, actor: &Actor, cmd: SelectSideCommand) -> Result<SelectSideResult, RoomError> {
        let locked = self.ctx.lock_current(actor).await?;
        let mut room = locked.room.clone();
        let outcome = DraftEngine::select_side(&mut room, &actor.user.id, cmd.team_id, cmd.side)?;

        self.ctx.rooms.save(&room).await?;
        self.ctx.sync(&room).await;

        self.ctx
            .chat
            .announce(
                room.id(),
                format!(
                    "{} takes the {} side",
                    room.team(outcome.team_id).name,
                    outcome.side
                ),
            )
            .await;
        self.ctx
            .broadcaster
            .notify_room(
                room.id(),
                PushKind::TeamSideSelected,
                json!({
                    "teamId": outcome.team_id,
                    "side": outcome.side,
                    "otherTeamId": outcome.team_id.other(),
                    "otherSide": outcome.other_side,
                    "status": outcome.status,
                }),
                None,
            )
            .await;
        let view = self.ctx.publish_update(&room).await;

        tracing::info!(
            room_id = %room.id(),
            team_id = %outcome.team_id,
            side = %outcome.side,
            status = %outcome.status,
            "Side selected"
        );
        Ok(SelectSideResult {
            outcome,
            room: view,
        })
    }
}
