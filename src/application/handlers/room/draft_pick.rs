//! DraftPickHandler - a captain drafts an unassigned player.

use std::sync::Arc;

use serde_json::json;

use crate::domain::foundation::UserId;
use crate::domain::room::{DraftEngine, PickOutcome, RoomError, TeamId};

use super::context::{Actor, RoomContext};
use crate::application::protocol::{PushKind, RoomView};

#[derive(Debug, Clone)]
pub struct DraftPickCommand {
    pub team_id: TeamId,
    pub target_user_id: UserId,
}

#[derive(Debug, Clone)]
pub struct DraftPickResult {
    pub outcome: PickOutcome,
    pub room: RoomView,
}

pub struct DraftPickHandler {
    ctx: Arc<RoomContext>,
}

impl DraftPickHandler {
    pub fn new(ctx: Arc<RoomContext>) -> Self {
        Self { ctx }
    }

    /// Picks are serialized per room, so two captains racing for the same
    /// turn see each other's result.
    ///
    /// # Errors
    ///
    /// - `Phase` outside `picking`
    /// - `TurnOrder` if it is the other team's pick
    /// - `Forbidden` if the caller does not captain `team_id`
    /// - `Conflict` if the target already has a team
    pub async fn handle(&self, actor: &Actor, cmd: DraftPickCommand) -> Result<DraftPickResult, RoomError> {
        let locked = self.ctx.lock_current(actor).await?;
        let mut room = locked.room.clone();
        let outcome = DraftEngine::captain_select_player(
            &mut room,
            &actor.user.id,
            cmd.team_id,
            &cmd.target_user_id,
        )?;

        self.ctx.rooms.save(&room).await?;
        self.ctx.sync(&room).await;

        let name = self.ctx.display_name(&outcome.assigned).await;
        self.ctx
            .chat
            .announce(
                room.id(),
                format!("{} joined {}", name, room.team(outcome.team_id).name),
            )
            .await;
        self.ctx
            .broadcaster
            .notify_room(
                room.id(),
                PushKind::DraftPicked,
                json!({
                    "userId": outcome.assigned,
                    "teamId": outcome.team_id,
                    "nextTeamPick": outcome.next_team,
                    "remainingUnassigned": outcome.remaining_unassigned,
                    "terminal": outcome.terminal,
                    "status": room.status(),
                }),
                None,
            )
            .await;
        let view = self.ctx.publish_update(&room).await;

        tracing::info!(
            room_id = %room.id(),
            captain = %actor.user.id,
            picked = %outcome.assigned,
            team_id = %outcome.team_id,
            terminal = outcome.terminal,
            "Player drafted"
        );
        Ok(DraftPickResult {
            outcome,
            room: view,
        })
    }
}
