//! StartDraftHandler - run team assignment for the room's pick mode.

use std::sync::Arc;

use serde_json::json;

use crate::domain::room::{DraftEngine, RoomError};

use super::context::{Actor, RoomContext};
use crate::application::protocol::{PushKind, RoomView};

#[derive(Debug, Clone)]
pub struct StartDraftResult {
    pub room: RoomView,
}

pub struct StartDraftHandler {
    ctx: Arc<RoomContext>,
}

impl StartDraftHandler {
    pub fn new(ctx: Arc<RoomContext>) -> Self {
        Self { ctx }
    }

    /// # Errors
    ///
    /// - `Forbidden` unless the caller is the creator
    /// - `Phase` outside `waiting`
    /// - `Validation` if the roster is not full
    pub async fn handle(&self, actor: &Actor) -> Result<StartDraftResult, RoomError> {
        let locked = self.ctx.lock_current(actor).await?;
        let mut room = locked.room.clone();
        {
            let mut rng = rand::thread_rng();
            DraftEngine::start(&mut room, &actor.user.id, &mut rng)?;
        }

        self.ctx.rooms.save(&room).await?;
        self.ctx.sync(&room).await;

        let announcement = if room.pick_mode().is_sequential() {
            "Draft started. Captains pick in turn".to_string()
        } else {
            "Teams were assigned at random".to_string()
        };
        self.ctx.chat.announce(room.id(), announcement).await;
        self.ctx
            .broadcaster
            .notify_room(
                room.id(),
                PushKind::DraftStarted,
                json!({
                    "pickMode": room.pick_mode(),
                    "status": room.status(),
                    "teams": room.teams(),
                    "nextTeamPick": room.next_team_pick(),
                    "pickOrder": room.pick_order(),
                }),
                None,
            )
            .await;
        let view = self.ctx.publish_update(&room).await;

        tracing::info!(
            room_id = %room.id(),
            pick_mode = %room.pick_mode(),
            status = %room.status(),
            "Draft started"
        );
        Ok(StartDraftResult { room: view })
    }
}
