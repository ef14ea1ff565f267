//! SwitchRoleHandler - promote a spectator or demote a player.

use std::sync::Arc;

use serde_json::json;

use crate::domain::presence::MemberRole;
use crate::domain::room::RoomError;

use super::context::{Actor, RoomContext};
use crate::application::protocol::{PushKind, RoomView};

#[derive(Debug, Clone, Copy)]
pub struct SwitchRoleCommand {
    pub to: MemberRole,
}

#[derive(Debug, Clone)]
pub struct SwitchRoleResult {
    pub role: MemberRole,
    pub room: RoomView,
}

pub struct SwitchRoleHandler {
    ctx: Arc<RoomContext>,
}

impl SwitchRoleHandler {
    pub fn new(ctx: Arc<RoomContext>) -> Self {
        Self { ctx }
    }

    /// # Errors
    ///
    /// - `Phase` outside `waiting`
    /// - `Conflict` if the caller already holds the role
    /// - `Capacity` when promoting into a full roster
    pub async fn handle(&self, actor: &Actor, cmd: SwitchRoleCommand) -> Result<SwitchRoleResult, RoomError> {
        let locked = self.ctx.lock_current(actor).await?;
        let mut room = locked.room.clone();
        match cmd.to {
            MemberRole::Player => room.move_spectator_to_player(&actor.user.id)?,
            MemberRole::Spectator => room.move_player_to_spectator(&actor.user.id)?,
        }

        self.ctx.rooms.save(&room).await?;
        self.ctx.sync(&room).await;

        self.ctx
            .chat
            .announce(
                room.id(),
                format!("{} is now a {}", actor.user.display_name, cmd.to),
            )
            .await;
        self.ctx
            .broadcaster
            .notify_room(
                room.id(),
                PushKind::MemberRoleChanged,
                json!({ "userId": actor.user.id, "role": cmd.to }),
                None,
            )
            .await;
        let view = self.ctx.publish_update(&room).await;

        tracing::info!(room_id = %room.id(), user_id = %actor.user.id, role = %cmd.to, "Role switched");
        Ok(SwitchRoleResult {
            role: cmd.to,
            room: view,
        })
    }
}
