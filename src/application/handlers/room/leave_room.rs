//! LeaveRoomHandler and KickMemberHandler - durable removal of a member.

use std::sync::Arc;

use serde_json::json;

use crate::domain::foundation::{RoomId, UserId};
use crate::domain::room::{Removal, Room, RoomError};

use super::context::{Actor, RoomContext};
use crate::application::protocol::PushKind;

#[derive(Debug, Clone)]
pub struct LeaveRoomResult {
    pub room_id: RoomId,
    pub removal: Removal,
    /// The leaver was the last member.
    pub room_deleted: bool,
}

pub struct LeaveRoomHandler {
    ctx: Arc<RoomContext>,
}

impl LeaveRoomHandler {
    pub fn new(ctx: Arc<RoomContext>) -> Self {
        Self { ctx }
    }

    /// # Errors
    ///
    /// - `Validation` if the connection is not in a room
    /// - `Phase` if a player leaves during the draft or match
    pub async fn handle(&self, actor: &Actor) -> Result<LeaveRoomResult, RoomError> {
        let locked = self.ctx.lock_current(actor).await?;
        let mut room = locked.room.clone();
        let removal = room.leave(&actor.user.id)?;

        let room_deleted = apply_removal(&self.ctx, &room, &removal, PushKind::MemberLeft).await?;
        tracing::info!(
            room_id = %room.id(),
            user_id = %actor.user.id,
            role = %removal.role,
            room_deleted,
            "Member left"
        );
        Ok(LeaveRoomResult {
            room_id: *room.id(),
            removal,
            room_deleted,
        })
    }
}

#[derive(Debug, Clone)]
pub struct KickMemberCommand {
    pub target_user_id: UserId,
}

#[derive(Debug, Clone)]
pub struct KickMemberResult {
    pub removal: Removal,
}

pub struct KickMemberHandler {
    ctx: Arc<RoomContext>,
}

impl KickMemberHandler {
    pub fn new(ctx: Arc<RoomContext>) -> Self {
        Self { ctx }
    }

    /// # Errors
    ///
    /// - `Forbidden` unless the caller is the creator
    /// - `Validation` when kicking oneself
    /// - `NotFound` if the target is not a member
    /// - `Phase` for players outside `waiting`
    pub async fn handle(&self, actor: &Actor, cmd: KickMemberCommand) -> Result<KickMemberResult, RoomError> {
        let locked = self.ctx.lock_current(actor).await?;
        let mut room = locked.room.clone();
        let removal = room.kick(&actor.user.id, &cmd.target_user_id)?;

        apply_removal(&self.ctx, &room, &removal, PushKind::MemberKicked).await?;
        self.ctx
            .broadcaster
            .notify_user(
                &cmd.target_user_id,
                PushKind::MemberKicked,
                Some(*room.id()),
                json!({ "roomId": room.id(), "userId": cmd.target_user_id, "by": actor.user.id }),
            )
            .await;

        tracing::info!(
            room_id = %room.id(),
            user_id = %actor.user.id,
            target = %cmd.target_user_id,
            "Member kicked"
        );
        Ok(KickMemberResult { removal })
    }
}

/// Persist a removal and tell the room. Returns true if the room was deleted.
async fn apply_removal(
    ctx: &RoomContext,
    room: &Room,
    removal: &Removal,
    kind: PushKind,
) -> Result<bool, RoomError> {
    if removal.is_empty {
        ctx.delete_room(room.id()).await?;
        return Ok(true);
    }

    ctx.rooms.save(room).await?;
    ctx.sync(room).await;

    let name = ctx.display_name(&removal.user_id).await;
    let verb = match kind {
        PushKind::MemberKicked => "was removed from",
        _ => "left",
    };
    ctx.chat
        .announce(room.id(), format!("{} {} the room", name, verb))
        .await;
    ctx.broadcaster
        .notify_room(
            room.id(),
            kind,
            json!({
                "userId": removal.user_id,
                "role": removal.role,
                "teamId": removal.team_id,
                "wasCreator": removal.was_creator,
                "newCreator": removal.new_creator,
            }),
            None,
        )
        .await;

    let view = ctx.view(room).await;
    if let Some(new_creator) = &removal.new_creator {
        ctx.broadcaster
            .notify_room(
                room.id(),
                PushKind::RoomOwnerChanged,
                json!({
                    "previousCreator": removal.user_id,
                    "newCreator": new_creator,
                    "room": view,
                }),
                None,
            )
            .await;
        tracing::info!(room_id = %room.id(), new_creator = %new_creator, "Ownership transferred");
    }
    ctx.publish_update(room).await;
    Ok(false)
}
