//! JoinRoomHandler - first join and reconnection.
//!
//! A user who is already a member reattaches without a password check and
//! without touching the durable room. Anyone else must pass the password
//! gate and enters as a spectator.

use std::sync::Arc;

use crate::domain::foundation::RoomId;
use crate::domain::room::RoomError;
use crate::ports::{RoomListChange, RoomSummary};

use super::context::{to_json, Actor, RoomContext};
use crate::application::protocol::{MemberView, PushKind, RoomSnapshot};

#[derive(Debug, Clone)]
pub struct JoinRoomCommand {
    pub room_id: RoomId,
    pub password: Option<String>,
}

#[derive(Debug, Clone)]
pub struct JoinRoomResult {
    pub snapshot: RoomSnapshot,
    /// The user was already a member.
    pub reconnected: bool,
}

pub struct JoinRoomHandler {
    ctx: Arc<RoomContext>,
}

impl JoinRoomHandler {
    pub fn new(ctx: Arc<RoomContext>) -> Self {
        Self { ctx }
    }

    /// # Errors
    ///
    /// - `NotFound` if the room does not exist
    /// - `Forbidden` if a newcomer supplies the wrong password
    pub async fn handle(&self, actor: &Actor, cmd: JoinRoomCommand) -> Result<JoinRoomResult, RoomError> {
        let locked = self.ctx.lock_room(&cmd.room_id).await?;
        let mut room = locked.room.clone();
        let user_id = &actor.user.id;

        let reconnected = room.is_member(user_id);
        if !reconnected {
            room.verify_password(cmd.password.as_deref())?;
            let mut updated = room.clone();
            updated.add_spectator(user_id.clone())?;
            self.ctx.rooms.save(&updated).await?;
            room = updated;
        }

        self.ctx.remember(&actor.user).await;
        if !reconnected {
            self.ctx
                .chat
                .announce(
                    room.id(),
                    format!("{} joined the room", actor.user.display_name),
                )
                .await;
        }

        let session = self.ctx.attach(actor, &room).await?;

        let kind = if reconnected {
            PushKind::MemberReconnected
        } else {
            PushKind::MemberJoined
        };
        let member = MemberView::of(&room, user_id, actor.user.display_name.clone());
        self.ctx
            .broadcaster
            .notify_room(room.id(), kind, to_json(&member)?, Some(user_id))
            .await;
        if !reconnected {
            self.ctx
                .notify_room_list(RoomListChange::Updated(RoomSummary::from(&room)))
                .await;
        }

        tracing::info!(
            room_id = %room.id(),
            user_id = %user_id,
            connection_id = %actor.connection_id,
            reconnected,
            "Member attached"
        );

        let snapshot = self.ctx.snapshot(&room, &session).await?;
        Ok(JoinRoomResult {
            snapshot,
            reconnected,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::{InMemoryMessageStore, InMemoryRoomStore, InMemoryUserDirectory};
    use crate::adapters::room_list::NoopRoomListNotifier;
    use crate::application::handlers::room::RoomSettings;
    use crate::domain::foundation::{AuthenticatedUser, ConnectionId, UserId};
    use tokio::sync::mpsc;

    #[tokio::test]
    async fn unknown_rooms_leave_no_lock_entries() {
        let ctx = Arc::new(RoomContext::new(
            Arc::new(InMemoryRoomStore::new()),
            Arc::new(InMemoryMessageStore::new()),
            Arc::new(InMemoryUserDirectory::new()),
            Arc::new(NoopRoomListNotifier),
            RoomSettings::default(),
        ));
        let user = AuthenticatedUser::new(UserId::new("mallory").unwrap(), "Mallory");
        let (tx, _rx) = mpsc::channel(8);
        let connection_id = ConnectionId::new();
        ctx.registry().register(connection_id, user.clone(), tx).await;
        let actor = Actor {
            connection_id,
            user,
        };
        let handler = JoinRoomHandler::new(ctx.clone());

        for _ in 0..50 {
            let err = handler
                .handle(
                    &actor,
                    JoinRoomCommand {
                        room_id: RoomId::new(),
                        password: None,
                    },
                )
                .await
                .unwrap_err();
            assert!(matches!(err, RoomError::NotFound(_)));
        }
        assert_eq!(ctx.locks.len().await, 0);
    }
}
