//! RoomDispatcher - routes parsed client events to handlers.
//!
//! The dispatcher is transport-agnostic: it takes an envelope from a known
//! connection and returns the acknowledgment. Pushes to other connections
//! flow through the registry outboxes as a side effect.

use std::sync::Arc;

use serde_json::{json, Value};

use crate::domain::foundation::{AuthenticatedUser, ConnectionId};
use crate::domain::presence::MemberRole;
use crate::domain::room::RoomError;

use super::handlers::room::{
    Actor, CreateRoomCommand, CreateRoomHandler, DisconnectHandler, DraftPickCommand,
    DraftPickHandler, EndGameHandler, GetSnapshotHandler, JoinRoomCommand, JoinRoomHandler,
    KickMemberCommand, KickMemberHandler, LeaveRoomHandler, RoomContext, SelectSideCommand,
    SelectSideHandler, SendMessageCommand, SendMessageHandler, StartDraftHandler,
    SwitchRoleCommand, SwitchRoleHandler, VoiceHandler,
};
use super::protocol::{Ack, ClientEnvelope, ClientEvent};
use super::realtime::{ConnectionRegistry, Outbox};

/// Entry point for every client event.
pub struct RoomDispatcher {
    ctx: Arc<RoomContext>,
    create_room: CreateRoomHandler,
    join_room: JoinRoomHandler,
    leave_room: LeaveRoomHandler,
    kick_member: KickMemberHandler,
    switch_role: SwitchRoleHandler,
    start_draft: StartDraftHandler,
    draft_pick: DraftPickHandler,
    select_side: SelectSideHandler,
    end_game: EndGameHandler,
    send_message: SendMessageHandler,
    voice: VoiceHandler,
    snapshot: GetSnapshotHandler,
    disconnect: DisconnectHandler,
}

impl RoomDispatcher {
    pub fn new(ctx: Arc<RoomContext>) -> Self {
        Self {
            create_room: CreateRoomHandler::new(ctx.clone()),
            join_room: JoinRoomHandler::new(ctx.clone()),
            leave_room: LeaveRoomHandler::new(ctx.clone()),
            kick_member: KickMemberHandler::new(ctx.clone()),
            switch_role: SwitchRoleHandler::new(ctx.clone()),
            start_draft: StartDraftHandler::new(ctx.clone()),
            draft_pick: DraftPickHandler::new(ctx.clone()),
            select_side: SelectSideHandler::new(ctx.clone()),
            end_game: EndGameHandler::new(ctx.clone()),
            send_message: SendMessageHandler::new(ctx.clone()),
            voice: VoiceHandler::new(ctx.clone()),
            snapshot: GetSnapshotHandler::new(ctx.clone()),
            disconnect: DisconnectHandler::new(ctx.clone()),
            ctx,
        }
    }

    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        self.ctx.registry()
    }

    /// Register an authenticated connection. It is not in any room yet.
    pub async fn connect(&self, user: AuthenticatedUser, outbox: Outbox) -> ConnectionId {
        let connection_id = ConnectionId::new();
        tracing::debug!(connection_id = %connection_id, user_id = %user.id, "Connection registered");
        self.ctx.registry().register(connection_id, user, outbox).await;
        connection_id
    }

    /// Drop a closed connection from every routing table.
    pub async fn disconnect(&self, connection_id: &ConnectionId) {
        self.disconnect.handle(connection_id).await;
    }

    /// Parse and dispatch one text frame.
    pub async fn dispatch_text(&self, connection_id: &ConnectionId, text: &str) -> Ack {
        match ClientEnvelope::from_json(text) {
            Ok(envelope) => self.dispatch(connection_id, envelope).await,
            Err(err) => {
                tracing::warn!(connection_id = %connection_id, error = %err, "Malformed frame");
                Ack::failure("unknown", None, &RoomError::from(err))
            }
        }
    }

    pub async fn dispatch(&self, connection_id: &ConnectionId, envelope: ClientEnvelope) -> Ack {
        let ClientEnvelope {
            request_id, event, ..
        } = &envelope;

        let Some(user) = self.ctx.registry().user(connection_id).await else {
            return Ack::failure(
                event.as_str(),
                request_id.clone(),
                &RoomError::Unauthorized("Connection is not registered".into()),
            );
        };

        let parsed = match envelope.parse() {
            Ok(parsed) => parsed,
            Err(err) => {
                tracing::warn!(
                    connection_id = %connection_id,
                    event = %event,
                    error = %err,
                    "Rejected malformed payload"
                );
                return Ack::failure(event.as_str(), request_id.clone(), &RoomError::from(err));
            }
        };

        let actor = Actor {
            connection_id: *connection_id,
            user,
        };
        match self.execute(&actor, parsed).await {
            Ok((data, message)) => Ack::success(event.as_str(), request_id.clone(), data, message),
            Err(err) => {
                match &err {
                    RoomError::Infrastructure(_) => tracing::error!(
                        connection_id = %connection_id,
                        user_id = %actor.user.id,
                        event = %event,
                        error = %err,
                        "Event failed"
                    ),
                    _ => tracing::debug!(
                        connection_id = %connection_id,
                        user_id = %actor.user.id,
                        event = %event,
                        error = %err,
                        "Event rejected"
                    ),
                }
                Ack::failure(event.as_str(), request_id.clone(), &err)
            }
        }
    }

    async fn execute(&self, actor: &Actor, event: ClientEvent) -> Result<(Value, String), RoomError> {
        let reply = match event {
            ClientEvent::CreateRoom(params) => {
                let result = self
                    .create_room
                    .handle(actor, CreateRoomCommand { params })
                    .await?;
                (to_value(&result.snapshot)?, "Room created")
            }
            ClientEvent::Join(payload) => {
                let result = self
                    .join_room
                    .handle(
                        actor,
                        JoinRoomCommand {
                            room_id: payload.room_id,
                            password: payload.password,
                        },
                    )
                    .await?;
                let message = if result.reconnected {
                    "Reconnected to room"
                } else {
                    "Joined room"
                };
                (
                    json!({ "reconnected": result.reconnected, "snapshot": to_value(&result.snapshot)? }),
                    message,
                )
            }
            ClientEvent::Leave {} => {
                let result = self.leave_room.handle(actor).await?;
                (
                    json!({ "roomId": result.room_id, "roomDeleted": result.room_deleted }),
                    "Left room",
                )
            }
            ClientEvent::SwitchToPlayer {} => {
                let result = self
                    .switch_role
                    .handle(actor, SwitchRoleCommand { to: MemberRole::Player })
                    .await?;
                (json!({ "role": result.role, "room": to_value(&result.room)? }), "Switched to player")
            }
            ClientEvent::SwitchToSpectator {} => {
                let result = self
                    .switch_role
                    .handle(actor, SwitchRoleCommand { to: MemberRole::Spectator })
                    .await?;
                (json!({ "role": result.role, "room": to_value(&result.room)? }), "Switched to spectator")
            }
            ClientEvent::StartDraft {} => {
                let result = self.start_draft.handle(actor).await?;
                (to_value(&result.room)?, "Draft started")
            }
            ClientEvent::DraftPick(payload) => {
                let result = self
                    .draft_pick
                    .handle(
                        actor,
                        DraftPickCommand {
                            team_id: payload.team_id,
                            target_user_id: payload.target_user_id,
                        },
                    )
                    .await?;
                let outcome = &result.outcome;
                (
                    json!({
                        "assignedPlayer": outcome.assigned,
                        "teamId": outcome.team_id,
                        "nextTeam": outcome.next_team,
                        "remainingUnassigned": outcome.remaining_unassigned,
                        "terminal": outcome.terminal,
                        "room": to_value(&result.room)?,
                    }),
                    "Player drafted",
                )
            }
            ClientEvent::SelectSide(payload) => {
                let result = self
                    .select_side
                    .handle(
                        actor,
                        SelectSideCommand {
                            team_id: payload.team_id,
                            side: payload.side,
                        },
                    )
                    .await?;
                let outcome = &result.outcome;
                (
                    json!({
                        "teamId": outcome.team_id,
                        "side": outcome.side,
                        "otherSide": outcome.other_side,
                        "status": outcome.status,
                        "room": to_value(&result.room)?,
                    }),
                    "Side selected",
                )
            }
            ClientEvent::EndGame {} => {
                let result = self.end_game.handle(actor).await?;
                (to_value(&result.room)?, "Game ended")
            }
            ClientEvent::SendMessage(payload) => {
                let message = self
                    .send_message
                    .handle(
                        actor,
                        SendMessageCommand {
                            content: payload.content,
                            channel: payload.channel,
                            team_id: payload.team_id,
                        },
                    )
                    .await?;
                (to_value(&message)?, "Message sent")
            }
            ClientEvent::VoiceChannelJoin(payload) => {
                let session = self.voice.join(actor, payload.channel).await?;
                (
                    json!({ "channel": session.voice_channel, "muted": session.muted }),
                    "Joined voice channel",
                )
            }
            ClientEvent::VoiceChannelLeave {} => {
                let session = self.voice.leave(actor).await?;
                (json!({ "channel": session.voice_channel }), "Left voice channel")
            }
            ClientEvent::VoiceData(payload) => {
                let delivered = self.voice.relay(actor, payload.payload).await?;
                (json!({ "delivered": delivered }), "Voice data relayed")
            }
            ClientEvent::Mute(payload) => {
                let session = self.voice.mute(actor, payload.muted).await?;
                (json!({ "muted": session.muted }), "Mute updated")
            }
            ClientEvent::Kick(payload) => {
                let result = self
                    .kick_member
                    .handle(
                        actor,
                        KickMemberCommand {
                            target_user_id: payload.target_user_id,
                        },
                    )
                    .await?;
                (
                    json!({ "userId": result.removal.user_id, "role": result.removal.role }),
                    "Member kicked",
                )
            }
            ClientEvent::GetRoomSnapshot {} => {
                let snapshot = self.snapshot.handle(actor).await?;
                (to_value(&snapshot)?, "Room snapshot")
            }
        };
        Ok((reply.0, reply.1.to_string()))
    }
}

fn to_value<T: serde::Serialize>(value: &T) -> Result<Value, RoomError> {
    serde_json::to_value(value).map_err(|e| RoomError::infrastructure(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::{InMemoryMessageStore, InMemoryRoomStore, InMemoryUserDirectory};
    use crate::adapters::room_list::NoopRoomListNotifier;
    use crate::application::handlers::room::RoomSettings;
    use crate::application::protocol::ServerMessage;
    use crate::domain::foundation::{ErrorCode, UserId};
    use tokio::sync::mpsc;

    fn dispatcher() -> RoomDispatcher {
        let ctx = RoomContext::new(
            Arc::new(InMemoryRoomStore::new()),
            Arc::new(InMemoryMessageStore::new()),
            Arc::new(InMemoryUserDirectory::new()),
            Arc::new(NoopRoomListNotifier),
            RoomSettings::default(),
        );
        RoomDispatcher::new(Arc::new(ctx))
    }

    async fn connect(d: &RoomDispatcher, user: &str) -> (ConnectionId, mpsc::Receiver<ServerMessage>) {
        let (tx, rx) = mpsc::channel(64);
        let user = AuthenticatedUser::new(UserId::new(user).unwrap(), user);
        (d.connect(user, tx).await, rx)
    }

    #[tokio::test]
    async fn unregistered_connection_is_unauthorized() {
        let d = dispatcher();
        let ack = d
            .dispatch_text(&ConnectionId::new(), r#"{"event":"leave"}"#)
            .await;
        assert_eq!(ack.error_code(), Some(ErrorCode::Unauthorized));
    }

    #[tokio::test]
    async fn malformed_payload_is_validation_error() {
        let d = dispatcher();
        let (conn, _rx) = connect(&d, "alice").await;
        let ack = d
            .dispatch_text(&conn, r#"{"requestId":"7","event":"join","data":{}}"#)
            .await;
        assert_eq!(ack.error_code(), Some(ErrorCode::ValidationFailed));
        assert_eq!(ack.request_id.as_deref(), Some("7"));
        assert_eq!(ack.event, "join");
    }

    #[tokio::test]
    async fn events_outside_a_room_are_rejected() {
        let d = dispatcher();
        let (conn, _rx) = connect(&d, "alice").await;
        for event in ["leave", "startDraft", "getRoomSnapshot", "voiceChannelLeave"] {
            let ack = d
                .dispatch_text(&conn, &format!(r#"{{"event":"{}"}}"#, event))
                .await;
            assert!(!ack.is_success(), "{} should fail", event);
        }
    }

    #[tokio::test]
    async fn create_then_snapshot() {
        let d = dispatcher();
        let (conn, _rx) = connect(&d, "alice").await;
        let ack = d
            .dispatch_text(
                &conn,
                r#"{"event":"createRoom","data":{"name":"Friday scrim","playerCount":4,"pickMode":"seq_A"}}"#,
            )
            .await;
        assert!(ack.is_success(), "{:?}", ack);
        let data = ack.data.unwrap();
        assert_eq!(data["room"]["players"][0]["isCreator"], true);
        assert_eq!(data["you"]["role"], "player");

        let snap = d
            .dispatch_text(&conn, r#"{"event":"getRoomSnapshot"}"#)
            .await;
        assert!(snap.is_success());
        assert_eq!(snap.data.unwrap()["room"]["name"], "Friday scrim");
    }

    #[tokio::test]
    async fn disconnect_clears_registry() {
        let d = dispatcher();
        let (conn, _rx) = connect(&d, "alice").await;
        d.disconnect(&conn).await;
        assert_eq!(d.registry().connection_count().await, 0);
    }
}
