//! Fan-out of push events to audiences within a room.
//!
//! Delivery is best effort: a full or closed outbox drops the message for
//! that connection only. Slow clients miss updates and recover with a
//! snapshot.

use std::sync::Arc;

use serde_json::Value;
use tokio::sync::mpsc::error::TrySendError;

use crate::domain::foundation::{ConnectionId, RoomId, UserId};
use crate::domain::presence::{MemberRole, VoiceChannel};
use crate::domain::room::TeamId;

use super::registry::{is_team_player, ConnectionRegistry, Outbox};
use crate::application::protocol::{PushEvent, PushKind, ServerMessage};

/// Sends push events to connections selected from the registry.
#[derive(Clone)]
pub struct PresenceBroadcaster {
    registry: Arc<ConnectionRegistry>,
}

impl PresenceBroadcaster {
    pub fn new(registry: Arc<ConnectionRegistry>) -> Self {
        Self { registry }
    }

    /// Everyone in the room, optionally skipping one user's connections.
    pub async fn notify_room(
        &self,
        room_id: &RoomId,
        kind: PushKind,
        payload: Value,
        exclude: Option<&UserId>,
    ) -> usize {
        let targets = self
            .registry
            .room_outboxes(room_id, |s| Some(&s.user_id) != exclude)
            .await;
        deliver(targets, PushEvent::new(kind, Some(*room_id), payload))
    }

    /// Players of one team.
    pub async fn notify_team(&self, room_id: &RoomId, team: TeamId, kind: PushKind, payload: Value) -> usize {
        let targets = self
            .registry
            .room_outboxes(room_id, |s| is_team_player(s, team))
            .await;
        deliver(targets, PushEvent::new(kind, Some(*room_id), payload))
    }

    /// Players of one team plus every spectator.
    pub async fn notify_team_and_spectators(
        &self,
        room_id: &RoomId,
        team: TeamId,
        kind: PushKind,
        payload: Value,
        exclude: Option<&UserId>,
    ) -> usize {
        let targets = self
            .registry
            .room_outboxes(room_id, |s| {
                Some(&s.user_id) != exclude
                    && (is_team_player(s, team) || s.role == MemberRole::Spectator)
            })
            .await;
        deliver(targets, PushEvent::new(kind, Some(*room_id), payload))
    }

    pub async fn notify_spectators(&self, room_id: &RoomId, kind: PushKind, payload: Value) -> usize {
        let targets = self
            .registry
            .room_outboxes(room_id, |s| s.role == MemberRole::Spectator)
            .await;
        deliver(targets, PushEvent::new(kind, Some(*room_id), payload))
    }

    /// Every connection the user has open, attached to a room or not.
    pub async fn notify_user(
        &self,
        user_id: &UserId,
        kind: PushKind,
        room_id: Option<RoomId>,
        payload: Value,
    ) -> usize {
        let targets = self.registry.user_outboxes(user_id).await;
        deliver(targets, PushEvent::new(kind, room_id, payload))
    }

    pub async fn notify_connection(
        &self,
        connection_id: &ConnectionId,
        kind: PushKind,
        room_id: Option<RoomId>,
        payload: Value,
    ) -> bool {
        match self.registry.outbox(connection_id).await {
            Some(outbox) => deliver(
                vec![(*connection_id, outbox)],
                PushEvent::new(kind, room_id, payload),
            ) == 1,
            None => false,
        }
    }

    /// Occupants of a voice channel, skipping one connection.
    pub async fn notify_voice_channel(
        &self,
        room_id: &RoomId,
        channel: VoiceChannel,
        kind: PushKind,
        payload: Value,
        exclude: Option<&ConnectionId>,
    ) -> usize {
        if channel.is_none() {
            return 0;
        }
        let targets = self
            .registry
            .room_outboxes(room_id, |s| {
                s.voice_channel == channel && Some(&s.connection_id) != exclude
            })
            .await;
        deliver(targets, PushEvent::new(kind, Some(*room_id), payload))
    }
}

/// Push to each outbox without waiting; returns how many accepted it.
fn deliver(targets: Vec<(ConnectionId, Outbox)>, event: PushEvent) -> usize {
    let mut delivered = 0;
    for (connection_id, outbox) in targets {
        match outbox.try_send(ServerMessage::Push(event.clone())) {
            Ok(()) => delivered += 1,
            Err(TrySendError::Full(_)) => {
                tracing::warn!(
                    connection_id = %connection_id,
                    event = %event.event,
                    "Outbox full, dropping push"
                );
            }
            Err(TrySendError::Closed(_)) => {
                tracing::debug!(connection_id = %connection_id, "Outbox closed");
            }
        }
    }
    delivered
}
