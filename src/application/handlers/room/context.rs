//! Shared collaborators and helpers for room command handlers.

use std::sync::Arc;

use serde::Serialize;
use serde_json::{json, Value};
use tokio::sync::OwnedMutexGuard;

use crate::domain::foundation::{AuthenticatedUser, ConnectionId, RoomId, UserId};
use crate::domain::presence::ConnectionSession;
use crate::domain::room::{Room, RoomError};
use crate::ports::{
    MessageStore, RoomListChange, RoomListNotifier, RoomStore, RoomSummary, UserDirectory,
    UserProfile,
};

use crate::application::protocol::{PushKind, RoomSnapshot, RoomView, SelfView};
use crate::application::realtime::{
    ChatRouter, ConnectionRegistry, PresenceBroadcaster, RoomLocks, VoiceRouter,
};

/// The connection issuing a command.
#[derive(Debug, Clone)]
pub struct Actor {
    pub connection_id: ConnectionId,
    pub user: AuthenticatedUser,
}

/// Tunables for room handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoomSettings {
    /// Messages included in a snapshot.
    pub history_limit: usize,
    pub max_message_length: usize,
}

impl Default for RoomSettings {
    fn default() -> Self {
        Self {
            history_limit: 50,
            max_message_length: crate::domain::chat::DEFAULT_MAX_MESSAGE_LENGTH,
        }
    }
}

/// A room loaded under its lock.
pub(super) struct Locked {
    pub room: Room,
    _guard: OwnedMutexGuard<()>,
}

/// Everything a room handler needs.
pub struct RoomContext {
    pub(super) rooms: Arc<dyn RoomStore>,
    pub(super) directory: Arc<dyn UserDirectory>,
    pub(super) room_list: Arc<dyn RoomListNotifier>,
    pub(super) registry: Arc<ConnectionRegistry>,
    pub(super) broadcaster: PresenceBroadcaster,
    pub(super) voice: VoiceRouter,
    pub(super) chat: ChatRouter,
    pub(super) locks: RoomLocks,
    pub(super) settings: RoomSettings,
}

impl RoomContext {
    pub fn new(
        rooms: Arc<dyn RoomStore>,
        messages: Arc<dyn MessageStore>,
        directory: Arc<dyn UserDirectory>,
        room_list: Arc<dyn RoomListNotifier>,
        settings: RoomSettings,
    ) -> Self {
        let registry = Arc::new(ConnectionRegistry::new());
        let broadcaster = PresenceBroadcaster::new(registry.clone());
        let chat = ChatRouter::new(messages, broadcaster.clone(), settings.max_message_length);
        let voice = VoiceRouter::new(registry.clone(), broadcaster.clone(), chat.clone());
        Self {
            rooms,
            directory,
            room_list,
            registry,
            broadcaster,
            voice,
            chat,
            locks: RoomLocks::new(),
            settings,
        }
    }

    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.registry
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Loading
    // ─────────────────────────────────────────────────────────────────────────

    pub(super) async fn load(&self, room_id: &RoomId) -> Result<Room, RoomError> {
        self.rooms
            .find(room_id)
            .await?
            .ok_or_else(|| RoomError::not_found(format!("Room {}", room_id)))
    }

    pub(super) async fn current_session(&self, actor: &Actor) -> Result<ConnectionSession, RoomError> {
        self.registry
            .session(&actor.connection_id)
            .await
            .ok_or_else(|| RoomError::validation("room", "Join a room first"))
    }

    /// Lock a room and load it.
    ///
    /// A room that does not exist leaves no lock entry behind.
    pub(super) async fn lock_room(&self, room_id: &RoomId) -> Result<Locked, RoomError> {
        let guard = self.locks.lock(room_id).await;
        match self.load(room_id).await {
            Ok(room) => Ok(Locked {
                room,
                _guard: guard,
            }),
            Err(err) => {
                drop(guard);
                self.locks.release_if_idle(room_id).await;
                Err(err)
            }
        }
    }

    /// Lock the caller's room and load it.
    ///
    /// The session is re-read under the lock so a concurrent leave or
    /// supersede is observed.
    pub(super) async fn lock_current(&self, actor: &Actor) -> Result<Locked, RoomError> {
        let room_id = self.current_session(actor).await?.room_id;
        let locked = self.lock_room(&room_id).await?;
        let session = self.current_session(actor).await?;
        if session.room_id != room_id {
            return Err(RoomError::conflict("Connection moved to another room"));
        }
        Ok(locked)
    }

    /// Attach the actor's connection to a room it is a member of.
    ///
    /// Leaves any room the connection was in before and supersedes the
    /// user's older connections in this room.
    pub(super) async fn attach(&self, actor: &Actor, room: &Room) -> Result<ConnectionSession, RoomError> {
        let user_id = &actor.user.id;
        let role = room
            .role_of(user_id)
            .ok_or_else(|| RoomError::not_found(format!("Member {}", user_id)))?;
        let session = ConnectionSession::new(
            actor.connection_id,
            *room.id(),
            user_id.clone(),
            actor.user.display_name.clone(),
            role,
            room.team_of(user_id),
        );
        let attachment = self
            .registry
            .attach(session.clone())
            .await
            .ok_or_else(|| RoomError::validation("connection", "Connection is closed"))?;

        if let Some(previous) = attachment.previous {
            if previous.room_id == *room.id() {
                self.voice.announce_left(&previous, previous.voice_channel).await;
            } else {
                self.vacate(&previous).await;
            }
        }
        for old in &attachment.superseded {
            self.voice.announce_left(old, old.voice_channel).await;
            self.broadcaster
                .notify_connection(
                    &old.connection_id,
                    PushKind::SessionReplaced,
                    Some(old.room_id),
                    json!({ "roomId": old.room_id, "replacedBy": actor.connection_id }),
                )
                .await;
            tracing::debug!(
                room_id = %old.room_id,
                user_id = %old.user_id,
                connection_id = %old.connection_id,
                "Session superseded"
            );
        }
        Ok(session)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Read models
    // ─────────────────────────────────────────────────────────────────────────

    pub(super) async fn view(&self, room: &Room) -> RoomView {
        let online = self.registry.online_users(room.id()).await;
        let profiles = match self.directory.profiles(&room.member_ids()).await {
            Ok(profiles) => profiles,
            Err(err) => {
                tracing::warn!(room_id = %room.id(), error = %err, "Profile lookup failed");
                Vec::new()
            }
        };
        RoomView::build(room, &online, &profiles)
    }

    pub(super) async fn snapshot(
        &self,
        room: &Room,
        session: &ConnectionSession,
    ) -> Result<RoomSnapshot, RoomError> {
        let messages = self
            .chat
            .history_for(
                room.id(),
                session.role,
                session.team_id,
                self.settings.history_limit,
            )
            .await?;
        Ok(RoomSnapshot {
            room: self.view(room).await,
            messages,
            voice: self.registry.voice_rosters(room.id()).await,
            you: SelfView {
                user_id: session.user_id.clone(),
                role: session.role,
                team_id: session.team_id,
                voice_channel: session.voice_channel,
                muted: session.muted,
            },
        })
    }

    /// Display name for announcements; falls back to the user id.
    pub(super) async fn display_name(&self, user_id: &UserId) -> String {
        match self.directory.profile(user_id).await {
            Ok(Some(profile)) => profile.username,
            _ => user_id.to_string(),
        }
    }

    pub(super) async fn remember(&self, user: &AuthenticatedUser) {
        let profile = UserProfile {
            user_id: user.id.clone(),
            username: user.display_name.clone(),
            avatar: None,
        };
        if let Err(err) = self.directory.remember(profile).await {
            tracing::warn!(user_id = %user.id, error = %err, "Failed to record profile");
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Propagation
    // ─────────────────────────────────────────────────────────────────────────

    /// Re-sync live sessions with the saved room and announce voice
    /// channels they were forced out of.
    pub(super) async fn sync(&self, room: &Room) {
        let report = self.registry.sync_room(room).await;
        for session in &report.detached {
            self.voice.announce_left(session, session.voice_channel).await;
        }
        for (session, channel) in &report.voice_evicted {
            self.voice.announce_left(session, *channel).await;
            self.broadcaster
                .notify_connection(
                    &session.connection_id,
                    PushKind::VoiceLeft,
                    Some(session.room_id),
                    json!({ "userId": session.user_id, "channel": channel }),
                )
                .await;
        }
    }

    /// Push the refreshed room to its members and the room list.
    pub(super) async fn publish_update(&self, room: &Room) -> RoomView {
        let view = self.view(room).await;
        match to_json(&view) {
            Ok(payload) => {
                self.broadcaster
                    .notify_room(room.id(), PushKind::RoomUpdated, payload, None)
                    .await;
            }
            Err(err) => tracing::warn!(room_id = %room.id(), error = %err, "Failed to encode room"),
        }
        self.notify_room_list(RoomListChange::Updated(RoomSummary::from(room)))
            .await;
        view
    }

    pub(super) async fn notify_room_list(&self, change: RoomListChange) {
        if let Err(err) = self.room_list.notify(change).await {
            tracing::warn!(error = %err, "Room list notification failed");
        }
    }

    /// Clean up after a session left its room without a durable change.
    ///
    /// Announces the vacated voice channel and, if the user has no other
    /// live session there, their disconnection.
    pub(super) async fn vacate(&self, session: &ConnectionSession) {
        self.voice.announce_left(session, session.voice_channel).await;
        if !self
            .registry
            .is_online(&session.room_id, &session.user_id)
            .await
        {
            self.broadcaster
                .notify_room(
                    &session.room_id,
                    PushKind::MemberDisconnected,
                    json!({ "userId": session.user_id }),
                    None,
                )
                .await;
        }
    }

    /// Delete an empty room and everything derived from it.
    pub(super) async fn delete_room(&self, room_id: &RoomId) -> Result<(), RoomError> {
        self.rooms.delete(room_id).await?;
        self.chat.purge(room_id).await;
        for session in self.registry.detach_room(room_id).await {
            self.broadcaster
                .notify_connection(
                    &session.connection_id,
                    PushKind::RoomDeleted,
                    Some(*room_id),
                    json!({ "roomId": room_id }),
                )
                .await;
        }
        self.locks.remove(room_id).await;
        self.notify_room_list(RoomListChange::Deleted(*room_id)).await;
        tracing::info!(room_id = %room_id, "Room deleted");
        Ok(())
    }
}

pub(super) fn to_json<T: Serialize>(value: &T) -> Result<Value, RoomError> {
    serde_json::to_value(value).map_err(|e| RoomError::infrastructure(e.to_string()))
}
