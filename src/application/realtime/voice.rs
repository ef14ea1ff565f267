//! Voice channel membership and audio frame relay.
//!
//! A connection sits in at most one channel. Team channels admit only that
//! team's players. Frames are relayed to the other occupants of the
//! sender's channel and nowhere else.

use std::sync::Arc;

use serde_json::json;

use crate::domain::foundation::ConnectionId;
use crate::domain::presence::{ConnectionSession, VoiceChannel};
use crate::domain::room::RoomError;

use super::broadcaster::PresenceBroadcaster;
use super::chat_router::ChatRouter;
use super::registry::ConnectionRegistry;
use crate::application::protocol::PushKind;

#[derive(Clone)]
pub struct VoiceRouter {
    registry: Arc<ConnectionRegistry>,
    broadcaster: PresenceBroadcaster,
    chat: ChatRouter,
}

impl VoiceRouter {
    pub fn new(registry: Arc<ConnectionRegistry>, broadcaster: PresenceBroadcaster, chat: ChatRouter) -> Self {
        Self {
            registry,
            broadcaster,
            chat,
        }
    }

    /// Move a connection into `channel`, leaving its current one.
    ///
    /// Joining the channel already held is a no-op. Every real move is
    /// recorded in the room's chat log.
    ///
    /// # Errors
    ///
    /// - `Validation` if the connection is not in a room or `channel` is `none`
    /// - `Forbidden` for a team channel the member does not belong to
    pub async fn join_channel(
        &self,
        connection_id: &ConnectionId,
        channel: VoiceChannel,
    ) -> Result<ConnectionSession, RoomError> {
        if channel.is_none() {
            return Err(RoomError::validation(
                "channel",
                "Use voiceChannelLeave to leave voice",
            ));
        }
        let (previous, updated) = self
            .registry
            .try_update_session(connection_id, |s| {
                if s.voice_channel == channel {
                    return Ok(None);
                }
                if !s.may_join(channel) {
                    return Err(RoomError::forbidden(format!(
                        "Cannot join voice channel {}",
                        channel
                    )));
                }
                Ok(Some(std::mem::replace(&mut s.voice_channel, channel)))
            })
            .await
            .ok_or_else(not_in_room)??;
        let Some(previous) = previous else {
            return Ok(updated);
        };

        self.announce_left(&updated, previous).await;
        self.broadcaster
            .notify_voice_channel(
                &updated.room_id,
                channel,
                PushKind::VoiceJoined,
                json!({
                    "userId": updated.user_id,
                    "username": updated.display_name,
                    "channel": channel,
                    "muted": updated.muted,
                }),
                Some(connection_id),
            )
            .await;
        self.chat
            .announce_voice(
                &updated.room_id,
                format!("{} joined voice ({})", updated.display_name, channel),
            )
            .await;

        tracing::info!(
            room_id = %updated.room_id,
            user_id = %updated.user_id,
            from = %previous,
            to = %channel,
            "Voice channel joined"
        );
        Ok(updated)
    }

    /// Leave the current channel. No-op when not in one.
    pub async fn leave_channel(&self, connection_id: &ConnectionId) -> Result<ConnectionSession, RoomError> {
        let (previous, updated) = self
            .registry
            .try_update_session(connection_id, |s| {
                Ok::<_, RoomError>(std::mem::replace(&mut s.voice_channel, VoiceChannel::None))
            })
            .await
            .ok_or_else(not_in_room)??;
        if previous.is_none() {
            return Ok(updated);
        }
        self.announce_left(&updated, previous).await;
        self.chat
            .announce_voice(
                &updated.room_id,
                format!("{} left voice ({})", updated.display_name, previous),
            )
            .await;
        tracing::info!(room_id = %updated.room_id, user_id = %updated.user_id, channel = %previous, "Voice channel left");
        Ok(updated)
    }

    /// Relay one audio frame. Returns how many connections received it.
    ///
    /// Frames from muted senders or senders outside voice are dropped.
    pub async fn forward(&self, connection_id: &ConnectionId, payload: String) -> Result<usize, RoomError> {
        let session = self.current(connection_id).await?;
        if session.muted || session.voice_channel.is_none() {
            return Ok(0);
        }
        let delivered = self
            .broadcaster
            .notify_voice_channel(
                &session.room_id,
                session.voice_channel,
                PushKind::VoiceData,
                json!({
                    "userId": session.user_id,
                    "channel": session.voice_channel,
                    "payload": payload,
                }),
                Some(connection_id),
            )
            .await;
        tracing::trace!(room_id = %session.room_id, channel = %session.voice_channel, delivered, "Voice frame relayed");
        Ok(delivered)
    }

    /// Set the mute flag and tell the channel.
    pub async fn set_mute(&self, connection_id: &ConnectionId, muted: bool) -> Result<ConnectionSession, RoomError> {
        let updated = self
            .registry
            .update_session(connection_id, |s| s.muted = muted)
            .await
            .ok_or_else(not_in_room)?;
        self.broadcaster
            .notify_voice_channel(
                &updated.room_id,
                updated.voice_channel,
                PushKind::VoiceMute,
                json!({ "userId": updated.user_id, "muted": muted }),
                Some(connection_id),
            )
            .await;
        Ok(updated)
    }

    /// Tell a channel's remaining occupants that a session left it.
    ///
    /// Used after the registry already moved the session out, e.g. on
    /// detach or team reassignment.
    pub async fn announce_left(&self, session: &ConnectionSession, channel: VoiceChannel) {
        if channel.is_none() {
            return;
        }
        self.broadcaster
            .notify_voice_channel(
                &session.room_id,
                channel,
                PushKind::VoiceLeft,
                json!({ "userId": session.user_id, "channel": channel }),
                Some(&session.connection_id),
            )
            .await;
    }

    async fn current(&self, connection_id: &ConnectionId) -> Result<ConnectionSession, RoomError> {
        self.registry
            .session(connection_id)
            .await
            .ok_or_else(not_in_room)
    }
}

fn not_in_room() -> RoomError {
    RoomError::validation("room", "Connection is not in a room")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryMessageStore;
    use crate::application::protocol::ServerMessage;
    use crate::domain::chat::MessageKind;
    use crate::domain::foundation::{AuthenticatedUser, RoomId, UserId};
    use crate::ports::MessageStore;
    use crate::domain::presence::MemberRole;
    use crate::domain::room::TeamId;
    use tokio::sync::mpsc;

    struct Peer {
        id: ConnectionId,
        rx: mpsc::Receiver<ServerMessage>,
    }

    impl Peer {
        fn events(&mut self) -> Vec<PushKind> {
            let mut out = Vec::new();
            while let Ok(msg) = self.rx.try_recv() {
                if let Some(push) = msg.as_push() {
                    out.push(push.event);
                }
            }
            out
        }
    }

    async fn peer(
        registry: &ConnectionRegistry,
        room: RoomId,
        user: &str,
        role: MemberRole,
        team: Option<TeamId>,
    ) -> Peer {
        let (tx, rx) = mpsc::channel(16);
        let id = ConnectionId::new();
        let user_id = UserId::new(user).unwrap();
        registry
            .register(id, AuthenticatedUser::new(user_id.clone(), user), tx)
            .await;
        registry
            .attach(ConnectionSession::new(id, room, user_id, user, role, team))
            .await
            .unwrap();
        Peer { id, rx }
    }

    fn router_with_log(registry: Arc<ConnectionRegistry>) -> (VoiceRouter, Arc<InMemoryMessageStore>) {
        let store = Arc::new(InMemoryMessageStore::new());
        let broadcaster = PresenceBroadcaster::new(registry.clone());
        let chat = ChatRouter::new(store.clone(), broadcaster.clone(), 500);
        (VoiceRouter::new(registry, broadcaster, chat), store)
    }

    fn router(registry: Arc<ConnectionRegistry>) -> VoiceRouter {
        router_with_log(registry).0
    }

    #[tokio::test]
    async fn team_channel_requires_team_player() {
        let registry = Arc::new(ConnectionRegistry::new());
        let room = RoomId::new();
        let p1 = peer(&registry, room, "p1", MemberRole::Player, Some(TeamId::ONE)).await;
        let sp = peer(&registry, room, "sp", MemberRole::Spectator, None).await;
        let voice = router(registry);

        assert!(voice.join_channel(&p1.id, VoiceChannel::Team1).await.is_ok());
        assert!(matches!(
            voice.join_channel(&p1.id, VoiceChannel::Team2).await,
            Err(RoomError::Forbidden(_))
        ));
        assert!(voice.join_channel(&sp.id, VoiceChannel::Team1).await.is_err());
        assert!(voice.join_channel(&sp.id, VoiceChannel::Public).await.is_ok());
    }

    #[tokio::test]
    async fn frames_stay_in_channel() {
        let registry = Arc::new(ConnectionRegistry::new());
        let room = RoomId::new();
        let mut a = peer(&registry, room, "a", MemberRole::Player, Some(TeamId::ONE)).await;
        let mut b = peer(&registry, room, "b", MemberRole::Player, Some(TeamId::ONE)).await;
        let mut c = peer(&registry, room, "c", MemberRole::Player, Some(TeamId::TWO)).await;
        let voice = router(registry);

        voice.join_channel(&a.id, VoiceChannel::Team1).await.unwrap();
        voice.join_channel(&b.id, VoiceChannel::Team1).await.unwrap();
        voice.join_channel(&c.id, VoiceChannel::Team2).await.unwrap();
        a.events();
        b.events();
        c.events();

        assert_eq!(voice.forward(&a.id, "frame".into()).await.unwrap(), 1);
        assert!(a.events().is_empty());
        assert_eq!(b.events(), vec![PushKind::VoiceData]);
        assert!(c.events().is_empty());
    }

    #[tokio::test]
    async fn muted_sender_relays_nothing() {
        let registry = Arc::new(ConnectionRegistry::new());
        let room = RoomId::new();
        let a = peer(&registry, room, "a", MemberRole::Spectator, None).await;
        let mut b = peer(&registry, room, "b", MemberRole::Spectator, None).await;
        let voice = router(registry);

        voice.join_channel(&a.id, VoiceChannel::Public).await.unwrap();
        voice.join_channel(&b.id, VoiceChannel::Public).await.unwrap();
        voice.set_mute(&a.id, true).await.unwrap();
        assert_eq!(b.events(), vec![PushKind::VoiceMute]);

        assert_eq!(voice.forward(&a.id, "frame".into()).await.unwrap(), 0);
        assert!(b.events().is_empty());
    }

    #[tokio::test]
    async fn switching_channels_announces_leave_and_join() {
        let registry = Arc::new(ConnectionRegistry::new());
        let room = RoomId::new();
        let a = peer(&registry, room, "a", MemberRole::Player, Some(TeamId::ONE)).await;
        let mut b = peer(&registry, room, "b", MemberRole::Player, Some(TeamId::ONE)).await;
        let voice = router(registry.clone());

        voice.join_channel(&b.id, VoiceChannel::Public).await.unwrap();
        b.events();
        voice.join_channel(&a.id, VoiceChannel::Public).await.unwrap();
        assert_eq!(b.events(), vec![PushKind::VoiceJoined, PushKind::ChatMessage]);

        voice.join_channel(&a.id, VoiceChannel::Team1).await.unwrap();
        assert_eq!(b.events(), vec![PushKind::VoiceLeft, PushKind::ChatMessage]);

        let rosters = registry.voice_rosters(&room).await;
        assert_eq!(rosters.public.len(), 1);
        assert_eq!(rosters.team1.len(), 1);
    }

    #[tokio::test]
    async fn joins_and_leaves_are_logged_as_voice_events() {
        let registry = Arc::new(ConnectionRegistry::new());
        let room = RoomId::new();
        let a = peer(&registry, room, "a", MemberRole::Player, Some(TeamId::ONE)).await;
        let (voice, store) = router_with_log(registry);

        voice.join_channel(&a.id, VoiceChannel::Team1).await.unwrap();
        voice.join_channel(&a.id, VoiceChannel::Team1).await.unwrap();
        voice.leave_channel(&a.id).await.unwrap();
        voice.leave_channel(&a.id).await.unwrap();

        let log = store.recent(&room, 10).await.unwrap();
        assert_eq!(log.len(), 2);
        assert!(log.iter().all(|m| m.kind == MessageKind::Voice && m.sender_id.is_none()));
        assert_eq!(log[0].content, "a joined voice (team1)");
        assert_eq!(log[1].content, "a left voice (team1)");
    }

    #[tokio::test]
    async fn refused_team_channel_keeps_current_channel() {
        let registry = Arc::new(ConnectionRegistry::new());
        let room = RoomId::new();
        let sp = peer(&registry, room, "sp", MemberRole::Spectator, None).await;
        let (voice, store) = router_with_log(registry.clone());

        voice.join_channel(&sp.id, VoiceChannel::Public).await.unwrap();
        assert!(matches!(
            voice.join_channel(&sp.id, VoiceChannel::Team2).await,
            Err(RoomError::Forbidden(_))
        ));
        assert_eq!(registry.session(&sp.id).await.unwrap().voice_channel, VoiceChannel::Public);
        assert_eq!(store.recent(&room, 10).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn detached_connection_cannot_use_voice() {
        let registry = Arc::new(ConnectionRegistry::new());
        let voice = router(registry);
        assert!(voice
            .forward(&ConnectionId::new(), "frame".into())
            .await
            .is_err());
    }
}
