//! Channel-scoped chat delivery.
//!
//! Public messages reach the whole room. Team messages reach that team's
//! players and every spectator, never the opposing team.

use std::sync::Arc;

use crate::domain::chat::{ChatChannel, ChatMessage};
use crate::domain::foundation::RoomId;
use crate::domain::presence::{ConnectionSession, MemberRole};
use crate::domain::room::{RoomError, TeamId};
use crate::ports::MessageStore;

use super::broadcaster::PresenceBroadcaster;
use crate::application::protocol::PushKind;

/// How many extra messages to read per visible one when filtering history.
const HISTORY_OVERSCAN: usize = 3;

#[derive(Clone)]
pub struct ChatRouter {
    messages: Arc<dyn MessageStore>,
    broadcaster: PresenceBroadcaster,
    max_message_length: usize,
}

impl ChatRouter {
    pub fn new(
        messages: Arc<dyn MessageStore>,
        broadcaster: PresenceBroadcaster,
        max_message_length: usize,
    ) -> Self {
        Self {
            messages,
            broadcaster,
            max_message_length,
        }
    }

    /// Persist and route a user message.
    ///
    /// The sender does not receive a push; the ack carries the message.
    ///
    /// # Errors
    ///
    /// - `Validation` for bad content or a team message without a team
    /// - `Forbidden` if a team message comes from anyone but a player on that team
    pub async fn send(
        &self,
        sender: &ConnectionSession,
        content: &str,
        channel: ChatChannel,
        team_id: Option<TeamId>,
    ) -> Result<ChatMessage, RoomError> {
        let message = ChatMessage::from_user(
            sender.room_id,
            sender.user_id.clone(),
            sender.display_name.clone(),
            content,
            channel,
            team_id,
            self.max_message_length,
        )?;

        if let Some(team) = message.team_id {
            if sender.role != MemberRole::Player || sender.team_id != Some(team) {
                return Err(RoomError::forbidden(
                    "Only players on that team can send team messages",
                ));
            }
        }

        self.messages.append(&message).await?;

        let payload = serde_json::to_value(&message)
            .map_err(|e| RoomError::infrastructure(e.to_string()))?;
        let delivered = match message.team_id {
            Some(team) => {
                self.broadcaster
                    .notify_team_and_spectators(
                        &sender.room_id,
                        team,
                        PushKind::ChatMessage,
                        payload,
                        Some(&sender.user_id),
                    )
                    .await
            }
            None => {
                self.broadcaster
                    .notify_room(
                        &sender.room_id,
                        PushKind::ChatMessage,
                        payload,
                        Some(&sender.user_id),
                    )
                    .await
            }
        };

        tracing::debug!(
            room_id = %sender.room_id,
            user_id = %sender.user_id,
            channel = ?message.channel,
            delivered,
            "Chat message routed"
        );
        Ok(message)
    }

    /// Persist a system message and push it to the whole room.
    ///
    /// Failures are logged; announcements never fail the operation that
    /// triggered them.
    pub async fn announce(&self, room_id: &RoomId, content: impl Into<String>) -> Option<ChatMessage> {
        self.publish_announcement(ChatMessage::system(*room_id, content))
            .await
    }

    /// Announce a voice channel join or leave, tagged as a voice event.
    pub async fn announce_voice(&self, room_id: &RoomId, content: impl Into<String>) -> Option<ChatMessage> {
        self.publish_announcement(ChatMessage::voice_event(*room_id, content))
            .await
    }

    async fn publish_announcement(&self, message: ChatMessage) -> Option<ChatMessage> {
        let room_id = &message.room_id;
        if let Err(err) = self.messages.append(&message).await {
            tracing::warn!(room_id = %room_id, error = %err, "Failed to persist system message");
            return None;
        }
        match serde_json::to_value(&message) {
            Ok(payload) => {
                self.broadcaster
                    .notify_room(room_id, PushKind::ChatMessage, payload, None)
                    .await;
            }
            Err(err) => {
                tracing::warn!(room_id = %room_id, error = %err, "Failed to encode system message");
            }
        }
        Some(message)
    }

    /// The last `limit` messages the viewer may read, oldest first.
    pub async fn history_for(
        &self,
        room_id: &RoomId,
        role: MemberRole,
        team: Option<TeamId>,
        limit: usize,
    ) -> Result<Vec<ChatMessage>, RoomError> {
        let recent = self
            .messages
            .recent(room_id, limit.saturating_mul(HISTORY_OVERSCAN))
            .await?;
        let mut visible: Vec<ChatMessage> = recent
            .into_iter()
            .filter(|m| m.visible_to(role, team))
            .collect();
        let skip = visible.len().saturating_sub(limit);
        visible.drain(..skip);
        Ok(visible)
    }

    /// Drop a deleted room's log.
    pub async fn purge(&self, room_id: &RoomId) {
        if let Err(err) = self.messages.purge(room_id).await {
            tracing::warn!(room_id = %room_id, error = %err, "Failed to purge chat log");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryMessageStore;
    use crate::application::protocol::ServerMessage;
    use crate::application::realtime::ConnectionRegistry;
    use crate::domain::foundation::{AuthenticatedUser, ConnectionId, UserId};
    use tokio::sync::mpsc;

    struct Fixture {
        router: ChatRouter,
        store: Arc<InMemoryMessageStore>,
        registry: Arc<ConnectionRegistry>,
        room: RoomId,
    }

    fn fixture() -> Fixture {
        let registry = Arc::new(ConnectionRegistry::new());
        let store = Arc::new(InMemoryMessageStore::new());
        let router = ChatRouter::new(
            store.clone(),
            PresenceBroadcaster::new(registry.clone()),
            20,
        );
        Fixture {
            router,
            store,
            registry,
            room: RoomId::new(),
        }
    }

    async fn join(
        f: &Fixture,
        user: &str,
        role: MemberRole,
        team: Option<TeamId>,
    ) -> (ConnectionSession, mpsc::Receiver<ServerMessage>) {
        let (tx, rx) = mpsc::channel(8);
        let id = ConnectionId::new();
        let user_id = UserId::new(user).unwrap();
        f.registry
            .register(id, AuthenticatedUser::new(user_id.clone(), user), tx)
            .await;
        let session = ConnectionSession::new(id, f.room, user_id, user, role, team);
        f.registry.attach(session.clone()).await.unwrap();
        (session, rx)
    }

    fn received(rx: &mut mpsc::Receiver<ServerMessage>) -> usize {
        let mut n = 0;
        while rx.try_recv().is_ok() {
            n += 1;
        }
        n
    }

    #[tokio::test]
    async fn team_message_isolated_from_opponents() {
        let f = fixture();
        let (p1, mut r1) = join(&f, "p1", MemberRole::Player, Some(TeamId::ONE)).await;
        let (_p2, mut r2) = join(&f, "p2", MemberRole::Player, Some(TeamId::ONE)).await;
        let (_p3, mut r3) = join(&f, "p3", MemberRole::Player, Some(TeamId::TWO)).await;
        let (_sp, mut rs) = join(&f, "sp", MemberRole::Spectator, None).await;

        let msg = f
            .router
            .send(&p1, "rush b", ChatChannel::Team, Some(TeamId::ONE))
            .await
            .unwrap();

        assert_eq!((msg.channel, msg.team_id), (ChatChannel::Team, Some(TeamId::ONE)));
        assert_eq!(received(&mut r1), 0);
        assert_eq!(received(&mut r2), 1);
        assert_eq!(received(&mut r3), 0);
        assert_eq!(received(&mut rs), 1);
        assert_eq!(f.store.all(&f.room).await.len(), 1);
    }

    #[tokio::test]
    async fn team_message_requires_membership_of_that_team() {
        let f = fixture();
        let (p1, _r1) = join(&f, "p1", MemberRole::Player, Some(TeamId::ONE)).await;
        let (sp, _rs) = join(&f, "sp", MemberRole::Spectator, None).await;

        let err = f
            .router
            .send(&p1, "hi", ChatChannel::Team, Some(TeamId::TWO))
            .await
            .unwrap_err();
        assert!(matches!(err, RoomError::Forbidden(_)));
        assert!(f
            .router
            .send(&sp, "hi", ChatChannel::Team, Some(TeamId::ONE))
            .await
            .is_err());
        assert!(f.store.all(&f.room).await.is_empty());
    }

    #[tokio::test]
    async fn public_message_reaches_everyone_else() {
        let f = fixture();
        let (p1, mut r1) = join(&f, "p1", MemberRole::Player, Some(TeamId::ONE)).await;
        let (_p3, mut r3) = join(&f, "p3", MemberRole::Player, Some(TeamId::TWO)).await;

        f.router
            .send(&p1, "glhf", ChatChannel::Public, None)
            .await
            .unwrap();
        assert_eq!(received(&mut r1), 0);
        assert_eq!(received(&mut r3), 1);
    }

    #[tokio::test]
    async fn oversized_message_rejected() {
        let f = fixture();
        let (p1, _r1) = join(&f, "p1", MemberRole::Player, None).await;
        let long = "x".repeat(21);
        assert!(matches!(
            f.router.send(&p1, &long, ChatChannel::Public, None).await,
            Err(RoomError::Validation { .. })
        ));
    }

    #[tokio::test]
    async fn history_filters_opposing_team() {
        let f = fixture();
        let (p1, _r1) = join(&f, "p1", MemberRole::Player, Some(TeamId::ONE)).await;
        let (p3, _r3) = join(&f, "p3", MemberRole::Player, Some(TeamId::TWO)).await;

        f.router.send(&p1, "one", ChatChannel::Team, Some(TeamId::ONE)).await.unwrap();
        f.router.send(&p3, "two", ChatChannel::Team, Some(TeamId::TWO)).await.unwrap();
        f.router.announce(&f.room, "Draft started").await.unwrap();

        let seen = f
            .router
            .history_for(&f.room, MemberRole::Player, Some(TeamId::ONE), 10)
            .await
            .unwrap();
        let contents: Vec<&str> = seen.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["one", "Draft started"]);

        let spectator = f
            .router
            .history_for(&f.room, MemberRole::Spectator, None, 2)
            .await
            .unwrap();
        assert_eq!(spectator.len(), 2);
        assert_eq!(spectator[1].content, "Draft started");
    }
}
