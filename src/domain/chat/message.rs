//! Chat message entity and visibility rule.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::{MessageId, RoomId, Timestamp, UserId};
use crate::domain::room::{MemberRole, RoomError, TeamId};

/// Default upper bound on message content, in characters.
pub const DEFAULT_MAX_MESSAGE_LENGTH: usize = 500;

/// Where a message is routed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ChatChannel {
    #[default]
    Public,
    Team,
}

impl fmt::Display for ChatChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChatChannel::Public => write!(f, "public"),
            ChatChannel::Team => write!(f, "team"),
        }
    }
}

/// Origin of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    #[default]
    Text,
    Voice,
    System,
}

/// A persisted chat message.
///
/// System messages have no sender and are always public.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: MessageId,
    pub room_id: RoomId,
    pub sender_id: Option<UserId>,
    pub sender_name: Option<String>,
    pub content: String,
    #[serde(rename = "type")]
    pub kind: MessageKind,
    pub channel: ChatChannel,
    pub team_id: Option<TeamId>,
    pub created_at: Timestamp,
}

impl ChatMessage {
    /// Build a user-authored message.
    ///
    /// Content is trimmed; team messages must name a team and public ones
    /// must not.
    ///
    /// # Errors
    ///
    /// - `Validation` for empty or oversized content, or a channel/team mismatch
    pub fn from_user(
        room_id: RoomId,
        sender_id: UserId,
        sender_name: impl Into<String>,
        content: &str,
        channel: ChatChannel,
        team_id: Option<TeamId>,
        max_length: usize,
    ) -> Result<Self, RoomError> {
        let content = content.trim();
        if content.is_empty() {
            return Err(RoomError::validation("content", "Message cannot be empty"));
        }
        if content.chars().count() > max_length {
            return Err(RoomError::validation(
                "content",
                format!("Message must be {} characters or less", max_length),
            ));
        }
        let team_id = match (channel, team_id) {
            (ChatChannel::Team, None) => {
                return Err(RoomError::validation(
                    "team_id",
                    "Team messages must name a team",
                ))
            }
            (ChatChannel::Team, Some(team)) => Some(team),
            (ChatChannel::Public, _) => None,
        };

        Ok(Self {
            id: MessageId::new(),
            room_id,
            sender_id: Some(sender_id),
            sender_name: Some(sender_name.into()),
            content: content.to_string(),
            kind: MessageKind::Text,
            channel,
            team_id,
            created_at: Timestamp::now(),
        })
    }

    /// Build a system announcement (membership and draft events).
    pub fn system(room_id: RoomId, content: impl Into<String>) -> Self {
        Self {
            id: MessageId::new(),
            room_id,
            sender_id: None,
            sender_name: None,
            content: content.into(),
            kind: MessageKind::System,
            channel: ChatChannel::Public,
            team_id: None,
            created_at: Timestamp::now(),
        }
    }

    /// Build a voice-channel announcement. Same shape as [`system`](Self::system).
    pub fn voice_event(room_id: RoomId, content: impl Into<String>) -> Self {
        Self {
            kind: MessageKind::Voice,
            ..Self::system(room_id, content)
        }
    }

    /// Whether a member with this role and team may read the message.
    ///
    /// Spectators read everything; players read public messages and their
    /// own team's messages.
    pub fn visible_to(&self, role: MemberRole, team: Option<TeamId>) -> bool {
        match (self.channel, role) {
            (ChatChannel::Public, _) => true,
            (ChatChannel::Team, MemberRole::Spectator) => true,
            (ChatChannel::Team, MemberRole::Player) => team.is_some() && self.team_id == team,
        }
    }
}
