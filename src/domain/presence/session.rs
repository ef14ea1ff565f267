//! Live connection session.

use serde::Serialize;

use crate::domain::foundation::{ConnectionId, RoomId, Timestamp, UserId};
use crate::domain::room::{MemberRole, Room, TeamId};

use super::VoiceChannel;

/// One live connection attached to a room.
///
/// `role` and `team_id` mirror the room aggregate and are refreshed after
/// every mutation that can change them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionSession {
    pub connection_id: ConnectionId,
    pub room_id: RoomId,
    pub user_id: UserId,
    pub display_name: String,
    pub role: MemberRole,
    pub team_id: Option<TeamId>,
    pub voice_channel: VoiceChannel,
    pub muted: bool,
    pub attached_at: Timestamp,
}

impl ConnectionSession {
    pub fn new(
        connection_id: ConnectionId,
        room_id: RoomId,
        user_id: UserId,
        display_name: impl Into<String>,
        role: MemberRole,
        team_id: Option<TeamId>,
    ) -> Self {
        Self {
            connection_id,
            room_id,
            user_id,
            display_name: display_name.into(),
            role,
            team_id,
            voice_channel: VoiceChannel::None,
            muted: false,
            attached_at: Timestamp::now(),
        }
    }

    /// Re-read role and team from the room.
    ///
    /// Returns false if the user is no longer a member.
    pub fn sync_with(&mut self, room: &Room) -> bool {
        match room.role_of(&self.user_id) {
            Some(role) => {
                self.role = role;
                self.team_id = room.team_of(&self.user_id);
                true
            }
            None => false,
        }
    }

    /// Whether this session may currently sit in `channel`.
    pub fn may_join(&self, channel: VoiceChannel) -> bool {
        match channel.team() {
            Some(team) => self.role == MemberRole::Player && self.team_id == Some(team),
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(role: MemberRole, team: Option<TeamId>) -> ConnectionSession {
        ConnectionSession::new(
            ConnectionId::new(),
            RoomId::new(),
            UserId::new("u").unwrap(),
            "U",
            role,
            team,
        )
    }

    #[test]
    fn starts_outside_voice() {
        let s = session(MemberRole::Spectator, None);
        assert_eq!(s.voice_channel, VoiceChannel::None);
        assert!(!s.muted);
    }

    #[test]
    fn team_channels_need_matching_player() {
        let player = session(MemberRole::Player, Some(TeamId::ONE));
        assert!(player.may_join(VoiceChannel::Team1));
        assert!(!player.may_join(VoiceChannel::Team2));
        assert!(player.may_join(VoiceChannel::Public));

        let spectator = session(MemberRole::Spectator, None);
        assert!(!spectator.may_join(VoiceChannel::Team1));
        assert!(spectator.may_join(VoiceChannel::Public));
    }
}
