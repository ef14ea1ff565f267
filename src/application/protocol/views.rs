//! Read models sent to clients: room views and snapshots.
//!
//! Views merge the durable room with presence (who is online) and
//! presentation data (usernames, avatars). The password hash never leaves
//! the aggregate.

use serde::Serialize;
use std::collections::{HashMap, HashSet};

use crate::domain::chat::ChatMessage;
use crate::domain::foundation::{RoomId, Timestamp, UserId};
use crate::domain::presence::{MemberRole, VoiceChannel};
use crate::domain::room::{MemberStatus, PickMode, Room, RoomStatus, Team, TeamId};
use crate::ports::UserProfile;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerView {
    pub user_id: UserId,
    pub username: String,
    pub avatar: Option<String>,
    pub team_id: Option<TeamId>,
    pub is_captain: bool,
    pub is_creator: bool,
    pub status: MemberStatus,
    pub online: bool,
    pub join_time: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpectatorView {
    pub user_id: UserId,
    pub username: String,
    pub avatar: Option<String>,
    pub is_creator: bool,
    pub status: MemberStatus,
    pub online: bool,
    pub join_time: Timestamp,
}

/// One member as announced in `member.*` pushes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberView {
    pub user_id: UserId,
    pub username: String,
    pub role: MemberRole,
    pub team_id: Option<TeamId>,
    pub is_creator: bool,
}

impl MemberView {
    /// `None` if the user is not a member.
    pub fn of(room: &Room, user_id: &UserId, username: impl Into<String>) -> Option<Self> {
        let role = room.role_of(user_id)?;
        Some(Self {
            user_id: user_id.clone(),
            username: username.into(),
            role,
            team_id: room.team_of(user_id),
            is_creator: room.is_creator(user_id),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomView {
    pub id: RoomId,
    pub name: String,
    pub description: Option<String>,
    pub game_type: String,
    pub creator_id: Option<UserId>,
    pub player_count: u8,
    pub team_count: u8,
    pub pick_mode: PickMode,
    pub has_password: bool,
    pub status: RoomStatus,
    pub players: Vec<PlayerView>,
    pub spectators: Vec<SpectatorView>,
    pub teams: Vec<Team>,
    pub next_team_pick: Option<TeamId>,
    pub created_at: Timestamp,
    pub started_at: Option<Timestamp>,
    pub ended_at: Option<Timestamp>,
}

impl RoomView {
    /// Build a view. Members without a live connection are reported offline.
    pub fn build(room: &Room, online: &HashSet<UserId>, profiles: &[UserProfile]) -> Self {
        let profiles: HashMap<&UserId, &UserProfile> =
            profiles.iter().map(|p| (&p.user_id, p)).collect();
        let username = |id: &UserId| {
            profiles
                .get(id)
                .map(|p| p.username.clone())
                .unwrap_or_else(|| id.to_string())
        };
        let avatar = |id: &UserId| profiles.get(id).and_then(|p| p.avatar.clone());
        let status = |id: &UserId, durable: MemberStatus| {
            if online.contains(id) {
                durable
            } else {
                MemberStatus::Offline
            }
        };

        let players = room
            .players()
            .iter()
            .map(|p| PlayerView {
                user_id: p.user_id.clone(),
                username: username(&p.user_id),
                avatar: avatar(&p.user_id),
                team_id: p.team_id,
                is_captain: p.is_captain,
                is_creator: p.is_creator,
                status: status(&p.user_id, p.status),
                online: online.contains(&p.user_id),
                join_time: p.join_time,
            })
            .collect();
        let spectators = room
            .spectators()
            .iter()
            .map(|s| SpectatorView {
                user_id: s.user_id.clone(),
                username: username(&s.user_id),
                avatar: avatar(&s.user_id),
                is_creator: s.is_creator,
                status: status(&s.user_id, s.status),
                online: online.contains(&s.user_id),
                join_time: s.join_time,
            })
            .collect();

        Self {
            id: *room.id(),
            name: room.name().to_string(),
            description: room.description().map(String::from),
            game_type: room.game_type().to_string(),
            creator_id: room.creator_id().cloned(),
            player_count: room.player_count(),
            team_count: 2,
            pick_mode: room.pick_mode(),
            has_password: room.has_password(),
            status: room.status(),
            players,
            spectators,
            teams: room.teams().to_vec(),
            next_team_pick: room.next_team_pick(),
            created_at: *room.created_at(),
            started_at: room.started_at().copied(),
            ended_at: room.ended_at().copied(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceMember {
    pub user_id: UserId,
    pub username: String,
    pub muted: bool,
}

/// Who sits in each voice channel.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceRosters {
    pub public: Vec<VoiceMember>,
    pub team1: Vec<VoiceMember>,
    pub team2: Vec<VoiceMember>,
}

impl VoiceRosters {
    pub fn push(&mut self, channel: VoiceChannel, member: VoiceMember) {
        match channel {
            VoiceChannel::Public => self.public.push(member),
            VoiceChannel::Team1 => self.team1.push(member),
            VoiceChannel::Team2 => self.team2.push(member),
            VoiceChannel::None => {}
        }
    }
}

/// The viewer's own standing in the room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SelfView {
    pub user_id: UserId,
    pub role: MemberRole,
    pub team_id: Option<TeamId>,
    pub voice_channel: VoiceChannel,
    pub muted: bool,
}

/// Full state delivered on join, reconnect and request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSnapshot {
    pub room: RoomView,
    pub messages: Vec<ChatMessage>,
    pub voice: VoiceRosters,
    pub you: SelfView,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::room::RoomParams;

    fn room() -> Room {
        let mut room = Room::create(
            UserId::new("alice").unwrap(),
            RoomParams {
                name: "View test".into(),
                description: None,
                player_count: 4,
                pick_mode: PickMode::SeqA,
                password: Some("pw".into()),
            },
        )
        .unwrap();
        room.add_spectator(UserId::new("bob").unwrap()).unwrap();
        room
    }

    #[test]
    fn offline_members_reported_offline() {
        let online = HashSet::from([UserId::new("alice").unwrap()]);
        let view = RoomView::build(&room(), &online, &[]);
        assert!(view.players[0].online);
        assert_eq!(view.players[0].status, MemberStatus::Online);
        assert!(!view.spectators[0].online);
        assert_eq!(view.spectators[0].status, MemberStatus::Offline);
    }

    #[test]
    fn usernames_fall_back_to_user_id() {
        let profiles = vec![UserProfile {
            user_id: UserId::new("alice").unwrap(),
            username: "Alice".into(),
            avatar: Some("a.png".into()),
        }];
        let view = RoomView::build(&room(), &HashSet::new(), &profiles);
        assert_eq!(view.players[0].username, "Alice");
        assert_eq!(view.spectators[0].username, "bob");
    }

    #[test]
    fn view_exposes_flag_not_password() {
        let view = RoomView::build(&room(), &HashSet::new(), &[]);
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["hasPassword"], true);
        assert!(json.get("password").is_none());
        assert_eq!(json["teamCount"], 2);
        assert!(json["teams"][0]["side"].is_null());
    }
}
