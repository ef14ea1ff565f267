//! Room membership records.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::{Timestamp, UserId};

use super::TeamId;

/// Which list of the room a user belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberRole {
    Player,
    Spectator,
}

impl fmt::Display for MemberRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MemberRole::Player => write!(f, "player"),
            MemberRole::Spectator => write!(f, "spectator"),
        }
    }
}

/// Durable per-member status.
///
/// Presence is not stored here; snapshots report `offline` for members
/// without a live connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MemberStatus {
    #[default]
    Online,
    Offline,
    Ready,
    Gaming,
}

/// A rostered player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub user_id: UserId,
    pub team_id: Option<TeamId>,
    pub is_captain: bool,
    pub is_creator: bool,
    pub status: MemberStatus,
    pub join_time: Timestamp,
}

impl Player {
    pub(crate) fn new(user_id: UserId, is_creator: bool, join_time: Timestamp) -> Self {
        Self {
            user_id,
            team_id: None,
            is_captain: false,
            is_creator,
            status: MemberStatus::Online,
            join_time,
        }
    }
}

/// A spectating member; never drafted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Spectator {
    pub user_id: UserId,
    pub is_creator: bool,
    pub status: MemberStatus,
    pub join_time: Timestamp,
}

impl Spectator {
    pub(crate) fn new(user_id: UserId, is_creator: bool, join_time: Timestamp) -> Self {
        Self {
            user_id,
            is_creator,
            status: MemberStatus::Online,
            join_time,
        }
    }
}
