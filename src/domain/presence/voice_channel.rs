//! Voice channel identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::room::TeamId;

/// The voice group a connection currently talks and listens in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum VoiceChannel {
    #[default]
    None,
    Public,
    Team1,
    Team2,
}

impl VoiceChannel {
    /// Team a team channel is restricted to.
    pub fn team(&self) -> Option<TeamId> {
        match self {
            VoiceChannel::Team1 => Some(TeamId::ONE),
            VoiceChannel::Team2 => Some(TeamId::TWO),
            VoiceChannel::None | VoiceChannel::Public => None,
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, VoiceChannel::None)
    }
}

impl fmt::Display for VoiceChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            VoiceChannel::None => "none",
            VoiceChannel::Public => "public",
            VoiceChannel::Team1 => "team1",
            VoiceChannel::Team2 => "team2",
        };
        write!(f, "{}", s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn team_channels_map_to_teams() {
        assert_eq!(VoiceChannel::Team1.team(), Some(TeamId::ONE));
        assert_eq!(VoiceChannel::Team2.team(), Some(TeamId::TWO));
        assert_eq!(VoiceChannel::Public.team(), None);
    }

    #[test]
    fn serde_names() {
        assert_eq!(
            serde_json::to_string(&VoiceChannel::Team1).unwrap(),
            "\"team1\""
        );
        let parsed: VoiceChannel = serde_json::from_str("\"none\"").unwrap();
        assert!(parsed.is_none());
    }
}
