//! Teams, team identifiers and map sides.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::{UserId, ValidationError};

/// Identifier of one of the two teams in a room.
///
/// Only `1` and `2` are valid; construction enforces it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct TeamId(u8);

impl TeamId {
    pub const ONE: TeamId = TeamId(1);
    pub const TWO: TeamId = TeamId(2);

    /// Creates a team id, rejecting anything but 1 or 2.
    pub fn new(id: u8) -> Result<Self, ValidationError> {
        match id {
            1 | 2 => Ok(Self(id)),
            other => Err(ValidationError::out_of_range("team_id", 1, 2, other as i64)),
        }
    }

    pub fn get(&self) -> u8 {
        self.0
    }

    /// The opposing team.
    pub fn other(&self) -> TeamId {
        if self.0 == 1 {
            TeamId::TWO
        } else {
            TeamId::ONE
        }
    }

    /// Position in the room's two-element team list.
    pub fn index(&self) -> usize {
        (self.0 - 1) as usize
    }
}

impl TryFrom<u8> for TeamId {
    type Error = ValidationError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<TeamId> for u8 {
    fn from(id: TeamId) -> Self {
        id.0
    }
}

impl fmt::Display for TeamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// In-game camp assigned to a team.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Blue,
    Red,
}

impl Side {
    pub fn opposite(&self) -> Side {
        match self {
            Side::Blue => Side::Red,
            Side::Red => Side::Blue,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Blue => write!(f, "blue"),
            Side::Red => write!(f, "red"),
        }
    }
}

/// One of the two fixed teams of a room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Team {
    pub id: TeamId,
    pub name: String,
    /// `None` until a captain picks a side.
    pub side: Option<Side>,
    pub captain_id: Option<UserId>,
}

impl Team {
    /// The fixed pair every room starts with.
    pub fn default_pair() -> [Team; 2] {
        [
            Team {
                id: TeamId::ONE,
                name: "Blue Team".to_string(),
                side: None,
                captain_id: None,
            },
            Team {
                id: TeamId::TWO,
                name: "Red Team".to_string(),
                side: None,
                captain_id: None,
            },
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn team_id_accepts_only_one_and_two() {
        assert!(TeamId::new(1).is_ok());
        assert!(TeamId::new(2).is_ok());
        assert!(TeamId::new(0).is_err());
        assert!(TeamId::new(3).is_err());
    }

    #[test]
    fn team_id_other_flips() {
        assert_eq!(TeamId::ONE.other(), TeamId::TWO);
        assert_eq!(TeamId::TWO.other(), TeamId::ONE);
    }

    #[test]
    fn team_id_deserialization_rejects_out_of_range() {
        assert!(serde_json::from_str::<TeamId>("2").is_ok());
        assert!(serde_json::from_str::<TeamId>("7").is_err());
    }

    #[test]
    fn side_opposite() {
        assert_eq!(Side::Blue.opposite(), Side::Red);
        assert_eq!(Side::Red.opposite(), Side::Blue);
    }

    #[test]
    fn default_pair_has_no_sides_or_captains() {
        let teams = Team::default_pair();
        assert_eq!(teams[0].id, TeamId::ONE);
        assert_eq!(teams[1].id, TeamId::TWO);
        assert!(teams.iter().all(|t| t.side.is_none() && t.captain_id.is_none()));
    }
}
