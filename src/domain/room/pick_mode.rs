//! Draft pick modes.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::TeamId;

/// How players are split into the two teams.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum PickMode {
    /// Shuffle and split; captains chosen at random.
    #[default]
    #[serde(rename = "random")]
    Random,
    /// Captain-driven picking in blocks of 1-2-2-1-1.
    #[serde(rename = "seq_A", alias = "12211")]
    SeqA,
    /// Captain-driven picking in blocks of 1-2-2-2-1.
    #[serde(rename = "seq_B", alias = "12221")]
    SeqB,
}

impl PickMode {
    pub fn is_sequential(&self) -> bool {
        !matches!(self, PickMode::Random)
    }

    /// Consecutive picks per turn, alternating teams starting with team 1.
    ///
    /// Empty for random mode.
    pub fn cadence(&self) -> &'static [usize] {
        match self {
            PickMode::Random => &[],
            PickMode::SeqA => &[1, 2, 2, 1, 1],
            PickMode::SeqB => &[1, 2, 2, 2, 1],
        }
    }

    /// Team that receives the last, auto-assigned player when it has room.
    pub fn terminal_team(&self) -> TeamId {
        match self {
            PickMode::SeqB => TeamId::ONE,
            PickMode::Random | PickMode::SeqA => TeamId::TWO,
        }
    }
}

impl fmt::Display for PickMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PickMode::Random => "random",
            PickMode::SeqA => "seq_A",
            PickMode::SeqB => "seq_B",
        };
        write!(f, "{}", s)
    }
}
