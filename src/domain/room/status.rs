//! RoomStatus enum for tracking the lifecycle of a scrim room.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status of a room.
///
/// ```text
/// waiting ─┬─> picking ──> side_picking ──> gaming ──> ended
///          └──────────────────────────────> gaming
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RoomStatus {
    #[default]
    Waiting,
    Picking,
    SidePicking,
    Gaming,
    Ended,
}

impl RoomStatus {
    /// Validates a transition from this status to another.
    pub fn can_transition_to(&self, target: &RoomStatus) -> bool {
        use RoomStatus::*;
        matches!(
            (self, target),
            (Waiting, Picking)
                | (Waiting, SidePicking)
                | (Waiting, Gaming)
                | (Picking, SidePicking)
                | (SidePicking, Gaming)
                | (Picking, Ended)
                | (SidePicking, Ended)
                | (Gaming, Ended)
        )
    }

    /// Returns true while the draft or the match is underway.
    ///
    /// Players cannot leave or switch roles in these phases.
    pub fn is_in_progress(&self) -> bool {
        matches!(
            self,
            RoomStatus::Picking | RoomStatus::SidePicking | RoomStatus::Gaming
        )
    }
}

impl fmt::Display for RoomStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RoomStatus::Waiting => "waiting",
            RoomStatus::Picking => "picking",
            RoomStatus::SidePicking => "side_picking",
            RoomStatus::Gaming => "gaming",
            RoomStatus::Ended => "ended",
        };
        write!(f, "{}", s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_waiting() {
        assert_eq!(RoomStatus::default(), RoomStatus::Waiting);
    }

    #[test]
    fn random_draft_skips_straight_to_gaming() {
        assert!(RoomStatus::Waiting.can_transition_to(&RoomStatus::Gaming));
    }

    #[test]
    fn ended_is_terminal() {
        for target in [
            RoomStatus::Waiting,
            RoomStatus::Picking,
            RoomStatus::SidePicking,
            RoomStatus::Gaming,
            RoomStatus::Ended,
        ] {
            assert!(!RoomStatus::Ended.can_transition_to(&target));
        }
    }

    #[test]
    fn cannot_go_back_to_waiting() {
        assert!(!RoomStatus::Picking.can_transition_to(&RoomStatus::Waiting));
        assert!(!RoomStatus::Gaming.can_transition_to(&RoomStatus::Waiting));
    }

    #[test]
    fn display_matches_serde_name() {
        let json = serde_json::to_string(&RoomStatus::SidePicking).unwrap();
        assert_eq!(json, format!("\"{}\"", RoomStatus::SidePicking));
    }
}
