//! Room domain module.
//!
//! The durable room aggregate and the draft engine that operates on it.
//!
//! # Lifecycle
//!
//! - `waiting` - members join, switch roles and leave freely
//! - `picking` - captains draft unassigned players in turn
//! - `side_picking` - a captain chooses blue or red
//! - `gaming` - match underway; players cannot leave
//! - `ended` - terminal

mod aggregate;
mod draft;
mod errors;
mod members;
mod password;
mod pick_mode;
mod status;
mod team;

pub use aggregate::{
    JoinOutcome, Removal, Room, RoomParams, GAME_TYPE, MAX_DESCRIPTION_LENGTH, MAX_NAME_LENGTH,
    MAX_PLAYER_COUNT, MIN_NAME_LENGTH, MIN_PLAYER_COUNT,
};
pub use draft::{build_pick_order, team_targets, DraftEngine, PickOutcome, SideOutcome};
pub use errors::RoomError;
pub use members::{MemberRole, MemberStatus, Player, Spectator};
pub use password::PasswordHash;
pub use pick_mode::PickMode;
pub use status::RoomStatus;
pub use team::{Side, Team, TeamId};
