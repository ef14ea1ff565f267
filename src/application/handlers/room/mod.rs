//! Room command handlers, one per client event.
//!
//! Every mutating handler follows the same order: lock the room, load it,
//! mutate a copy, save, re-sync live sessions, then announce. A failed
//! mutation returns before anything is saved or broadcast.

mod context;
mod create_room;
mod disconnect;
mod draft_pick;
mod end_game;
mod join_room;
mod leave_room;
mod select_side;
mod send_message;
mod snapshot;
mod start_draft;
mod switch_role;
mod voice;

pub use context::{Actor, RoomContext, RoomSettings};
pub use create_room::{CreateRoomCommand, CreateRoomHandler, CreateRoomResult};
pub use disconnect::DisconnectHandler;
pub use draft_pick::{DraftPickCommand, DraftPickHandler, DraftPickResult};
pub use end_game::{EndGameHandler, EndGameResult};
pub use join_room::{JoinRoomCommand, JoinRoomHandler, JoinRoomResult};
pub use leave_room::{
    KickMemberCommand, KickMemberHandler, KickMemberResult, LeaveRoomHandler, LeaveRoomResult,
};
pub use select_side::{SelectSideCommand, SelectSideHandler, SelectSideResult};
pub use send_message::{SendMessageCommand, SendMessageHandler};
pub use snapshot::GetSnapshotHandler;
pub use start_draft::{StartDraftHandler, StartDraftResult};
pub use switch_role::{SwitchRoleCommand, SwitchRoleHandler, SwitchRoleResult};
pub use voice::VoiceHandler;
