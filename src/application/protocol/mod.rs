//! Real-time protocol.
//!
//! Closed set of client events, their acknowledgments and the push events
//! delivered to other connections. Nothing here depends on the transport;
//! the WebSocket adapter only moves these values as JSON text frames.
//!
//! # Wire shape
//!
//! ```text
//! client → server   { "requestId": "7", "event": "draftPick", "data": { "teamId": 1, "targetUserId": "u3" } }
//! server → client   { "type": "ack",  "requestId": "7", "event": "draftPick", "status": "success", "data": {...}, "message": "..." }
//! server → client   { "type": "push", "event": "draft.picked", "roomId": "...", "payload": {...}, "deliveredAt": "..." }
//! ```

mod client;
mod server;
mod views;

pub use client::{
    ClientEnvelope, ClientEvent, DraftPickPayload, JoinPayload, KickPayload, MutePayload,
    SelectSidePayload, SendMessagePayload, VoiceDataPayload, VoiceJoinPayload,
};
pub use server::{Ack, AckError, AckStatus, PushEvent, PushKind, ServerMessage};
pub use views::{
    MemberView, PlayerView, RoomSnapshot, RoomView, SelfView, SpectatorView, VoiceMember,
    VoiceRosters,
};
