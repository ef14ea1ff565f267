//! Server → client messages.

use serde::Serialize;
use serde_json::Value;

use crate::domain::foundation::{ErrorCode, RoomId, Timestamp};
use crate::domain::room::RoomError;

/// Everything written to a connection.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ServerMessage {
    /// Reply to one client event.
    Ack(Ack),
    /// Unsolicited notification.
    Push(PushEvent),
}

impl ServerMessage {
    pub fn as_push(&self) -> Option<&PushEvent> {
        match self {
            ServerMessage::Push(push) => Some(push),
            ServerMessage::Ack(_) => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AckStatus {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AckError {
    pub code: ErrorCode,
    pub kind: String,
}

/// Structured acknowledgment `{status, data | error, message}`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Ack {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    pub event: String,
    pub status: AckStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<AckError>,
    pub message: String,
}

impl Ack {
    pub fn success(
        event: impl Into<String>,
        request_id: Option<String>,
        data: Value,
        message: impl Into<String>,
    ) -> Self {
        Self {
            request_id,
            event: event.into(),
            status: AckStatus::Success,
            data: Some(data),
            error: None,
            message: message.into(),
        }
    }

    pub fn failure(event: impl Into<String>, request_id: Option<String>, err: &RoomError) -> Self {
        Self {
            request_id,
            event: event.into(),
            status: AckStatus::Error,
            data: None,
            error: Some(AckError {
                code: err.code(),
                kind: err.kind().to_string(),
            }),
            message: err.to_string(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == AckStatus::Success
    }

    pub fn error_code(&self) -> Option<ErrorCode> {
        self.error.as_ref().map(|e| e.code)
    }
}

/// Names of push events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum PushKind {
    #[serde(rename = "member.joined")]
    MemberJoined,
    #[serde(rename = "member.reconnected")]
    MemberReconnected,
    #[serde(rename = "member.disconnected")]
    MemberDisconnected,
    #[serde(rename = "member.left")]
    MemberLeft,
    #[serde(rename = "member.kicked")]
    MemberKicked,
    #[serde(rename = "member.roleChanged")]
    MemberRoleChanged,
    #[serde(rename = "room.ownerChanged")]
    RoomOwnerChanged,
    #[serde(rename = "room.updated")]
    RoomUpdated,
    #[serde(rename = "room.deleted")]
    RoomDeleted,
    #[serde(rename = "draft.started")]
    DraftStarted,
    #[serde(rename = "draft.picked")]
    DraftPicked,
    #[serde(rename = "team.sideSelected")]
    TeamSideSelected,
    #[serde(rename = "game.ended")]
    GameEnded,
    #[serde(rename = "chat.message")]
    ChatMessage,
    #[serde(rename = "voice.joined")]
    VoiceJoined,
    #[serde(rename = "voice.left")]
    VoiceLeft,
    #[serde(rename = "voice.data")]
    VoiceData,
    #[serde(rename = "voice.mute")]
    VoiceMute,
    #[serde(rename = "session.replaced")]
    SessionReplaced,
    #[serde(rename = "roomList.updated")]
    RoomListUpdated,
}

impl PushKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PushKind::MemberJoined => "member.joined",
            PushKind::MemberReconnected => "member.reconnected",
            PushKind::MemberDisconnected => "member.disconnected",
            PushKind::MemberLeft => "member.left",
            PushKind::MemberKicked => "member.kicked",
            PushKind::MemberRoleChanged => "member.roleChanged",
            PushKind::RoomOwnerChanged => "room.ownerChanged",
            PushKind::RoomUpdated => "room.updated",
            PushKind::RoomDeleted => "room.deleted",
            PushKind::DraftStarted => "draft.started",
            PushKind::DraftPicked => "draft.picked",
            PushKind::TeamSideSelected => "team.sideSelected",
            PushKind::GameEnded => "game.ended",
            PushKind::ChatMessage => "chat.message",
            PushKind::VoiceJoined => "voice.joined",
            PushKind::VoiceLeft => "voice.left",
            PushKind::VoiceData => "voice.data",
            PushKind::VoiceMute => "voice.mute",
            PushKind::SessionReplaced => "session.replaced",
            PushKind::RoomListUpdated => "roomList.updated",
        }
    }
}

impl std::fmt::Display for PushKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A notification with its delivery timestamp.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PushEvent {
    pub event: PushKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub room_id: Option<RoomId>,
    pub payload: Value,
    pub delivered_at: Timestamp,
}

impl PushEvent {
    pub fn new(event: PushKind, room_id: Option<RoomId>, payload: Value) -> Self {
        Self {
            event,
            room_id,
            payload,
            delivered_at: Timestamp::now(),
        }
    }
}
