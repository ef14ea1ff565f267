//! Client → server events.

use serde::Deserialize;
use serde_json::Value;

use crate::domain::chat::ChatChannel;
use crate::domain::foundation::{RoomId, UserId, ValidationError};
use crate::domain::presence::VoiceChannel;
use crate::domain::room::{RoomParams, Side, TeamId};

/// Raw frame as received. `data` is validated per event by [`ClientEnvelope::parse`].
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientEnvelope {
    #[serde(default)]
    pub request_id: Option<String>,
    pub event: String,
    #[serde(default)]
    pub data: Value,
}

impl ClientEnvelope {
    /// Parse a text frame.
    pub fn from_json(text: &str) -> Result<Self, ValidationError> {
        serde_json::from_str(text)
            .map_err(|e| ValidationError::invalid_format("frame", e.to_string()))
    }

    /// Validate the payload against the event's schema.
    ///
    /// Missing `data` is treated as an empty object so payload-free events
    /// need not send one.
    pub fn parse(&self) -> Result<ClientEvent, ValidationError> {
        if !ClientEvent::NAMES.contains(&self.event.as_str()) {
            return Err(ValidationError::invalid_format(
                "event",
                format!("unknown event '{}'", self.event),
            ));
        }
        let data = match &self.data {
            Value::Null => Value::Object(Default::default()),
            other => other.clone(),
        };
        let tagged = serde_json::json!({ "event": self.event, "data": data });
        serde_json::from_value(tagged)
            .map_err(|e| ValidationError::invalid_format("data", e.to_string()))
    }
}

/// Every event a client may send.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ClientEvent {
    CreateRoom(RoomParams),
    Join(JoinPayload),
    Leave {},
    SwitchToPlayer {},
    SwitchToSpectator {},
    StartDraft {},
    DraftPick(DraftPickPayload),
    SelectSide(SelectSidePayload),
    EndGame {},
    SendMessage(SendMessagePayload),
    VoiceChannelJoin(VoiceJoinPayload),
    VoiceChannelLeave {},
    VoiceData(VoiceDataPayload),
    Mute(MutePayload),
    Kick(KickPayload),
    GetRoomSnapshot {},
}

impl ClientEvent {
    pub const NAMES: [&'static str; 16] = [
        "createRoom",
        "join",
        "leave",
        "switchToPlayer",
        "switchToSpectator",
        "startDraft",
        "draftPick",
        "selectSide",
        "endGame",
        "sendMessage",
        "voiceChannelJoin",
        "voiceChannelLeave",
        "voiceData",
        "mute",
        "kick",
        "getRoomSnapshot",
    ];
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinPayload {
    pub room_id: RoomId,
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftPickPayload {
    pub team_id: TeamId,
    pub target_user_id: UserId,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectSidePayload {
    pub team_id: TeamId,
    pub side: Side,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessagePayload {
    pub content: String,
    #[serde(default)]
    pub channel: ChatChannel,
    #[serde(default)]
    pub team_id: Option<TeamId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceJoinPayload {
    pub channel: VoiceChannel,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceDataPayload {
    /// Opaque encoded audio frame.
    pub payload: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MutePayload {
    pub muted: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KickPayload {
    pub target_user_id: UserId,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Result<ClientEvent, ValidationError> {
        ClientEnvelope::from_json(text)?.parse()
    }

    #[test]
    fn parses_draft_pick() {
        let event =
            parse(r#"{"event":"draftPick","data":{"teamId":2,"targetUserId":"u3"}}"#).unwrap();
        assert_eq!(
            event,
            ClientEvent::DraftPick(DraftPickPayload {
                team_id: TeamId::TWO,
                target_user_id: UserId::new("u3").unwrap(),
            })
        );
    }

    #[test]
    fn payload_free_events_accept_missing_data() {
        assert_eq!(parse(r#"{"event":"leave"}"#).unwrap(), ClientEvent::Leave {});
        assert_eq!(
            parse(r#"{"event":"getRoomSnapshot","data":{}}"#).unwrap(),
            ClientEvent::GetRoomSnapshot {}
        );
    }

    #[test]
    fn keeps_request_id() {
        let env = ClientEnvelope::from_json(r#"{"requestId":"42","event":"leave"}"#).unwrap();
        assert_eq!(env.request_id.as_deref(), Some("42"));
    }

    #[test]
    fn rejects_unknown_event() {
        let err = parse(r#"{"event":"selfDestruct"}"#).unwrap_err();
        assert_eq!(err.field(), "event");
    }

    #[test]
    fn rejects_missing_required_field() {
        let err = parse(r#"{"event":"draftPick","data":{"teamId":1}}"#).unwrap_err();
        assert_eq!(err.field(), "data");
    }

    #[test]
    fn rejects_out_of_range_team() {
        assert!(parse(r#"{"event":"selectSide","data":{"teamId":3,"side":"blue"}}"#).is_err());
        assert!(parse(r#"{"event":"selectSide","data":{"teamId":1,"side":"green"}}"#).is_err());
    }

    #[test]
    fn rejects_blank_user_id() {
        assert!(parse(r#"{"event":"kick","data":{"targetUserId":"  "}}"#).is_err());
    }

    #[test]
    fn send_message_defaults_to_public() {
        let event = parse(r#"{"event":"sendMessage","data":{"content":"gg"}}"#).unwrap();
        match event {
            ClientEvent::SendMessage(p) => {
                assert_eq!(p.channel, ChatChannel::Public);
                assert_eq!(p.team_id, None);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn create_room_accepts_legacy_pick_mode() {
        let event = parse(
            r#"{"event":"createRoom","data":{"name":"Scrim","playerCount":10,"pickMode":"12211"}}"#,
        )
        .unwrap();
        assert!(matches!(event, ClientEvent::CreateRoom(p) if p.player_count == 10));
    }

    #[test]
    fn rejects_non_json_frame() {
        assert!(ClientEnvelope::from_json("hello").is_err());
    }
}
