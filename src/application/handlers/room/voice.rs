//! VoiceHandler - channel membership, mute and frame relay.

use std::sync::Arc;

use crate::domain::presence::{ConnectionSession, VoiceChannel};
use crate::domain::room::RoomError;

use super::context::{Actor, RoomContext};

pub struct VoiceHandler {
    ctx: Arc<RoomContext>,
}

impl VoiceHandler {
    pub fn new(ctx: Arc<RoomContext>) -> Self {
        Self { ctx }
    }

    pub async fn join(&self, actor: &Actor, channel: VoiceChannel) -> Result<ConnectionSession, RoomError> {
        self.ctx.voice.join_channel(&actor.connection_id, channel).await
    }

    pub async fn leave(&self, actor: &Actor) -> Result<ConnectionSession, RoomError> {
        self.ctx.voice.leave_channel(&actor.connection_id).await
    }

    pub async fn mute(&self, actor: &Actor, muted: bool) -> Result<ConnectionSession, RoomError> {
        self.ctx.voice.set_mute(&actor.connection_id, muted).await
    }

    /// Returns how many listeners received the frame.
    pub async fn relay(&self, actor: &Actor, payload: String) -> Result<usize, RoomError> {
        self.ctx.voice.forward(&actor.connection_id, payload).await
    }
}
