//! SendMessageHandler - chat from a member.

use std::sync::Arc;

use crate::domain::chat::{ChatChannel, ChatMessage};
use crate::domain::room::{RoomError, TeamId};

use super::context::{Actor, RoomContext};

#[derive(Debug, Clone)]
pub struct SendMessageCommand {
    pub content: String,
    pub channel: ChatChannel,
    pub team_id: Option<TeamId>,
}

pub struct SendMessageHandler {
    ctx: Arc<RoomContext>,
}

impl SendMessageHandler {
    pub fn new(ctx: Arc<RoomContext>) -> Self {
        Self { ctx }
    }

    /// Team eligibility is read from the session, which mirrors the last
    /// saved room.
    pub async fn handle(&self, actor: &Actor, cmd: SendMessageCommand) -> Result<ChatMessage, RoomError> {
        let session = self.ctx.current_session(actor).await?;
        self.ctx
            .chat
            .send(&session, &cmd.content, cmd.channel, cmd.team_id)
            .await
    }
}
