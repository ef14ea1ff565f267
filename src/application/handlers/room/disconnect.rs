//! DisconnectHandler - transport closed.
//!
//! Durable membership is kept so the user can reconnect. Only the live
//! session is dropped.

use std::sync::Arc;

use crate::domain::foundation::ConnectionId;
use crate::domain::presence::ConnectionSession;

use super::context::RoomContext;

pub struct DisconnectHandler {
    ctx: Arc<RoomContext>,
}

impl DisconnectHandler {
    pub fn new(ctx: Arc<RoomContext>) -> Self {
        Self { ctx }
    }

    /// Returns the session the connection held, if any.
    pub async fn handle(&self, connection_id: &ConnectionId) -> Option<ConnectionSession> {
        let session = self.ctx.registry.unregister(connection_id).await?;
        self.ctx.vacate(&session).await;
        tracing::info!(
            room_id = %session.room_id,
            user_id = %session.user_id,
            connection_id = %connection_id,
            "Member disconnected"
        );
        Some(session)
    }
}
