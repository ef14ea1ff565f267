//! Room list notifiers.
//!
//! The broadcast notifier fans changes out to any number of subscribers
//! (the WebSocket layer forwards them as `roomList.updated`). Lagging
//! subscribers lose the oldest changes.

use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::domain::room::RoomError;
use crate::ports::{RoomListChange, RoomListNotifier};

/// Default number of buffered changes per subscriber.
const DEFAULT_CAPACITY: usize = 256;

#[derive(Debug, Clone)]
pub struct BroadcastRoomListNotifier {
    sender: broadcast::Sender<RoomListChange>,
}

impl BroadcastRoomListNotifier {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<RoomListChange> {
        self.sender.subscribe()
    }
}

impl Default for BroadcastRoomListNotifier {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[async_trait]
impl RoomListNotifier for BroadcastRoomListNotifier {
    async fn notify(&self, change: RoomListChange) -> Result<(), RoomError> {
        // No subscribers is fine.
        let _ = self.sender.send(change);
        Ok(())
    }
}

/// Discards every change.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopRoomListNotifier;

#[async_trait]
impl RoomListNotifier for NoopRoomListNotifier {
    async fn notify(&self, _change: RoomListChange) -> Result<(), RoomError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::RoomId;

    #[tokio::test]
    async fn subscribers_receive_changes() {
        let notifier = BroadcastRoomListNotifier::new(8);
        let mut rx = notifier.subscribe();
        let id = RoomId::new();

        notifier.notify(RoomListChange::Deleted(id)).await.unwrap();
        assert_eq!(rx.recv().await.unwrap(), RoomListChange::Deleted(id));
    }

    #[tokio::test]
    async fn notify_without_subscribers_succeeds() {
        let notifier = BroadcastRoomListNotifier::default();
        assert!(notifier
            .notify(RoomListChange::Deleted(RoomId::new()))
            .await
            .is_ok());
    }
}
