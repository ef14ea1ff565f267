//! Per-room serialization of durable mutations.
//!
//! Every operation that loads, mutates and saves a room runs under that
//! room's lock, so two captains picking at once cannot both pass the turn
//! check against the same snapshot.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::domain::foundation::RoomId;

#[derive(Default)]
pub struct RoomLocks {
    locks: Mutex<HashMap<RoomId, Arc<Mutex<()>>>>,
}

impl RoomLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to a room.
    pub async fn lock(&self, room_id: &RoomId) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;
            locks.entry(*room_id).or_default().clone()
        };
        lock.lock_owned().await
    }

    /// Forget a deleted room's lock.
    pub async fn remove(&self, room_id: &RoomId) {
        self.locks.lock().await.remove(room_id);
    }

    /// Drop a room's entry unless someone holds or awaits it.
    ///
    /// Call after releasing the guard of a lookup that found no room.
    /// Waiters clone the `Arc` under the table lock, so a count of one
    /// means the table holds the only reference.
    pub async fn release_if_idle(&self, room_id: &RoomId) {
        let mut locks = self.locks.lock().await;
        if locks
            .get(room_id)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            locks.remove(room_id);
        }
    }

    pub async fn len(&self) -> usize {
        self.locks.lock().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn second_locker_waits() {
        let locks = Arc::new(RoomLocks::new());
        let room = RoomId::new();
        let guard = locks.lock(&room).await;

        let contender = {
            let locks = locks.clone();
            tokio::spawn(async move {
                let _guard = locks.lock(&room).await;
            })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!contender.is_finished());

        drop(guard);
        tokio::time::timeout(Duration::from_secs(1), contender)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn idle_entry_is_released() {
        let locks = RoomLocks::new();
        let room = RoomId::new();
        drop(locks.lock(&room).await);
        locks.release_if_idle(&room).await;
        assert_eq!(locks.len().await, 0);
    }

    #[tokio::test]
    async fn held_or_awaited_entry_is_kept() {
        let locks = Arc::new(RoomLocks::new());
        let room = RoomId::new();
        let guard = locks.lock(&room).await;
        locks.release_if_idle(&room).await;
        assert_eq!(locks.len().await, 1);

        let waiter = {
            let locks = locks.clone();
            tokio::spawn(async move {
                let _guard = locks.lock(&room).await;
            })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        drop(guard);
        locks.release_if_idle(&room).await;
        waiter.await.unwrap();
        locks.release_if_idle(&room).await;
        assert_eq!(locks.len().await, 0);
    }

    #[tokio::test]
    async fn rooms_lock_independently() {
        let locks = RoomLocks::new();
        let _a = locks.lock(&RoomId::new()).await;
        let _b = locks.lock(&RoomId::new()).await;
        assert_eq!(locks.len().await, 2);
    }
}
