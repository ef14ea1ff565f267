//! In-memory user directory.
//!
//! Learns profiles from authenticated connections; there is no account
//! database behind it.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::foundation::UserId;
use crate::domain::room::RoomError;
use crate::ports::{UserDirectory, UserProfile};

#[derive(Debug, Clone, Default)]
pub struct InMemoryUserDirectory {
    profiles: Arc<RwLock<HashMap<UserId, UserProfile>>>,
}

impl InMemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn profile(&self, user_id: &UserId) -> Result<Option<UserProfile>, RoomError> {
        Ok(self.profiles.read().await.get(user_id).cloned())
    }

    async fn remember(&self, profile: UserProfile) -> Result<(), RoomError> {
        self.profiles
            .write()
            .await
            .insert(profile.user_id.clone(), profile);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(id: &str, name: &str) -> UserProfile {
        UserProfile {
            user_id: UserId::new(id).unwrap(),
            username: name.to_string(),
            avatar: None,
        }
    }

    #[tokio::test]
    async fn remembers_latest_profile() {
        let dir = InMemoryUserDirectory::new();
        dir.remember(profile("u1", "old")).await.unwrap();
        dir.remember(profile("u1", "new")).await.unwrap();
        let found = dir.profile(&UserId::new("u1").unwrap()).await.unwrap();
        assert_eq!(found.unwrap().username, "new");
    }

    #[tokio::test]
    async fn batch_lookup_skips_unknown() {
        let dir = InMemoryUserDirectory::new();
        dir.remember(profile("u1", "Una")).await.unwrap();
        let ids = [UserId::new("u1").unwrap(), UserId::new("ghost").unwrap()];
        let found = dir.profiles(&ids).await.unwrap();
        assert_eq!(found.len(), 1);
    }
}
