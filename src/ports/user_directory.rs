//! User directory port for presentation lookups.

use async_trait::async_trait;
use serde::Serialize;

use crate::domain::foundation::UserId;
use crate::domain::room::RoomError;

/// Public profile fields shown next to a member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub user_id: UserId,
    pub username: String,
    pub avatar: Option<String>,
}

/// Looks up usernames and avatars. Never consulted for authorization.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Returns `None` for unknown users.
    async fn profile(&self, user_id: &UserId) -> Result<Option<UserProfile>, RoomError>;

    /// Batch lookup; unknown users are omitted.
    async fn profiles(&self, user_ids: &[UserId]) -> Result<Vec<UserProfile>, RoomError> {
        let mut found = Vec::with_capacity(user_ids.len());
        for id in user_ids {
            if let Some(profile) = self.profile(id).await? {
                found.push(profile);
            }
        }
        Ok(found)
    }

    /// Remember the display name a user authenticated with.
    async fn remember(&self, profile: UserProfile) -> Result<(), RoomError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_directory_is_object_safe() {
        fn _accepts_dyn(_dir: &dyn UserDirectory) {}
    }
}
