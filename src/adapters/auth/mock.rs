//! Mock authentication adapter for tests and local development.
//!
//! # Example
//!
//! ```ignore
//! let auth = MockAuthProvider::new()
//!     .with_test_user("token-a", "alice")
//!     .with_test_user("token-b", "bob");
//!
//! let user = auth.resolve("token-a").await?;
//! ```

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;

use crate::domain::foundation::{AuthError, AuthenticatedUser, UserId};
use crate::ports::AuthProvider;

/// Maps fixed tokens to users. Unknown tokens return `InvalidToken`.
#[derive(Debug, Default)]
pub struct MockAuthProvider {
    tokens: RwLock<HashMap<String, AuthenticatedUser>>,
    /// Returned for every call when set.
    force_error: RwLock<Option<AuthError>>,
}

impl MockAuthProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user(self, token: impl Into<String>, user: AuthenticatedUser) -> Self {
        self.add_token(token, user);
        self
    }

    /// Adds a token for a user whose display name is derived from the id.
    ///
    /// Blank ids are ignored.
    pub fn with_test_user(self, token: impl Into<String>, user_id: impl Into<String>) -> Self {
        let user_id = user_id.into();
        match UserId::new(user_id.clone()) {
            Ok(id) => {
                let user = AuthenticatedUser::new(id, format!("Player {}", user_id));
                self.with_user(token, user)
            }
            Err(_) => self,
        }
    }

    pub fn with_error(self, error: AuthError) -> Self {
        *self
            .force_error
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(error);
        self
    }

    pub fn add_token(&self, token: impl Into<String>, user: AuthenticatedUser) {
        self.tokens
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(token.into(), user);
    }

    pub fn remove_token(&self, token: &str) {
        self.tokens
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(token);
    }
}

#[async_trait]
impl AuthProvider for MockAuthProvider {
    async fn resolve(&self, token: &str) -> Result<AuthenticatedUser, AuthError> {
        if let Some(error) = self
            .force_error
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
        {
            return Err(error);
        }

        self.tokens
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(token)
            .cloned()
            .ok_or(AuthError::InvalidToken)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn resolves_registered_token() {
        let auth = MockAuthProvider::new().with_test_user("t", "alice");
        let user = auth.resolve("t").await.unwrap();
        assert_eq!(user.id.as_str(), "alice");
        assert_eq!(user.display_name, "Player alice");
    }

    #[tokio::test]
    async fn unknown_token_is_invalid() {
        let auth = MockAuthProvider::new();
        assert_eq!(auth.resolve("nope").await, Err(AuthError::InvalidToken));
    }

    #[tokio::test]
    async fn removed_token_stops_working() {
        let auth = MockAuthProvider::new().with_test_user("t", "alice");
        auth.remove_token("t");
        assert!(auth.resolve("t").await.is_err());
    }

    #[tokio::test]
    async fn forced_error_wins() {
        let auth = MockAuthProvider::new()
            .with_test_user("t", "alice")
            .with_error(AuthError::ServiceUnavailable("down".into()));
        assert!(matches!(
            auth.resolve("t").await,
            Err(AuthError::ServiceUnavailable(_))
        ));
    }
}
