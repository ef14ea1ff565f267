//! Authentication types for the domain layer.
//!
//! An `AuthenticatedUser` is what the `AuthProvider` port resolves a bearer
//! credential into. It is resolved once per connection attempt and then
//! travels with the connection for its whole lifetime.

use super::UserId;
use thiserror::Error;

/// Identity attached to a live connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    /// The unique user identifier from the auth provider.
    pub id: UserId,

    /// Name shown to other room members.
    pub display_name: String,
}

impl AuthenticatedUser {
    /// Creates a new authenticated user.
    ///
    /// A blank display name falls back to the user id.
    pub fn new(id: UserId, display_name: impl Into<String>) -> Self {
        let display_name = display_name.into();
        let display_name = if display_name.trim().is_empty() {
            id.as_str().to_string()
        } else {
            display_name
        };
        Self { id, display_name }
    }
}

/// Authentication errors that can occur during credential resolution.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// The credential is missing, malformed, or has an invalid signature.
    #[error("Invalid or expired token")]
    InvalidToken,

    /// The token has expired (separate from InvalidToken for specific handling).
    #[error("Token expired")]
    TokenExpired,

    /// The authentication service is unavailable (network, config, etc.).
    #[error("Auth service unavailable: {0}")]
    ServiceUnavailable(String),
}

impl AuthError {
    // Creates a service unavailable error with a message.
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_user_id() -> UserId {
        UserId::new("user-123").unwrap()
    }

    #[test]
    fn authenticated_user_keeps_display_name() {
        let user = AuthenticatedUser::new(test_user_id(), "Alice");
        assert_eq!(user.display_name, "Alice");
    }

    #[test]
    fn blank_display_name_falls_back_to_id() {
        let user = AuthenticatedUser::new(test_user_id(), "  ");
        assert_eq!(user.display_name, "user-123");
    }

    #[test]
    fn auth_error_token_expired_displays_correctly() {
        assert_eq!(format!("{}", AuthError::TokenExpired), "Token expired");
    }
}
