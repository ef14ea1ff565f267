//! Auth provider port for connection credentials.
//!
//! Every connection attempt presents a bearer credential once. The provider
//! resolves it to the user the connection acts as for its whole lifetime.
//!
//! # Security Requirements
//!
//! Implementations MUST validate signature and expiry, and issuer/audience
//! when configured.

use async_trait::async_trait;

use crate::domain::foundation::{AuthError, AuthenticatedUser};

/// Resolves bearer credentials to users.
///
/// # Contract
///
/// - `AuthError::InvalidToken` for malformed or badly signed tokens
/// - `AuthError::TokenExpired` for expired tokens
/// - `AuthError::ServiceUnavailable` for transient errors
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Resolve a raw token (without the `Bearer ` prefix).
    async fn resolve(&self, token: &str) -> Result<AuthenticatedUser, AuthError>;
}
