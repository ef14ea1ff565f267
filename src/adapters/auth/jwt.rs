//! HS256 JWT adapter for connection credentials.
//!
//! Tokens are issued by the account service with a shared secret. This
//! adapter validates them by:
//!
//! 1. Checking the HS256 signature against the configured secret
//! 2. Validating expiry, and issuer/audience when configured
//! 3. Mapping `sub` and `name`/`preferred_username` to `AuthenticatedUser`

use async_trait::async_trait;
use jsonwebtoken::{decode, errors::ErrorKind, Algorithm, DecodingKey, Validation};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};

use crate::config::AuthConfig;
use crate::domain::foundation::{AuthError, AuthenticatedUser, UserId};
use crate::ports::AuthProvider;

/// Claims carried by account-service tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtClaims {
    /// Subject - the user ID
    pub sub: String,
    /// Expiry timestamp (Unix epoch seconds)
    pub exp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_username: Option<String>,
}

/// Shared-secret JWT validator.
pub struct JwtAuthProvider {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtAuthProvider {
    pub fn new(config: &AuthConfig) -> Self {
        let decoding_key = DecodingKey::from_secret(config.jwt_secret.expose_secret().as_bytes());

        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.set_required_spec_claims(&["exp", "sub"]);
        if let Some(issuer) = &config.issuer {
            validation.set_issuer(&[issuer]);
        }
        match &config.audience {
            Some(audience) => validation.set_audience(&[audience]),
            None => validation.validate_aud = false,
        }

        Self {
            decoding_key,
            validation,
        }
    }
}

#[async_trait]
impl AuthProvider for JwtAuthProvider {
    async fn resolve(&self, token: &str) -> Result<AuthenticatedUser, AuthError> {
        let data = decode::<JwtClaims>(token, &self.decoding_key, &self.validation).map_err(
            |e| match e.kind() {
                ErrorKind::ExpiredSignature => {
                    tracing::debug!("Token expired");
                    AuthError::TokenExpired
                }
                ErrorKind::InvalidIssuer => {
                    tracing::warn!("Invalid issuer in token");
                    AuthError::InvalidToken
                }
                ErrorKind::InvalidAudience => {
                    tracing::warn!("Invalid audience in token");
                    AuthError::InvalidToken
                }
                _ => {
                    tracing::warn!(error = %e, "Token validation failed");
                    AuthError::InvalidToken
                }
            },
        )?;
        let claims = data.claims;

        let user_id = UserId::new(&claims.sub).map_err(|_| {
            tracing::warn!("Token has a blank subject");
            AuthError::InvalidToken
        })?;
        let display_name = claims
            .name
            .or(claims.preferred_username)
            .unwrap_or_default();

        Ok(AuthenticatedUser::new(user_id, display_name))
    }
}

impl std::fmt::Debug for JwtAuthProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtAuthProvider").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use secrecy::SecretString;

    const SECRET: &str = "test-secret-at-least-32-bytes-long!!";

    fn config(issuer: Option<&str>, audience: Option<&str>) -> AuthConfig {
        AuthConfig {
            jwt_secret: SecretString::new(SECRET.to_string()),
            issuer: issuer.map(String::from),
            audience: audience.map(String::from),
        }
    }

    fn token(claims: &JwtClaims, secret: &str) -> String {
        encode(
            &Header::new(Algorithm::HS256),
            claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    fn claims(exp_offset: i64) -> JwtClaims {
        JwtClaims {
            sub: "user-1".to_string(),
            exp: chrono::Utc::now().timestamp() + exp_offset,
            iss: Some("accounts".to_string()),
            aud: Some("scrim-rooms".to_string()),
            name: Some("Faker".to_string()),
            preferred_username: None,
        }
    }

    #[tokio::test]
    async fn accepts_valid_token() {
        let provider = JwtAuthProvider::new(&config(Some("accounts"), Some("scrim-rooms")));
        let user = provider.resolve(&token(&claims(3600), SECRET)).await.unwrap();
        assert_eq!(user.id.as_str(), "user-1");
        assert_eq!(user.display_name, "Faker");
    }

    #[tokio::test]
    async fn rejects_wrong_signature() {
        let provider = JwtAuthProvider::new(&config(None, None));
        let result = provider
            .resolve(&token(&claims(3600), "another-secret-of-enough-length!!"))
            .await;
        assert_eq!(result, Err(AuthError::InvalidToken));
    }

    #[tokio::test]
    async fn reports_expired_token() {
        let provider = JwtAuthProvider::new(&config(None, None));
        let result = provider.resolve(&token(&claims(-3600), SECRET)).await;
        assert_eq!(result, Err(AuthError::TokenExpired));
    }

    #[tokio::test]
    async fn rejects_wrong_issuer() {
        let provider = JwtAuthProvider::new(&config(Some("someone-else"), None));
        let result = provider.resolve(&token(&claims(3600), SECRET)).await;
        assert_eq!(result, Err(AuthError::InvalidToken));
    }

    #[tokio::test]
    async fn falls_back_to_user_id_for_display_name() {
        let provider = JwtAuthProvider::new(&config(None, None));
        let mut c = claims(3600);
        c.name = None;
        let user = provider.resolve(&token(&c, SECRET)).await.unwrap();
        assert_eq!(user.display_name, "user-1");
    }

    #[tokio::test]
    async fn rejects_garbage() {
        let provider = JwtAuthProvider::new(&config(None, None));
        assert_eq!(
            provider.resolve("not-a-jwt").await,
            Err(AuthError::InvalidToken)
        );
    }
}
