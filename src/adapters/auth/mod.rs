//! Authentication adapters.
//!
//! Implementations of the `AuthProvider` port:
//!
//! - `jwt` - HS256 shared-secret tokens issued by the account service
//! - `mock` - Test implementation that maps fixed tokens to users

mod jwt;
mod mock;

pub use jwt::{JwtAuthProvider, JwtClaims};
pub use mock::MockAuthProvider;
