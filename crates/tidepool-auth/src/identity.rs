//! Provider-token verification seam.

use crate::error::AuthResult;
use crate::session::VerifiedIdentity;
use async_trait::async_trait;

/// Verifies a raw identity-provider token and extracts the identity it
/// attests to.
///
/// Implementations talk to the provider; this crate only sees the result.
/// A token that fails verification must come back as
/// [`AuthError::InvalidCredentials`](crate::AuthError::InvalidCredentials)
/// so the HTTP surface answers 401 without saying why.
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    async fn verify(&self, provider_token: &str) -> AuthResult<VerifiedIdentity>;
}
