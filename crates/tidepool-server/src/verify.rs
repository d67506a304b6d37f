//! Identity-provider token verification.

use async_trait::async_trait;
use serde::Deserialize;
use tidepool_auth::{AuthError, AuthResult, IdentityVerifier, VerifiedIdentity};
use tracing::{debug, warn};

#[derive(Debug, Deserialize)]
struct IdentityClaims {
    email: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    picture: Option<String>,
}

/// Verifies provider tokens against an HTTP verification endpoint.
///
/// The endpoint receives the raw token as a bearer credential and, when
/// the token is genuine, answers with the identity claims it attests to.
/// Any rejection collapses into
/// [`AuthError::InvalidCredentials`]; the caller learns nothing about why
/// the token failed.
pub struct HttpIdentityVerifier {
    http_client: reqwest::Client,
    verify_url: String,
}

impl HttpIdentityVerifier {
    pub fn new(verify_url: impl Into<String>) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            verify_url: verify_url.into(),
        }
    }
}

#[async_trait]
impl IdentityVerifier for HttpIdentityVerifier {
    async fn verify(&self, provider_token: &str) -> AuthResult<VerifiedIdentity> {
        let response = self
            .http_client
            .get(&self.verify_url)
            .bearer_auth(provider_token)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| AuthError::Token(e.to_string()))?;

        if !response.status().is_success() {
            debug!(status = %response.status(), "Provider rejected identity token");
            return Err(AuthError::InvalidCredentials);
        }

        let claims: IdentityClaims = response
            .json()
            .await
            .map_err(|e| AuthError::Token(e.to_string()))?;
        if claims.email.trim().is_empty() {
            debug!("Provider response carried no email");
            return Err(AuthError::InvalidCredentials);
        }

        Ok(VerifiedIdentity {
            email: claims.email,
            name: claims.name,
            picture: claims.picture,
        })
    }
}

/// Verifier used when no verification endpoint is configured. Rejects
/// every token, which keeps the identity-login route closed.
pub struct DisabledVerifier;

#[async_trait]
impl IdentityVerifier for DisabledVerifier {
    async fn verify(&self, _provider_token: &str) -> AuthResult<VerifiedIdentity> {
        warn!("Identity login attempted but no verifier endpoint is configured");
        Err(AuthError::InvalidCredentials)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_disabled_verifier_rejects_every_token() {
        let err = DisabledVerifier.verify("anything").await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
    }
}
