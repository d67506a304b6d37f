//! JWT issuing and verification.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Which lifecycle role a token plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenClass {
    Access,
    Refresh,
}

/// Claims carried by every session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Account id the token was issued for.
    pub sub: String,
    /// Issued-at, unix seconds.
    pub iat: i64,
    /// Expiry, unix seconds.
    pub exp: i64,
    /// Token class, checked on verification.
    pub class: TokenClass,
}

/// A freshly issued access/refresh pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Secrets and lifetimes for the issuer.
#[derive(Clone)]
pub struct TokenConfig {
    pub access_secret: String,
    pub refresh_secret: String,
    pub access_ttl_secs: i64,
    pub refresh_ttl_secs: i64,
}

/// Errors from issuing or verifying tokens.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    /// The token was well-formed and correctly signed but past its expiry.
    #[error("token expired")]
    Expired,

    /// Malformed, wrong signature, or wrong class. Deliberately not more
    /// specific than that.
    #[error("token invalid")]
    Invalid,

    /// Signing failed. Should not happen with HMAC keys.
    #[error("token encoding failed: {0}")]
    Encode(String),
}

type Clock = Box<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Issues and verifies session tokens.
pub struct TokenIssuer {
    access_encoding: EncodingKey,
    access_decoding: DecodingKey,
    refresh_encoding: EncodingKey,
    refresh_decoding: DecodingKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
    clock: Clock,
}

impl TokenIssuer {
    /// Create an issuer using the system clock.
    pub fn new(config: &TokenConfig) -> Self {
        Self::with_clock(config, Box::new(Utc::now))
    }

    /// Create an issuer with an injected clock. Issue timestamps come from
    /// the clock; expiry checks on verification always use real time.
    pub fn with_clock(config: &TokenConfig, clock: Clock) -> Self {
        Self {
            access_encoding: EncodingKey::from_secret(config.access_secret.as_bytes()),
            access_decoding: DecodingKey::from_secret(config.access_secret.as_bytes()),
            refresh_encoding: EncodingKey::from_secret(config.refresh_secret.as_bytes()),
            refresh_decoding: DecodingKey::from_secret(config.refresh_secret.as_bytes()),
            access_ttl: Duration::seconds(config.access_ttl_secs),
            refresh_ttl: Duration::seconds(config.refresh_ttl_secs),
            clock,
        }
    }

    /// How long refresh tokens live, for store bookkeeping.
    pub fn refresh_ttl(&self) -> Duration {
        self.refresh_ttl
    }

    /// Issue an access/refresh pair for an account.
    pub fn issue_pair(&self, account_id: &str) -> Result<TokenPair, TokenError> {
        let access_token = self.issue(account_id, TokenClass::Access)?;
        let refresh_token = self.issue(account_id, TokenClass::Refresh)?;
        debug!(account_id, "Issued token pair");
        Ok(TokenPair {
            access_token,
            refresh_token,
        })
    }

    /// Issue a short-lived access token.
    pub fn issue_access(&self, account_id: &str) -> Result<String, TokenError> {
        self.issue(account_id, TokenClass::Access)
    }

    /// Issue a long-lived refresh token.
    pub fn issue_refresh(&self, account_id: &str) -> Result<String, TokenError> {
        self.issue(account_id, TokenClass::Refresh)
    }

    /// Issue a single token of the given class.
    pub fn issue(&self, account_id: &str, class: TokenClass) -> Result<String, TokenError> {
        let now = (self.clock)();
        let ttl = match class {
            TokenClass::Access => self.access_ttl,
            TokenClass::Refresh => self.refresh_ttl,
        };
        let claims = Claims {
            sub: account_id.to_string(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
            class,
        };

        let key = match class {
            TokenClass::Access => &self.access_encoding,
            TokenClass::Refresh => &self.refresh_encoding,
        };
        encode(&Header::new(Algorithm::HS256), &claims, key)
            .map_err(|e| TokenError::Encode(e.to_string()))
    }

    /// Verify a token and require it to be of the given class.
    ///
    /// Expiry is the only condition reported distinctly; every other
    /// failure collapses into [`TokenError::Invalid`].
    pub fn verify(&self, token: &str, expected: TokenClass) -> Result<Claims, TokenError> {
        let key = match expected {
            TokenClass::Access => &self.access_decoding,
            TokenClass::Refresh => &self.refresh_decoding,
        };

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);

        let data = decode::<Claims>(token, key, &validation).map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => TokenError::Expired,
            _ => TokenError::Invalid,
        })?;

        if data.claims.class != expected {
            return Err(TokenError::Invalid);
        }
        Ok(data.claims)
    }
}

impl std::fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenIssuer")
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> TokenConfig {
        TokenConfig {
            access_secret: "access-secret-for-tests".to_string(),
            refresh_secret: "refresh-secret-for-tests".to_string(),
            access_ttl_secs: 900,
            refresh_ttl_secs: 2_592_000,
        }
    }

    #[test]
    fn test_issue_and_verify_pair() {
        let issuer = TokenIssuer::new(&test_config());
        let pair = issuer.issue_pair("01HX3Y5RWM").unwrap();

        let access = issuer.verify(&pair.access_token, TokenClass::Access).unwrap();
        assert_eq!(access.sub, "01HX3Y5RWM");
        assert_eq!(access.class, TokenClass::Access);

        let refresh = issuer
            .verify(&pair.refresh_token, TokenClass::Refresh)
            .unwrap();
        assert_eq!(refresh.sub, "01HX3Y5RWM");
        assert!(refresh.exp > access.exp);
    }

    #[test]
    fn test_cross_class_rejection() {
        let issuer = TokenIssuer::new(&test_config());
        let pair = issuer.issue_pair("acct").unwrap();

        // Wrong secret means the signature itself fails
        assert_eq!(
            issuer.verify(&pair.access_token, TokenClass::Refresh),
            Err(TokenError::Invalid)
        );
        assert_eq!(
            issuer.verify(&pair.refresh_token, TokenClass::Access),
            Err(TokenError::Invalid)
        );
    }

    #[test]
    fn test_class_claim_checked_when_secrets_match() {
        // Same secret for both classes: only the class claim separates them
        let config = TokenConfig {
            access_secret: "shared".to_string(),
            refresh_secret: "shared".to_string(),
            access_ttl_secs: 900,
            refresh_ttl_secs: 900,
        };
        let issuer = TokenIssuer::new(&config);
        let access = issuer.issue("acct", TokenClass::Access).unwrap();

        assert_eq!(
            issuer.verify(&access, TokenClass::Refresh),
            Err(TokenError::Invalid)
        );
    }

    #[test]
    fn test_expired_token() {
        let past = Utc::now() - Duration::hours(2);
        let issuer = TokenIssuer::with_clock(&test_config(), Box::new(move || past));
        let token = issuer.issue("acct", TokenClass::Access).unwrap();

        assert_eq!(
            issuer.verify(&token, TokenClass::Access),
            Err(TokenError::Expired)
        );
    }

    #[test]
    fn test_garbage_token() {
        let issuer = TokenIssuer::new(&test_config());
        assert_eq!(
            issuer.verify("not.a.jwt", TokenClass::Access),
            Err(TokenError::Invalid)
        );
        assert_eq!(issuer.verify("", TokenClass::Access), Err(TokenError::Invalid));
    }

    #[test]
    fn test_tampered_token() {
        let issuer = TokenIssuer::new(&test_config());
        let token = issuer.issue("acct", TokenClass::Access).unwrap();
        let mut tampered = token.clone();
        tampered.pop();

        assert_eq!(
            issuer.verify(&tampered, TokenClass::Access),
            Err(TokenError::Invalid)
        );
    }
}
