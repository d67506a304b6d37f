//! Session lifecycle management.
//!
//! Each account has at most one live refresh lineage:
//!
//! ```text
//! NoSession --login--> Active(H1) --refresh--> Active(H2) --...--> logout --> NoSession
//! ```
//!
//! Only the hash of the current refresh token is stored (`H1`, `H2`, ...).
//! Any presented refresh token whose hash differs from the stored one is
//! rejected, so a rotated-out or logged-out token is dead on replay.

use crate::error::{AuthError, AuthResult};
use chrono::Utc;
use std::sync::Arc;
use tidepool_credentials as credentials;
use tidepool_store::{
    AccountPublic, AccountRecord, AccountStore, NewAccountRow, ProfileUpdate, StoreError,
    ACCOUNT_STATUS_ACTIVE,
};
use tidepool_tokens::{TokenClass, TokenError, TokenIssuer, TokenPair};
use tracing::{debug, info, warn};
use ulid::Ulid;

/// Result of a successful login: the public account plus a fresh pair.
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub account: AccountPublic,
    pub access_token: String,
    pub refresh_token: String,
}

/// An identity already verified by an external provider.
///
/// Only an [`IdentityVerifier`](crate::IdentityVerifier) produces one
/// from a raw provider token; by the time this type exists, the email
/// is trusted.
#[derive(Debug, Clone)]
pub struct VerifiedIdentity {
    pub email: String,
    pub name: String,
    pub picture: Option<String>,
}

/// Registration request.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub email: String,
    pub password: String,
    pub name: String,
}

/// Drives login, refresh rotation, logout, and registration.
pub struct SessionManager {
    store: Arc<dyn AccountStore>,
    tokens: Arc<TokenIssuer>,
}

impl SessionManager {
    /// Create a new session manager.
    pub fn new(store: Arc<dyn AccountStore>, tokens: Arc<TokenIssuer>) -> Self {
        Self { store, tokens }
    }

    /// Password login.
    ///
    /// Unknown email and wrong password both return
    /// [`AuthError::InvalidCredentials`]; callers learn nothing about
    /// which accounts exist.
    pub async fn login(&self, email: &str, password: &str) -> AuthResult<LoginOutcome> {
        let Some(account) = self.store.find_by_email(email).await? else {
            debug!("Login failed: no matching account");
            return Err(AuthError::InvalidCredentials);
        };

        if !credentials::verify(&account.password, password) {
            debug!(account_id = %account.id, "Login failed: password mismatch");
            return Err(AuthError::InvalidCredentials);
        }

        self.open_session(account).await
    }

    /// Login via an externally verified identity.
    ///
    /// First login through a provider creates the account with a random
    /// locked password, hashed like any real one. The plaintext is
    /// discarded, so password login can never match such an account.
    pub async fn login_with_verified_identity(
        &self,
        identity: VerifiedIdentity,
    ) -> AuthResult<LoginOutcome> {
        if let Some(account) = self.store.find_by_email(&identity.email).await? {
            return self.open_session(account).await;
        }

        let placeholder = credentials::locked_password()?;
        let name = if identity.name.trim().is_empty() {
            identity.email.clone()
        } else {
            identity.name.clone()
        };
        let row = NewAccountRow {
            id: Ulid::new().to_string(),
            email: identity.email.clone(),
            password: credentials::hash(&placeholder)?,
            name,
            created_at: Utc::now(),
            status: ACCOUNT_STATUS_ACTIVE,
            profile_image: identity.picture.unwrap_or_default(),
            profile_description: String::new(),
        };

        let account = match self.store.insert_account(&row).await {
            Ok(account) => {
                info!(account_id = %account.id, "Account created from external identity");
                account
            }
            // Concurrent first login through the same identity; the other
            // request's row wins.
            Err(StoreError::Conflict) => self
                .store
                .find_by_email(&identity.email)
                .await?
                .ok_or(AuthError::Store(StoreError::Conflict))?,
            Err(e) => return Err(e.into()),
        };

        self.open_session(account).await
    }

    /// Exchange a refresh token for a new pair, rotating the lineage.
    ///
    /// Signature, structure, and expiry failures all collapse into
    /// [`AuthError::InvalidOrExpiredRefreshToken`]. A well-formed token
    /// that does not match the stored hash (rotated out, logged out, or
    /// the account vanished) is [`AuthError::RefreshTokenMismatch`].
    pub async fn refresh(&self, refresh_token: &str) -> AuthResult<TokenPair> {
        let claims = self
            .tokens
            .verify(refresh_token, TokenClass::Refresh)
            .map_err(|e| match e {
                TokenError::Expired | TokenError::Invalid => {
                    AuthError::InvalidOrExpiredRefreshToken
                }
                TokenError::Encode(msg) => AuthError::Token(msg),
            })?;

        let Some(account) = self.store.find_by_id(&claims.sub).await? else {
            return Err(AuthError::RefreshTokenMismatch);
        };
        let Some(stored_hash) = account.refresh_token.as_deref() else {
            return Err(AuthError::RefreshTokenMismatch);
        };
        if !credentials::verify(stored_hash, refresh_token) {
            warn!(account_id = %account.id, "Refresh token does not match stored lineage");
            return Err(AuthError::RefreshTokenMismatch);
        }

        // Read-compare-write without a transaction: two concurrent
        // refreshes can both pass the compare and the later write wins.
        // The loser's pair dies on its next refresh.
        let pair = self.issue_and_persist(&account.id).await?;
        info!(account_id = %account.id, "Refresh token rotated");
        Ok(pair)
    }

    /// Close the account's session. Idempotent: logging out twice, or
    /// with no session open, is not an error.
    pub async fn logout(&self, account_id: &str) -> AuthResult<()> {
        self.store.update_refresh_token(account_id, None, None).await?;
        info!(account_id, "Session closed");
        Ok(())
    }

    /// Register a new password-based account.
    pub async fn register(&self, new_account: NewAccount) -> AuthResult<()> {
        let email = new_account.email.trim();
        if email.is_empty() || !email.contains('@') {
            return Err(AuthError::InvalidInput("email".to_string()));
        }
        if new_account.password.trim().is_empty() {
            return Err(AuthError::InvalidInput("password".to_string()));
        }
        if new_account.name.trim().is_empty() {
            return Err(AuthError::InvalidInput("name".to_string()));
        }

        let row = NewAccountRow {
            id: Ulid::new().to_string(),
            email: email.to_string(),
            password: credentials::hash(&new_account.password)?,
            name: new_account.name.trim().to_string(),
            created_at: Utc::now(),
            status: ACCOUNT_STATUS_ACTIVE,
            profile_image: String::new(),
            profile_description: String::new(),
        };

        match self.store.insert_account(&row).await {
            Ok(account) => {
                info!(account_id = %account.id, "Account registered");
                Ok(())
            }
            Err(StoreError::Conflict) => Err(AuthError::EmailTaken),
            Err(e) => Err(e.into()),
        }
    }

    /// Public profile lookup.
    pub async fn account(&self, id: &str) -> AuthResult<AccountPublic> {
        self.store
            .find_public_by_id(id)
            .await?
            .ok_or(AuthError::AccountNotFound)
    }

    /// Apply a partial profile update and return the updated projection.
    /// Credential columns are unreachable from here by construction.
    pub async fn update_profile(
        &self,
        id: &str,
        update: ProfileUpdate,
    ) -> AuthResult<AccountPublic> {
        self.store
            .update_profile(id, &update)
            .await?
            .ok_or(AuthError::AccountNotFound)
    }

    async fn open_session(&self, account: AccountRecord) -> AuthResult<LoginOutcome> {
        let account_id = account.id.clone();
        let pair = self.issue_and_persist(&account_id).await?;
        info!(account_id = %account_id, "Session opened");
        Ok(LoginOutcome {
            account: account.into_public(),
            access_token: pair.access_token,
            refresh_token: pair.refresh_token,
        })
    }

    /// Issue a fresh pair and persist the refresh token's hash,
    /// overwriting whatever lineage came before.
    async fn issue_and_persist(&self, account_id: &str) -> AuthResult<TokenPair> {
        let pair = self
            .tokens
            .issue_pair(account_id)
            .map_err(|e| AuthError::Token(e.to_string()))?;

        let hash = credentials::hash(&pair.refresh_token)?;
        let expires_at = Utc::now() + self.tokens.refresh_ttl();
        self.store
            .update_refresh_token(account_id, Some(hash), Some(expires_at))
            .await?;
        Ok(pair)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tidepool_store::MemoryStore;
    use tidepool_tokens::TokenConfig;

    fn manager() -> (Arc<MemoryStore>, SessionManager) {
        let store = Arc::new(MemoryStore::new());
        let config = TokenConfig {
            access_secret: "access-secret".to_string(),
            refresh_secret: "refresh-secret".to_string(),
            access_ttl_secs: 900,
            refresh_ttl_secs: 2_592_000,
        };
        let mgr = SessionManager::new(store.clone(), Arc::new(TokenIssuer::new(&config)));
        (store, mgr)
    }

    async fn register_ada(mgr: &SessionManager) {
        mgr.register(NewAccount {
            email: "ada@example.com".to_string(),
            password: "correct horse".to_string(),
            name: "Ada".to_string(),
        })
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_login_returns_public_account_and_tokens() {
        let (_store, mgr) = manager();
        register_ada(&mgr).await;

        let outcome = mgr.login("ada@example.com", "correct horse").await.unwrap();
        assert_eq!(outcome.account.email, "ada@example.com");
        assert!(!outcome.access_token.is_empty());
        assert!(!outcome.refresh_token.is_empty());
        assert_ne!(outcome.access_token, outcome.refresh_token);
    }

    #[tokio::test]
    async fn test_login_failures_are_indistinguishable() {
        let (_store, mgr) = manager();
        register_ada(&mgr).await;

        let unknown = mgr.login("nobody@example.com", "whatever").await.unwrap_err();
        let wrong = mgr.login("ada@example.com", "wrong").await.unwrap_err();

        assert!(matches!(unknown, AuthError::InvalidCredentials));
        assert!(matches!(wrong, AuthError::InvalidCredentials));
        assert_eq!(unknown.to_string(), wrong.to_string());
        assert_eq!(unknown.code(), wrong.code());
    }

    #[tokio::test]
    async fn test_login_persists_only_refresh_hash() {
        let (store, mgr) = manager();
        register_ada(&mgr).await;

        let outcome = mgr.login("ada@example.com", "correct horse").await.unwrap();
        let row = store
            .get_account(&outcome.account.id)
            .expect("account row exists");

        let stored = row.refresh_token.expect("refresh hash persisted");
        assert_ne!(stored, outcome.refresh_token);
        assert!(stored.starts_with("$argon2id$"));
        assert!(row.refresh_token_expires_at.is_some());
    }

    #[tokio::test]
    async fn test_register_rejects_blank_fields_and_duplicates() {
        let (_store, mgr) = manager();
        register_ada(&mgr).await;

        let blank = mgr
            .register(NewAccount {
                email: "  ".to_string(),
                password: "pw".to_string(),
                name: "x".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(blank, AuthError::InvalidInput(_)));

        let taken = mgr
            .register(NewAccount {
                email: "ada@example.com".to_string(),
                password: "different".to_string(),
                name: "Other".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(taken, AuthError::EmailTaken));
    }

    #[tokio::test]
    async fn test_identity_login_creates_locked_account() {
        let (_store, mgr) = manager();

        let outcome = mgr
            .login_with_verified_identity(VerifiedIdentity {
                email: "grace@example.com".to_string(),
                name: String::new(),
                picture: None,
            })
            .await
            .unwrap();

        // Blank display name falls back to the email
        assert_eq!(outcome.account.name, "grace@example.com");

        // No password known to anyone can log into this account
        let err = mgr.login("grace@example.com", "").await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_identity_login_reuses_existing_account() {
        let (_store, mgr) = manager();
        register_ada(&mgr).await;

        let outcome = mgr
            .login_with_verified_identity(VerifiedIdentity {
                email: "ada@example.com".to_string(),
                name: "Ada from provider".to_string(),
                picture: None,
            })
            .await
            .unwrap();

        // Existing account, existing profile: provider name does not clobber
        assert_eq!(outcome.account.name, "Ada");

        // And the password path still works
        mgr.login("ada@example.com", "correct horse").await.unwrap();
    }

    #[tokio::test]
    async fn test_profile_update_never_touches_credentials() {
        let (store, mgr) = manager();
        register_ada(&mgr).await;
        let outcome = mgr.login("ada@example.com", "correct horse").await.unwrap();
        let id = outcome.account.id.clone();
        let password_before = store.get_account(&id).unwrap().password;

        let updated = mgr
            .update_profile(
                &id,
                ProfileUpdate {
                    name: Some("Ada Lovelace".to_string()),
                    profile_description: Some("first programmer".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.name, "Ada Lovelace");
        assert_eq!(store.get_account(&id).unwrap().password, password_before);
    }

    #[tokio::test]
    async fn test_account_lookup_missing() {
        let (_store, mgr) = manager();
        let err = mgr.account("01HX3Y5RWM9T4K0000000000").await.unwrap_err();
        assert!(matches!(err, AuthError::AccountNotFound));
    }
}
