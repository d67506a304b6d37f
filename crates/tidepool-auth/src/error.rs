//! Error type for authentication operations.

use thiserror::Error;
use tidepool_credentials::CredentialError;
use tidepool_store::StoreError;

/// Errors that can occur during authentication flows.
///
/// The first three variants are deliberately low-information: a caller
/// learns that a login or refresh failed, never which ingredient was wrong.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Unknown email or wrong password. Indistinguishable on purpose.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// The presented refresh token is malformed, forged, or expired.
    #[error("invalid or expired refresh token")]
    InvalidOrExpiredRefreshToken,

    /// A structurally valid refresh token that does not match the
    /// account's stored hash (rotated out, logged out, or never issued).
    #[error("refresh token does not match the active session")]
    RefreshTokenMismatch,

    /// Registration with an email that already has an account.
    #[error("email already registered")]
    EmailTaken,

    /// Profile lookup or update on a nonexistent account.
    #[error("account not found")]
    AccountNotFound,

    /// A request field failed validation.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Hashing infrastructure failed.
    #[error("credential hashing failed: {0}")]
    Hash(#[from] CredentialError),

    /// Token signing failed.
    #[error("token issuance failed: {0}")]
    Token(String),

    /// The data store failed. Details stay in the logs.
    #[error("store operation failed: {0}")]
    Store(#[from] StoreError),
}

impl AuthError {
    /// Stable machine-readable error code.
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::InvalidCredentials => "invalid_credentials",
            AuthError::InvalidOrExpiredRefreshToken => "invalid_refresh_token",
            AuthError::RefreshTokenMismatch => "refresh_token_mismatch",
            AuthError::EmailTaken => "email_taken",
            AuthError::AccountNotFound => "account_not_found",
            AuthError::InvalidInput(_) => "invalid_input",
            AuthError::Hash(_) => "hash_failure",
            AuthError::Token(_) => "token_failure",
            AuthError::Store(_) => "store_failure",
        }
    }
}

/// Result alias for authentication operations.
pub type AuthResult<T> = Result<T, AuthError>;
