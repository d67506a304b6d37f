//! Password and refresh-token hashing.
//!
//! Everything secret that touches the data store goes through here first:
//! account passwords and refresh tokens are stored only as Argon2id PHC
//! strings, and externally-created accounts get an unguessable locked
//! password so the password login path can never match them.

use argon2::{Argon2, PasswordHasher, PasswordVerifier};
use password_hash::{PasswordHash, SaltString};
use std::fmt::Write;
use thiserror::Error;

/// Errors that can occur while hashing secrets.
#[derive(Debug, Error)]
pub enum CredentialError {
    /// The OS random generator failed.
    #[error("random generator unavailable: {0}")]
    Rng(String),

    /// Argon2 rejected its input.
    #[error("hashing failed: {0}")]
    Hash(String),
}

/// Result alias for credential operations.
pub type CredentialResult<T> = Result<T, CredentialError>;

/// Hash a secret into an Argon2id PHC string with a fresh random salt.
///
/// Used for both account passwords and refresh tokens; the PHC string
/// carries its own salt and parameters, so [`verify`] needs nothing else.
pub fn hash(secret: &str) -> CredentialResult<String> {
    let mut salt_bytes = [0u8; 16];
    getrandom::getrandom(&mut salt_bytes).map_err(|e| CredentialError::Rng(e.to_string()))?;
    let salt =
        SaltString::encode_b64(&salt_bytes).map_err(|e| CredentialError::Hash(e.to_string()))?;

    let argon2 = Argon2::default();
    let phc = argon2
        .hash_password(secret.as_bytes(), &salt)
        .map_err(|e| CredentialError::Hash(e.to_string()))?
        .to_string();
    Ok(phc)
}

/// Check a candidate secret against a stored PHC string.
///
/// An unparseable hash verifies as false rather than erroring, so a
/// corrupted stored hash behaves like a wrong password.
pub fn verify(stored_hash: &str, candidate: &str) -> bool {
    match PasswordHash::new(stored_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(candidate.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

/// Generate an unguessable placeholder password for accounts created from
/// an external identity. 32 random bytes, hex-encoded.
///
/// The caller hashes it like any other password; the plaintext is
/// discarded, so the account can only ever log in via its external
/// identity.
pub fn locked_password() -> CredentialResult<String> {
    let mut bytes = [0u8; 32];
    getrandom::getrandom(&mut bytes).map_err(|e| CredentialError::Rng(e.to_string()))?;
    let mut out = String::with_capacity(64);
    for byte in bytes {
        // infallible for String
        let _ = write!(out, "{:02x}", byte);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let phc = hash("hunter2").unwrap();
        assert!(phc.starts_with("$argon2id$"));
        assert!(verify(&phc, "hunter2"));
        assert!(!verify(&phc, "hunter3"));
    }

    #[test]
    fn test_hashes_are_salted() {
        let a = hash("same-password").unwrap();
        let b = hash("same-password").unwrap();
        assert_ne!(a, b);
        assert!(verify(&a, "same-password"));
        assert!(verify(&b, "same-password"));
    }

    #[test]
    fn test_garbage_hash_never_verifies() {
        assert!(!verify("not-a-phc-string", "anything"));
        assert!(!verify("", "anything"));
    }

    #[test]
    fn test_locked_password_is_unique() {
        let a = locked_password().unwrap();
        let b = locked_password().unwrap();
        assert_ne!(a, b);
        // 32 bytes of entropy, hex-encoded
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
