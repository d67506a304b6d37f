//! Error type for relationship mutations.

use thiserror::Error;
use tidepool_store::StoreError;

/// Errors from relationship-edge operations.
#[derive(Debug, Error)]
pub enum GuardError {
    /// The relation forbids actor == target (following yourself).
    #[error("cannot relate an account to itself")]
    SelfReference,

    /// The edge is already present.
    #[error("relationship already exists")]
    AlreadyExists,

    /// The edge to remove is not there.
    #[error("relationship not found")]
    NotFound,

    /// The data store failed.
    #[error("store operation failed: {0}")]
    Store(#[from] StoreError),
}

impl GuardError {
    /// Stable machine-readable error code.
    pub fn code(&self) -> &'static str {
        match self {
            GuardError::SelfReference => "self_reference",
            GuardError::AlreadyExists => "already_exists",
            GuardError::NotFound => "not_found",
            GuardError::Store(_) => "store_failure",
        }
    }
}

/// Result alias for relationship operations.
pub type GuardResult<T> = Result<T, GuardError>;
