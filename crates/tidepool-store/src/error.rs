//! Error type for data-store operations.

use thiserror::Error;

/// Errors that can occur while talking to the data store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store could not be reached (network, TLS, timeout).
    #[error("store unreachable: {0}")]
    Unavailable(#[from] reqwest::Error),

    /// The store rejected the request with a non-conflict error status.
    #[error("store rejected request: {status} ({summary})")]
    Rejected {
        /// HTTP status code returned by the store.
        status: u16,
        /// Digest of the response body (length + hash, never raw content).
        summary: String,
    },

    /// A unique constraint in the store rejected the write.
    #[error("duplicate row")]
    Conflict,

    /// The store answered with a payload we could not interpret.
    #[error("unexpected store response: {0}")]
    Decode(String),
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
