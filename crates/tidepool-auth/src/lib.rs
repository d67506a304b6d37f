//! Account authentication and session-token lifecycle.
//!
//! The [`SessionManager`] owns every credential decision in the backend:
//! password login, externally verified identity login, refresh-token
//! rotation, logout, and registration. Token strings themselves come from
//! `tidepool-tokens`; all hashing goes through `tidepool-credentials`; rows
//! live behind the `tidepool-store` traits.

mod error;
mod identity;
mod session;

pub use error::{AuthError, AuthResult};
pub use identity::IdentityVerifier;
pub use session::{LoginOutcome, NewAccount, SessionManager, VerifiedIdentity};
