//! Hosted data-store adapter for the Tidepool backend.
//!
//! All persistence goes through a hosted PostgREST-style API. This crate
//! owns the row types, the [`AccountStore`] and [`EdgeStore`] traits that
//! the rest of the backend programs against, and the [`PostgrestStore`]
//! implementation that talks to the real service. [`MemoryStore`] is an
//! in-process implementation for tests.

mod error;
mod memory;
mod postgrest;
mod traits;
mod types;

pub use error::{StoreError, StoreResult};
pub use memory::MemoryStore;
pub use postgrest::PostgrestStore;
pub use traits::{AccountStore, EdgeStore};
pub use types::{AccountPublic, AccountRecord, NewAccountRow, ProfileUpdate, ACCOUNT_STATUS_ACTIVE};
