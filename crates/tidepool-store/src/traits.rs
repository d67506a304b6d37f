//! Storage traits the backend programs against.

use crate::error::StoreResult;
use crate::types::{AccountPublic, AccountRecord, NewAccountRow, ProfileUpdate};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Account persistence.
///
/// Lookups that miss return `Ok(None)`; only transport and store failures
/// surface as errors. Insert surfaces a unique-email violation as
/// [`StoreError::Conflict`](crate::StoreError::Conflict).
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Look up the full row by email. Internal use only.
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<AccountRecord>>;

    /// Look up the full row by id. Internal use only.
    async fn find_by_id(&self, id: &str) -> StoreResult<Option<AccountRecord>>;

    /// Look up the public projection by id.
    async fn find_public_by_id(&self, id: &str) -> StoreResult<Option<AccountPublic>>;

    /// Insert a new account and return the stored row.
    async fn insert_account(&self, row: &NewAccountRow) -> StoreResult<AccountRecord>;

    /// Replace the stored refresh-token hash. `None` clears the session.
    async fn update_refresh_token(
        &self,
        id: &str,
        hash: Option<String>,
        expires_at: Option<DateTime<Utc>>,
    ) -> StoreResult<()>;

    /// Apply a partial profile update and return the updated public row,
    /// or `None` when the account does not exist.
    async fn update_profile(
        &self,
        id: &str,
        update: &ProfileUpdate,
    ) -> StoreResult<Option<AccountPublic>>;
}

/// Relationship-edge persistence (follows, likes, collections).
///
/// Edges are rows keyed by an (actor, target) column pair with a unique
/// index over the pair. The table and column names come from the caller so
/// one implementation serves every edge kind.
#[async_trait]
pub trait EdgeStore: Send + Sync {
    /// True when a row with the given column values exists.
    async fn edge_exists(
        &self,
        table: &str,
        actor_col: &str,
        actor_id: &str,
        target_col: &str,
        target_id: &str,
    ) -> StoreResult<bool>;

    /// Insert an edge row with its creation timestamp. A unique-index
    /// violation surfaces as
    /// [`StoreError::Conflict`](crate::StoreError::Conflict).
    async fn insert_edge(
        &self,
        table: &str,
        actor_col: &str,
        actor_id: &str,
        target_col: &str,
        target_id: &str,
        created_at: DateTime<Utc>,
    ) -> StoreResult<()>;

    /// Delete the edge row if present.
    async fn delete_edge(
        &self,
        table: &str,
        actor_col: &str,
        actor_id: &str,
        target_col: &str,
        target_id: &str,
    ) -> StoreResult<()>;
}
