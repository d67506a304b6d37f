//! Row types for the accounts table and its projections.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Status value for a live, usable account.
pub const ACCOUNT_STATUS_ACTIVE: i32 = 1;

/// Full account row as stored, including credential material.
///
/// Never serialize this to an API response; use [`AccountPublic`] for
/// anything that leaves the backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountRecord {
    /// ULID, assigned at registration.
    pub id: String,
    pub email: String,
    /// Argon2id hash of the account password (PHC string).
    pub password: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub status: i32,
    #[serde(default)]
    pub profile_image: String,
    #[serde(default)]
    pub profile_description: String,
    /// Argon2id hash of the currently valid refresh token, if a session
    /// is open. `None` after logout or before first login.
    pub refresh_token: Option<String>,
    /// Bookkeeping expiry for the stored refresh token hash.
    pub refresh_token_expires_at: Option<DateTime<Utc>>,
}

/// Public projection of an account, safe to return to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountPublic {
    pub id: String,
    pub email: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub status: i32,
    #[serde(default)]
    pub profile_image: String,
    #[serde(default)]
    pub profile_description: String,
}

impl AccountRecord {
    /// Project the record down to its public columns.
    ///
    /// This is the only place the projection is defined, so a column added
    /// to [`AccountPublic`] must be mapped here or it will not compile.
    pub fn into_public(self) -> AccountPublic {
        AccountPublic {
            id: self.id,
            email: self.email,
            name: self.name,
            created_at: self.created_at,
            status: self.status,
            profile_image: self.profile_image,
            profile_description: self.profile_description,
        }
    }
}

/// Insert payload for a new account row.
#[derive(Debug, Clone, Serialize)]
pub struct NewAccountRow {
    pub id: String,
    pub email: String,
    pub password: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub status: i32,
    pub profile_image: String,
    pub profile_description: String,
}

/// Partial profile update. `None` fields are left untouched in the store.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_description: Option<String>,
}

impl ProfileUpdate {
    /// True when the update would not change anything.
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.profile_image.is_none() && self.profile_description.is_none()
    }
}
