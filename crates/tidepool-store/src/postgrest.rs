//! REST client for the hosted PostgREST-style data store.

use crate::error::{StoreError, StoreResult};
use crate::traits::{AccountStore, EdgeStore};
use crate::types::{AccountPublic, AccountRecord, NewAccountRow, ProfileUpdate};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use tracing::{debug, error};

const ACCOUNTS_TABLE: &str = "account";
const PUBLIC_COLUMNS: &str =
    "id,email,name,created_at,status,profile_image,profile_description";
const FULL_COLUMNS: &str = "id,email,password,name,created_at,status,profile_image,\
     profile_description,refresh_token,refresh_token_expires_at";

fn summarize_response_body(body: &str) -> String {
    let mut hasher = DefaultHasher::new();
    body.hash(&mut hasher);
    format!("len={},digest={:016x}", body.len(), hasher.finish())
}

/// Data-store client over the hosted REST API.
///
/// Authenticates with the service-role key, so it bypasses row-level
/// security. It must only ever run server-side.
#[derive(Clone)]
pub struct PostgrestStore {
    http_client: reqwest::Client,
    api_url: String,
    service_key: String,
}

impl PostgrestStore {
    /// Create a new store client.
    ///
    /// # Arguments
    /// * `api_url` - The store project API URL (e.g., `https://xyz.supabase.co`)
    /// * `service_key` - The service-role API key
    pub fn new(api_url: impl Into<String>, service_key: impl Into<String>) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            api_url: api_url.into(),
            service_key: service_key.into(),
        }
    }

    /// Build the REST API URL for a table.
    fn rest_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.api_url, table)
    }

    fn auth_headers(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder
            .header("apikey", &self.service_key)
            .header("Authorization", format!("Bearer {}", self.service_key))
    }

    /// Turn a non-success response into a [`StoreError`], logging a body
    /// digest rather than the body itself.
    async fn reject(response: reqwest::Response) -> StoreError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let summary = summarize_response_body(&body);
        error!(status = %status, body_summary = %summary, "Store request failed");
        if status == reqwest::StatusCode::CONFLICT {
            StoreError::Conflict
        } else {
            StoreError::Rejected {
                status: status.as_u16(),
                summary,
            }
        }
    }

    async fn parse_rows<T: DeserializeOwned>(response: reqwest::Response) -> StoreResult<Vec<T>> {
        let body = response.text().await?;
        serde_json::from_str(&body)
            .map_err(|e| StoreError::Decode(format!("{} ({})", e, summarize_response_body(&body))))
    }

    /// GET rows matching the given `eq.` filters, selecting `columns`.
    async fn select_rows<T: DeserializeOwned>(
        &self,
        table: &str,
        filters: &[(&str, String)],
        columns: &str,
    ) -> StoreResult<Vec<T>> {
        let mut query: Vec<(&str, String)> = vec![("select", columns.to_string())];
        for (col, value) in filters {
            query.push((*col, format!("eq.{}", value)));
        }

        let response = self
            .auth_headers(self.http_client.get(self.rest_url(table)))
            .query(&query)
            .header("Accept", "application/json")
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::reject(response).await);
        }

        Self::parse_rows(response).await
    }

    async fn find_account(
        &self,
        column: &str,
        value: &str,
    ) -> StoreResult<Option<AccountRecord>> {
        let rows: Vec<AccountRecord> = self
            .select_rows(ACCOUNTS_TABLE, &[(column, value.to_string())], FULL_COLUMNS)
            .await?;
        Ok(rows.into_iter().next())
    }
}

#[async_trait]
impl AccountStore for PostgrestStore {
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<AccountRecord>> {
        self.find_account("email", email).await
    }

    async fn find_by_id(&self, id: &str) -> StoreResult<Option<AccountRecord>> {
        self.find_account("id", id).await
    }

    async fn find_public_by_id(&self, id: &str) -> StoreResult<Option<AccountPublic>> {
        let rows: Vec<AccountPublic> = self
            .select_rows(ACCOUNTS_TABLE, &[("id", id.to_string())], PUBLIC_COLUMNS)
            .await?;
        Ok(rows.into_iter().next())
    }

    async fn insert_account(&self, row: &NewAccountRow) -> StoreResult<AccountRecord> {
        debug!(account_id = %row.id, "Inserting account row");

        let response = self
            .auth_headers(self.http_client.post(self.rest_url(ACCOUNTS_TABLE)))
            .header("Content-Type", "application/json")
            .header("Prefer", "return=representation")
            .json(row)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::reject(response).await);
        }

        let rows: Vec<AccountRecord> = Self::parse_rows(response).await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| StoreError::Decode("insert returned no rows".to_string()))
    }

    async fn update_refresh_token(
        &self,
        id: &str,
        hash: Option<String>,
        expires_at: Option<DateTime<Utc>>,
    ) -> StoreResult<()> {
        // None serializes to null, which clears the column.
        let body = serde_json::json!({
            "refresh_token": hash,
            "refresh_token_expires_at": expires_at.map(|t| t.to_rfc3339()),
        });

        let response = self
            .auth_headers(self.http_client.patch(self.rest_url(ACCOUNTS_TABLE)))
            .query(&[("id", format!("eq.{}", id))])
            .header("Content-Type", "application/json")
            .header("Prefer", "return=minimal")
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::reject(response).await);
        }

        Ok(())
    }

    async fn update_profile(
        &self,
        id: &str,
        update: &ProfileUpdate,
    ) -> StoreResult<Option<AccountPublic>> {
        if update.is_empty() {
            return self.find_public_by_id(id).await;
        }

        debug!(account_id = %id, "Updating account profile");

        let response = self
            .auth_headers(self.http_client.patch(self.rest_url(ACCOUNTS_TABLE)))
            .query(&[
                ("id", format!("eq.{}", id)),
                ("select", PUBLIC_COLUMNS.to_string()),
            ])
            .header("Content-Type", "application/json")
            .header("Prefer", "return=representation")
            .json(update)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::reject(response).await);
        }

        let rows: Vec<AccountPublic> = Self::parse_rows(response).await?;
        Ok(rows.into_iter().next())
    }
}

#[async_trait]
impl EdgeStore for PostgrestStore {
    async fn edge_exists(
        &self,
        table: &str,
        actor_col: &str,
        actor_id: &str,
        target_col: &str,
        target_id: &str,
    ) -> StoreResult<bool> {
        let rows: Vec<serde_json::Value> = self
            .select_rows(
                table,
                &[
                    (actor_col, actor_id.to_string()),
                    (target_col, target_id.to_string()),
                ],
                "id",
            )
            .await?;
        Ok(!rows.is_empty())
    }

    async fn insert_edge(
        &self,
        table: &str,
        actor_col: &str,
        actor_id: &str,
        target_col: &str,
        target_id: &str,
        created_at: DateTime<Utc>,
    ) -> StoreResult<()> {
        let body = serde_json::json!({
            actor_col: actor_id,
            target_col: target_id,
            "created_at": created_at.to_rfc3339(),
        });

        debug!(table, actor_id, target_id, "Inserting relationship edge");

        let response = self
            .auth_headers(self.http_client.post(self.rest_url(table)))
            .header("Content-Type", "application/json")
            .header("Prefer", "return=minimal")
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::reject(response).await);
        }

        Ok(())
    }

    async fn delete_edge(
        &self,
        table: &str,
        actor_col: &str,
        actor_id: &str,
        target_col: &str,
        target_id: &str,
    ) -> StoreResult<()> {
        debug!(table, actor_id, target_id, "Deleting relationship edge");

        let response = self
            .auth_headers(self.http_client.delete(self.rest_url(table)))
            .query(&[
                (actor_col, format!("eq.{}", actor_id)),
                (target_col, format!("eq.{}", target_id)),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::reject(response).await);
        }

        Ok(())
    }
}

impl std::fmt::Debug for PostgrestStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostgrestStore")
            .field("api_url", &self.api_url)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let store = PostgrestStore::new("https://test.supabase.co", "test-key");
        assert_eq!(store.api_url, "https://test.supabase.co");
        assert_eq!(store.service_key, "test-key");
    }

    #[test]
    fn test_rest_url() {
        let store = PostgrestStore::new("https://test.supabase.co", "test-key");
        assert_eq!(
            store.rest_url("account"),
            "https://test.supabase.co/rest/v1/account"
        );
    }

    #[test]
    fn test_body_summary_hides_content() {
        let summary = summarize_response_body("{\"password\":\"secret\"}");
        assert!(summary.starts_with("len=21,"));
        assert!(!summary.contains("secret"));
    }
}
