//! In-memory store implementation for tests.

use crate::error::{StoreError, StoreResult};
use crate::traits::{AccountStore, EdgeStore};
use crate::types::{AccountPublic, AccountRecord, NewAccountRow, ProfileUpdate};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Mutex;

/// In-memory implementation of [`AccountStore`] and [`EdgeStore`].
///
/// Mirrors the hosted store's observable behavior, including
/// [`StoreError::Conflict`] on duplicate emails and duplicate edges, so
/// higher layers can be tested without a network.
#[derive(Default)]
pub struct MemoryStore {
    accounts: Mutex<HashMap<String, AccountRecord>>,
    edges: Mutex<HashMap<(String, String, String), DateTime<Utc>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an account row directly, bypassing insert checks.
    pub fn put_account(&self, record: AccountRecord) {
        self.accounts
            .lock()
            .unwrap()
            .insert(record.id.clone(), record);
    }

    /// Read an account row back for assertions.
    pub fn get_account(&self, id: &str) -> Option<AccountRecord> {
        self.accounts.lock().unwrap().get(id).cloned()
    }

    /// Read an edge row's creation timestamp back for assertions.
    pub fn edge_created_at(
        &self,
        table: &str,
        actor_id: &str,
        target_id: &str,
    ) -> Option<DateTime<Utc>> {
        self.edges
            .lock()
            .unwrap()
            .get(&(
                table.to_string(),
                actor_id.to_string(),
                target_id.to_string(),
            ))
            .copied()
    }
}

#[async_trait]
impl AccountStore for MemoryStore {
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<AccountRecord>> {
        let accounts = self.accounts.lock().unwrap();
        Ok(accounts.values().find(|a| a.email == email).cloned())
    }

    async fn find_by_id(&self, id: &str) -> StoreResult<Option<AccountRecord>> {
        Ok(self.accounts.lock().unwrap().get(id).cloned())
    }

    async fn find_public_by_id(&self, id: &str) -> StoreResult<Option<AccountPublic>> {
        Ok(self
            .accounts
            .lock()
            .unwrap()
            .get(id)
            .cloned()
            .map(AccountRecord::into_public))
    }

    async fn insert_account(&self, row: &NewAccountRow) -> StoreResult<AccountRecord> {
        let mut accounts = self.accounts.lock().unwrap();
        if accounts.values().any(|a| a.email == row.email) {
            return Err(StoreError::Conflict);
        }

        let record = AccountRecord {
            id: row.id.clone(),
            email: row.email.clone(),
            password: row.password.clone(),
            name: row.name.clone(),
            created_at: row.created_at,
            status: row.status,
            profile_image: row.profile_image.clone(),
            profile_description: row.profile_description.clone(),
            refresh_token: None,
            refresh_token_expires_at: None,
        };
        accounts.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    async fn update_refresh_token(
        &self,
        id: &str,
        hash: Option<String>,
        expires_at: Option<DateTime<Utc>>,
    ) -> StoreResult<()> {
        let mut accounts = self.accounts.lock().unwrap();
        if let Some(record) = accounts.get_mut(id) {
            record.refresh_token = hash;
            record.refresh_token_expires_at = expires_at;
        }
        Ok(())
    }

    async fn update_profile(
        &self,
        id: &str,
        update: &ProfileUpdate,
    ) -> StoreResult<Option<AccountPublic>> {
        let mut accounts = self.accounts.lock().unwrap();
        let Some(record) = accounts.get_mut(id) else {
            return Ok(None);
        };
        if let Some(name) = &update.name {
            record.name = name.clone();
        }
        if let Some(image) = &update.profile_image {
            record.profile_image = image.clone();
        }
        if let Some(description) = &update.profile_description {
            record.profile_description = description.clone();
        }
        Ok(Some(record.clone().into_public()))
    }
}

#[async_trait]
impl EdgeStore for MemoryStore {
    async fn edge_exists(
        &self,
        table: &str,
        _actor_col: &str,
        actor_id: &str,
        _target_col: &str,
        target_id: &str,
    ) -> StoreResult<bool> {
        let edges = self.edges.lock().unwrap();
        Ok(edges.contains_key(&(
            table.to_string(),
            actor_id.to_string(),
            target_id.to_string(),
        )))
    }

    async fn insert_edge(
        &self,
        table: &str,
        _actor_col: &str,
        actor_id: &str,
        _target_col: &str,
        target_id: &str,
        created_at: DateTime<Utc>,
    ) -> StoreResult<()> {
        let mut edges = self.edges.lock().unwrap();
        let key = (
            table.to_string(),
            actor_id.to_string(),
            target_id.to_string(),
        );
        if edges.contains_key(&key) {
            return Err(StoreError::Conflict);
        }
        edges.insert(key, created_at);
        Ok(())
    }

    async fn delete_edge(
        &self,
        table: &str,
        _actor_col: &str,
        actor_id: &str,
        _target_col: &str,
        target_id: &str,
    ) -> StoreResult<()> {
        let mut edges = self.edges.lock().unwrap();
        edges.remove(&(
            table.to_string(),
            actor_id.to_string(),
            target_id.to_string(),
        ));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ACCOUNT_STATUS_ACTIVE;

    fn new_row(id: &str, email: &str) -> NewAccountRow {
        NewAccountRow {
            id: id.to_string(),
            email: email.to_string(),
            password: "$argon2id$hash".to_string(),
            name: "Test".to_string(),
            created_at: Utc::now(),
            status: ACCOUNT_STATUS_ACTIVE,
            profile_image: String::new(),
            profile_description: String::new(),
        }
    }

    #[tokio::test]
    async fn test_insert_and_find() {
        let store = MemoryStore::new();
        store.insert_account(&new_row("a1", "a@example.com")).await.unwrap();

        let by_email = store.find_by_email("a@example.com").await.unwrap();
        assert_eq!(by_email.unwrap().id, "a1");

        let missing = store.find_by_id("nope").await.unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_duplicate_email_conflicts() {
        let store = MemoryStore::new();
        store.insert_account(&new_row("a1", "a@example.com")).await.unwrap();

        let err = store
            .insert_account(&new_row("a2", "a@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict));
    }

    #[tokio::test]
    async fn test_refresh_token_roundtrip() {
        let store = MemoryStore::new();
        store.insert_account(&new_row("a1", "a@example.com")).await.unwrap();

        store
            .update_refresh_token("a1", Some("hash".to_string()), None)
            .await
            .unwrap();
        assert_eq!(
            store.get_account("a1").unwrap().refresh_token.as_deref(),
            Some("hash")
        );

        store.update_refresh_token("a1", None, None).await.unwrap();
        assert!(store.get_account("a1").unwrap().refresh_token.is_none());
    }

    #[tokio::test]
    async fn test_duplicate_edge_conflicts() {
        let store = MemoryStore::new();
        store
            .insert_edge("follows", "follower_id", "a1", "followed_id", "a2", Utc::now())
            .await
            .unwrap();

        let err = store
            .insert_edge("follows", "follower_id", "a1", "followed_id", "a2", Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict));

        store
            .delete_edge("follows", "follower_id", "a1", "followed_id", "a2")
            .await
            .unwrap();
        assert!(!store
            .edge_exists("follows", "follower_id", "a1", "followed_id", "a2")
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_edge_row_keeps_created_at() {
        let store = MemoryStore::new();
        let stamped = Utc::now();
        store
            .insert_edge("likes", "user_id", "a1", "post_id", "p9", stamped)
            .await
            .unwrap();

        assert_eq!(store.edge_created_at("likes", "a1", "p9"), Some(stamped));
        assert!(store.edge_created_at("likes", "a1", "p8").is_none());
    }
}
