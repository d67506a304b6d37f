//! Check-then-act guard over relationship tables.

use crate::error::{GuardError, GuardResult};
use chrono::Utc;
use std::sync::Arc;
use tidepool_store::{EdgeStore, StoreError};
use tracing::{debug, info};

/// Describes one relationship table.
#[derive(Debug, Clone, Copy)]
pub struct Relation {
    pub table: &'static str,
    pub actor_col: &'static str,
    pub target_col: &'static str,
    /// Whether actor == target is forbidden.
    pub forbids_self: bool,
}

/// One account following another. Self-follow is forbidden.
pub const FOLLOWS: Relation = Relation {
    table: "follows",
    actor_col: "follower_id",
    target_col: "followed_id",
    forbids_self: true,
};

/// An account liking a post. Liking your own post is allowed.
pub const LIKES: Relation = Relation {
    table: "likes",
    actor_col: "user_id",
    target_col: "post_id",
    forbids_self: false,
};

/// An account collecting a post.
pub const COLLECTIONS: Relation = Relation {
    table: "collections",
    actor_col: "user_id",
    target_col: "post_id",
    forbids_self: false,
};

/// Check-then-act wrapper around an [`EdgeStore`].
///
/// The existence check is a fast path for a friendly error; the store's
/// unique index stays authoritative, so a conflict slipping past the check
/// still comes back as [`GuardError::AlreadyExists`].
pub struct RelationshipGuard {
    store: Arc<dyn EdgeStore>,
}

impl RelationshipGuard {
    pub fn new(store: Arc<dyn EdgeStore>) -> Self {
        Self { store }
    }

    /// Whether the edge exists.
    pub async fn exists(
        &self,
        relation: &Relation,
        actor_id: &str,
        target_id: &str,
    ) -> GuardResult<bool> {
        let present = self
            .store
            .edge_exists(
                relation.table,
                relation.actor_col,
                actor_id,
                relation.target_col,
                target_id,
            )
            .await?;
        Ok(present)
    }

    /// Create the edge, stamped with the current time.
    pub async fn add(
        &self,
        relation: &Relation,
        actor_id: &str,
        target_id: &str,
    ) -> GuardResult<()> {
        if relation.forbids_self && actor_id == target_id {
            debug!(table = relation.table, actor_id, "Rejected self-reference");
            return Err(GuardError::SelfReference);
        }

        if self.exists(relation, actor_id, target_id).await? {
            return Err(GuardError::AlreadyExists);
        }

        match self
            .store
            .insert_edge(
                relation.table,
                relation.actor_col,
                actor_id,
                relation.target_col,
                target_id,
                Utc::now(),
            )
            .await
        {
            Ok(()) => {
                info!(table = relation.table, actor_id, target_id, "Edge created");
                Ok(())
            }
            // Lost a race with a concurrent add; the index is authoritative
            Err(StoreError::Conflict) => Err(GuardError::AlreadyExists),
            Err(e) => Err(e.into()),
        }
    }

    /// Delete the edge.
    pub async fn remove(
        &self,
        relation: &Relation,
        actor_id: &str,
        target_id: &str,
    ) -> GuardResult<()> {
        if !self.exists(relation, actor_id, target_id).await? {
            return Err(GuardError::NotFound);
        }

        self.store
            .delete_edge(
                relation.table,
                relation.actor_col,
                actor_id,
                relation.target_col,
                target_id,
            )
            .await?;
        info!(table = relation.table, actor_id, target_id, "Edge removed");
        Ok(())
    }
}
