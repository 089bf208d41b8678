use chrono::Utc;
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::models::ReactionKind;
use crate::error::StoreResult;
use crate::store::{decode_all, Assignments, Datastore, Filter, SelectQuery, StoreValue};

const REACTIONS: &str = "reactions";

/// Projected reaction row used by the bulk count fold.
#[derive(Debug, Clone, Deserialize)]
pub struct PostReaction {
    pub post_id: Uuid,
    pub kind: ReactionKind,
}

/// Repository for reaction rows.
///
/// At most one row exists per (post, user, kind); the table carries a
/// unique constraint over that triple, so a racing double-add surfaces as
/// a unique violation for the caller to interpret.
#[derive(Clone)]
pub struct ReactionRepository {
    store: Arc<dyn Datastore>,
}

impl ReactionRepository {
    pub fn new(store: Arc<dyn Datastore>) -> Self {
        Self { store }
    }

    /// Whether the user currently has this reaction on the post.
    pub async fn exists(
        &self,
        user_id: Uuid,
        post_id: Uuid,
        kind: ReactionKind,
    ) -> StoreResult<bool> {
        let row = self
            .store
            .select_one(
                SelectQuery::from(REACTIONS)
                    .columns(&["id"])
                    .filter(Filter::eq("user_id", user_id))
                    .filter(Filter::eq("post_id", post_id))
                    .filter(Filter::eq("kind", kind.as_str())),
            )
            .await?;

        Ok(row.is_some())
    }

    pub async fn add(&self, user_id: Uuid, post_id: Uuid, kind: ReactionKind) -> StoreResult<()> {
        let row: Assignments = vec![
            ("id".to_string(), StoreValue::from(Uuid::new_v4())),
            ("post_id".to_string(), StoreValue::from(post_id)),
            ("user_id".to_string(), StoreValue::from(user_id)),
            ("kind".to_string(), StoreValue::from(kind.as_str())),
            ("created_at".to_string(), StoreValue::from(Utc::now())),
        ];

        self.store.insert(REACTIONS, row).await?;
        Ok(())
    }

    pub async fn remove(
        &self,
        user_id: Uuid,
        post_id: Uuid,
        kind: ReactionKind,
    ) -> StoreResult<bool> {
        let affected = self
            .store
            .delete(
                REACTIONS,
                &[
                    Filter::eq("user_id", user_id),
                    Filter::eq("post_id", post_id),
                    Filter::eq("kind", kind.as_str()),
                ],
            )
            .await?;

        Ok(affected > 0)
    }

    /// One bulk fetch for a whole batch of posts, projected to the columns
    /// the count fold needs.
    pub async fn list_for_posts(&self, post_ids: &[Uuid]) -> StoreResult<Vec<PostReaction>> {
        if post_ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = self
            .store
            .select(
                SelectQuery::from(REACTIONS)
                    .columns(&["post_id", "kind"])
                    .filter(Filter::is_in("post_id", post_ids.iter().copied())),
            )
            .await?;

        decode_all(rows)
    }

    /// Per-kind counts for one post.
    pub async fn counts_for_post(&self, post_id: Uuid) -> StoreResult<(i64, i64)> {
        let reactions = self.list_for_posts(&[post_id]).await?;

        let mut helpful = 0i64;
        let mut insightful = 0i64;
        for reaction in reactions {
            match reaction.kind {
                ReactionKind::Helpful => helpful += 1,
                ReactionKind::Insightful => insightful += 1,
            }
        }
        Ok((helpful, insightful))
    }
}
