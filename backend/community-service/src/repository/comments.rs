use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::StoreResult;
use crate::store::{Datastore, Filter, SelectQuery};

const COMMENTS: &str = "comments";

/// Read-only repository over comment rows; this core only derives counts.
#[derive(Clone)]
pub struct CommentRepository {
    store: Arc<dyn Datastore>,
}

impl CommentRepository {
    pub fn new(store: Arc<dyn Datastore>) -> Self {
        Self { store }
    }

    /// One bulk fetch for a whole batch of posts, folded into per-post
    /// counts. Posts without comments are absent from the map.
    pub async fn counts_for_posts(&self, post_ids: &[Uuid]) -> StoreResult<HashMap<Uuid, i64>> {
        if post_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = self
            .store
            .select(
                SelectQuery::from(COMMENTS)
                    .columns(&["post_id"])
                    .filter(Filter::is_in("post_id", post_ids.iter().copied())),
            )
            .await?;

        let mut counts: HashMap<Uuid, i64> = HashMap::new();
        for row in rows {
            let post_id = row
                .get("post_id")
                .and_then(Value::as_str)
                .and_then(|s| Uuid::parse_str(s).ok());
            if let Some(post_id) = post_id {
                *counts.entry(post_id).or_insert(0) += 1;
            }
        }
        Ok(counts)
    }

    pub async fn count_for_post(&self, post_id: Uuid) -> StoreResult<i64> {
        self.store
            .count(COMMENTS, &[Filter::eq("post_id", post_id)])
            .await
    }
}
