use std::sync::Arc;
use uuid::Uuid;

use crate::error::StoreResult;
use crate::store::{Datastore, Filter, SelectQuery};

const POLL_OPTIONS: &str = "poll_options";

/// Repository over poll-option rows; classification only needs existence.
#[derive(Clone)]
pub struct PollRepository {
    store: Arc<dyn Datastore>,
}

impl PollRepository {
    pub fn new(store: Arc<dyn Datastore>) -> Self {
        Self { store }
    }

    /// Whether any poll-options row exists for the post.
    pub async fn has_options(&self, post_id: Uuid) -> StoreResult<bool> {
        let row = self
            .store
            .select_one(
                SelectQuery::from(POLL_OPTIONS)
                    .columns(&["id"])
                    .filter(Filter::eq("post_id", post_id)),
            )
            .await?;

        Ok(row.is_some())
    }
}
