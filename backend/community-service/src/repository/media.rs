use std::sync::Arc;
use uuid::Uuid;

use crate::error::StoreResult;
use crate::store::{Datastore, Filter, SelectQuery};

/// Legacy media-attachment table, kept for posts created before media
/// moved inline into the content body.
const MEDIA_ATTACHMENTS: &str = "media_attachments";

#[derive(Clone)]
pub struct MediaRepository {
    store: Arc<dyn Datastore>,
}

impl MediaRepository {
    pub fn new(store: Arc<dyn Datastore>) -> Self {
        Self { store }
    }

    /// Whether a legacy attachment row exists for the post.
    pub async fn has_attachment(&self, post_id: Uuid) -> StoreResult<bool> {
        let row = self
            .store
            .select_one(
                SelectQuery::from(MEDIA_ATTACHMENTS)
                    .columns(&["id"])
                    .filter(Filter::eq("post_id", post_id)),
            )
            .await?;

        Ok(row.is_some())
    }
}
