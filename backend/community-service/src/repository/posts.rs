use std::sync::Arc;
use uuid::Uuid;

use crate::domain::models::Post;
use crate::error::StoreResult;
use crate::store::{decode_all, Datastore, Filter, SelectQuery, StoreValue};

const POSTS: &str = "posts";

/// Repository for raw post rows
#[derive(Clone)]
pub struct PostRepository {
    store: Arc<dyn Datastore>,
}

impl PostRepository {
    pub fn new(store: Arc<dyn Datastore>) -> Self {
        Self { store }
    }

    /// All posts for a community, newest first.
    pub async fn list_for_community(
        &self,
        community_id: Uuid,
        limit: Option<i64>,
    ) -> StoreResult<Vec<Post>> {
        let mut query = SelectQuery::from(POSTS)
            .filter(Filter::eq("community_id", community_id))
            .order_desc("created_at");
        if let Some(limit) = limit {
            query = query.limit(limit);
        }

        decode_all(self.store.select(query).await?)
    }

    /// Set a post's cover image. Owners match on their own posts; admins
    /// match any post. Returns false when no row matched (not the owner,
    /// or the post is gone).
    pub async fn set_cover_image(
        &self,
        post_id: Uuid,
        actor_id: Uuid,
        is_admin: bool,
        cover_image_url: Option<String>,
    ) -> StoreResult<bool> {
        let mut filters = vec![Filter::eq("id", post_id)];
        if !is_admin {
            filters.push(Filter::eq("author_id", actor_id));
        }

        let affected = self
            .store
            .update(
                POSTS,
                &filters,
                vec![(
                    "cover_image_url".to_string(),
                    StoreValue::from(cover_image_url),
                )],
            )
            .await?;

        Ok(affected > 0)
    }
}
