//! Post enrichment pipeline and feed coordinator.
//!
//! `fetch_feed` turns raw post rows into fully denormalized, classified
//! records. The base list failing is fatal for the call; every per-post
//! lookup degrades to documented defaults instead of dropping the post or
//! failing the batch.

use futures::future::join_all;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::domain::models::{ContentType, EnrichedPost, Post, Profile};
use crate::error::{EngineResult, StoreResult};
use crate::repository::{
    CommentRepository, CommunityRepository, MediaRepository, PollRepository, PostRepository,
    ProfileRepository, ReactionRepository,
};
use crate::services::counts::CountAggregator;
use crate::store::Datastore;

pub struct FeedService {
    posts: PostRepository,
    communities: CommunityRepository,
    profiles: ProfileRepository,
    polls: PollRepository,
    media: MediaRepository,
    counts: CountAggregator,
    /// Fixed "load more" page size; `None` fetches the whole feed.
    page_size: Option<i64>,
}

impl FeedService {
    pub fn new(store: Arc<dyn Datastore>, page_size: Option<i64>) -> Self {
        Self {
            posts: PostRepository::new(store.clone()),
            communities: CommunityRepository::new(store.clone()),
            profiles: ProfileRepository::new(store.clone()),
            polls: PollRepository::new(store.clone()),
            media: MediaRepository::new(store.clone()),
            counts: CountAggregator::new(
                ReactionRepository::new(store.clone()),
                CommentRepository::new(store),
            ),
            page_size,
        }
    }

    /// Fetch, enrich, classify and count the feed for one community,
    /// newest first.
    pub async fn fetch_feed(&self, community_id: Uuid) -> EngineResult<Vec<EnrichedPost>> {
        let raw = self
            .posts
            .list_for_community(community_id, self.page_size)
            .await?;

        // Fire all per-post enrichments, await all; each writes only into
        // its own post's fields.
        let enriched = join_all(raw.into_iter().map(|post| self.enrich(post))).await;

        Ok(self.counts.attach_counts(enriched).await)
    }

    async fn enrich(&self, post: Post) -> EnrichedPost {
        let (community_name, author, has_poll, has_legacy_attachment) = tokio::join!(
            self.communities.display_name(post.community_id),
            self.author_profile(post.author_id),
            self.polls.has_options(post.id),
            self.media.has_attachment(post.id),
        );

        let community_name = match community_name {
            Ok(Some(name)) => name,
            Ok(None) => EnrichedPost::UNKNOWN_COMMUNITY.to_string(),
            Err(err) => {
                warn!(post_id = %post.id, error = %err, "community lookup failed");
                EnrichedPost::UNKNOWN_COMMUNITY.to_string()
            }
        };

        let (author_display_name, author_avatar_url) = match author {
            Ok(Some(profile)) => (profile.display_name, profile.avatar_url),
            Ok(None) => (EnrichedPost::UNKNOWN_USER.to_string(), None),
            Err(err) => {
                warn!(post_id = %post.id, error = %err, "author lookup failed");
                (EnrichedPost::UNKNOWN_USER.to_string(), None)
            }
        };

        let has_poll = unwrap_or_absent(has_poll, &post, "poll lookup failed");
        let has_legacy_attachment =
            unwrap_or_absent(has_legacy_attachment, &post, "media lookup failed");

        let content_type = classify(&post.raw_content, has_poll, has_legacy_attachment);

        EnrichedPost {
            id: post.id,
            community_id: post.community_id,
            author_id: post.author_id,
            title: post.title,
            raw_content: post.raw_content,
            cover_image_url: post.cover_image_url,
            created_at: post.created_at,
            community_name,
            author_display_name,
            author_avatar_url,
            content_type,
            helpful_count: 0,
            insightful_count: 0,
            comment_count: 0,
        }
    }

    async fn author_profile(&self, author_id: Option<Uuid>) -> StoreResult<Option<Profile>> {
        match author_id {
            // Anonymous post; nothing to look up.
            None => Ok(None),
            Some(author_id) => self.profiles.get(author_id).await,
        }
    }
}

fn unwrap_or_absent(result: StoreResult<bool>, post: &Post, message: &'static str) -> bool {
    match result {
        Ok(found) => found,
        Err(err) => {
            warn!(post_id = %post.id, error = %err, "{}", message);
            false
        }
    }
}

/// Content-type classification.
///
/// Precedence is a business rule: a poll-options row wins over everything,
/// then inline media in the content body, then a legacy attachment row,
/// then text. A poll post is never reclassified to media even when its
/// content also embeds an image.
fn classify(raw_content: &str, has_poll: bool, has_legacy_attachment: bool) -> ContentType {
    if has_poll {
        return ContentType::Poll;
    }
    if content_embeds_media(raw_content) || has_legacy_attachment {
        return ContentType::Media;
    }
    ContentType::Text
}

/// Inline media: an HTML image/video tag or a markdown image embed.
fn content_embeds_media(raw_content: &str) -> bool {
    let lowered = raw_content.to_lowercase();
    lowered.contains("<img") || lowered.contains("<video") || lowered.contains("![")
}

/// A feed result tagged with the community it was fetched for.
#[derive(Debug, Clone)]
pub struct FeedSnapshot {
    pub community_id: Uuid,
    pub posts: Vec<EnrichedPost>,
}

/// Serializes competing feed fetches: a fetch superseded by a newer one
/// resolves to `None` instead of delivering a stale snapshot.
pub struct FeedCoordinator {
    feed: Arc<FeedService>,
    generation: AtomicU64,
}

impl FeedCoordinator {
    pub fn new(feed: Arc<FeedService>) -> Self {
        Self {
            feed,
            generation: AtomicU64::new(0),
        }
    }

    /// Fetch the feed; `Ok(None)` means a newer fetch started while this
    /// one was in flight and its result (success or failure) was discarded.
    pub async fn fetch_latest(&self, community_id: Uuid) -> EngineResult<Option<FeedSnapshot>> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        let result = self.feed.fetch_feed(community_id).await;

        if self.generation.load(Ordering::SeqCst) != generation {
            debug!(%community_id, "discarding superseded feed fetch");
            return Ok(None);
        }

        Ok(Some(FeedSnapshot {
            community_id,
            posts: result?,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_poll_wins_over_embedded_image() {
        let content = r#"Vote here <img src="banner.png">"#;
        assert_eq!(classify(content, true, false), ContentType::Poll);
    }

    #[test]
    fn test_classify_poll_wins_over_legacy_attachment() {
        assert_eq!(classify("plain text", true, true), ContentType::Poll);
    }

    #[test]
    fn test_classify_inline_image_tag() {
        assert_eq!(
            classify(r#"look: <IMG SRC="cat.jpg">"#, false, false),
            ContentType::Media
        );
    }

    #[test]
    fn test_classify_markdown_embed() {
        assert_eq!(
            classify("before ![alt](pic.png) after", false, false),
            ContentType::Media
        );
    }

    #[test]
    fn test_classify_legacy_attachment_row() {
        assert_eq!(classify("no inline media", false, true), ContentType::Media);
    }

    #[test]
    fn test_classify_plain_text() {
        assert_eq!(classify("just words", false, false), ContentType::Text);
    }
}
