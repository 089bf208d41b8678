//! Feed count aggregator.
//!
//! Counts are deliberately batch-shaped: one bulk reaction fetch plus one
//! bulk comment fetch per feed, regardless of feed size, folded into
//! per-post counts. The per-post fan-out in the enrichment pipeline is for
//! fields that are genuinely per-post-unique; anything keyed by the shared
//! post-id set belongs here.

use std::collections::HashMap;
use tracing::warn;
use uuid::Uuid;

use crate::domain::models::{EngagementCounts, EnrichedPost, ReactionKind};
use crate::error::EngineResult;
use crate::repository::{CommentRepository, ReactionRepository};

pub struct CountAggregator {
    reactions: ReactionRepository,
    comments: CommentRepository,
}

impl CountAggregator {
    pub fn new(reactions: ReactionRepository, comments: CommentRepository) -> Self {
        Self { reactions, comments }
    }

    /// Merge reaction and comment counts onto each post in the batch.
    ///
    /// Either bulk fetch failing defaults that count to zero for every post
    /// in the batch: never negative, never omitted.
    pub async fn attach_counts(&self, mut posts: Vec<EnrichedPost>) -> Vec<EnrichedPost> {
        if posts.is_empty() {
            return posts;
        }

        let post_ids: Vec<Uuid> = posts.iter().map(|post| post.id).collect();
        let (reactions, comments) = tokio::join!(
            self.reactions.list_for_posts(&post_ids),
            self.comments.counts_for_posts(&post_ids)
        );

        let reaction_counts: HashMap<Uuid, (i64, i64)> = match reactions {
            Ok(rows) => {
                let mut counts: HashMap<Uuid, (i64, i64)> = HashMap::new();
                for row in rows {
                    let entry = counts.entry(row.post_id).or_insert((0, 0));
                    match row.kind {
                        ReactionKind::Helpful => entry.0 += 1,
                        ReactionKind::Insightful => entry.1 += 1,
                    }
                }
                counts
            }
            Err(err) => {
                warn!(
                    post_count = post_ids.len(),
                    error = %err,
                    "bulk reaction fetch failed, defaulting reaction counts to zero"
                );
                HashMap::new()
            }
        };

        let comment_counts: HashMap<Uuid, i64> = match comments {
            Ok(counts) => counts,
            Err(err) => {
                warn!(
                    post_count = post_ids.len(),
                    error = %err,
                    "bulk comment fetch failed, defaulting comment counts to zero"
                );
                HashMap::new()
            }
        };

        for post in &mut posts {
            let (helpful, insightful) = reaction_counts.get(&post.id).copied().unwrap_or((0, 0));
            post.helpful_count = helpful;
            post.insightful_count = insightful;
            post.comment_count = comment_counts.get(&post.id).copied().unwrap_or(0);
        }
        posts
    }

    /// Authoritative counts for one post. Used by the reaction engine to
    /// re-anchor after a mutation, so failures propagate instead of
    /// degrading.
    pub async fn recount(&self, post_id: Uuid) -> EngineResult<EngagementCounts> {
        let (reactions, comments) = tokio::join!(
            self.reactions.counts_for_post(post_id),
            self.comments.count_for_post(post_id)
        );

        let (helpful, insightful) = reactions?;
        let comments = comments?;
        Ok(EngagementCounts {
            helpful,
            insightful,
            comments,
        })
    }
}
