use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Raw post row, as stored. Enrichment fields live on [`EnrichedPost`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub community_id: Uuid,
    /// Anonymous posts carry no author.
    pub author_id: Option<Uuid>,
    pub title: String,
    /// May embed inline HTML for media.
    pub raw_content: String,
    pub cover_image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Community entity. `member_count` is a cached, eventually-consistent
/// count, adjusted optimistically on join/leave.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Community {
    pub id: Uuid,
    pub name: String,
    pub member_count: i64,
}

/// User profile as seen by the enrichment pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub id: Uuid,
    pub display_name: String,
    pub avatar_url: Option<String>,
}

/// Reaction row. At most one per (post, user, kind).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reaction {
    pub id: Uuid,
    pub post_id: Uuid,
    pub user_id: Uuid,
    pub kind: ReactionKind,
    pub created_at: DateTime<Utc>,
}

/// Reaction kinds. Toggle semantics, not multiplicity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReactionKind {
    Helpful,
    Insightful,
}

impl ReactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReactionKind::Helpful => "helpful",
            ReactionKind::Insightful => "insightful",
        }
    }
}

/// Content classification of a post.
///
/// Precedence when several apply: a poll is never reclassified as media,
/// even if the content also embeds an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Text,
    Media,
    Poll,
}

/// Per-post engagement counts. Always >= 0.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngagementCounts {
    pub helpful: i64,
    pub insightful: i64,
    pub comments: i64,
}

/// Fully denormalized post record produced by the enrichment pipeline.
///
/// Fields that failed to resolve carry documented defaults
/// ("Unknown Community", "Unknown User", no avatar) rather than being
/// omitted, so downstream code needs no null checks beyond what the types
/// declare.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichedPost {
    pub id: Uuid,
    pub community_id: Uuid,
    pub author_id: Option<Uuid>,
    pub title: String,
    pub raw_content: String,
    pub cover_image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub community_name: String,
    pub author_display_name: String,
    pub author_avatar_url: Option<String>,
    pub content_type: ContentType,
    pub helpful_count: i64,
    pub insightful_count: i64,
    pub comment_count: i64,
}

impl EnrichedPost {
    /// Default display name for a community that failed to resolve.
    pub const UNKNOWN_COMMUNITY: &'static str = "Unknown Community";
    /// Default display name for an author that failed to resolve (or an
    /// anonymous post).
    pub const UNKNOWN_USER: &'static str = "Unknown User";
}
