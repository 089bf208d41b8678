//! Feed view composer.
//!
//! Pure, synchronous and side-effect-free: category filter, then search,
//! then sort. The "now" instant is an explicit argument so identical inputs
//! always produce identical output.

use chrono::{DateTime, Duration, Utc};

use crate::domain::models::EnrichedPost;

/// Category filter over the enriched feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedFilter {
    All,
    /// Created within the last 24 hours.
    New,
    /// Title reads as a question.
    Questions,
    /// Question with no comments yet.
    Unanswered,
    /// Intentionally identical to `Unanswered`; both are kept because both
    /// ship in the product surface.
    Unreplied,
}

/// Sort order over the enriched feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedSort {
    /// Creation time bumped by a fixed quantum per comment. An
    /// approximation of last-activity: no last-comment timestamp exists to
    /// sort by.
    RecentActivity,
    /// Strict creation time, newest first.
    RecentPosts,
}

#[derive(Debug, Clone)]
pub struct ComposeOptions {
    /// Case-insensitive substring over title and content; empty matches
    /// everything.
    pub search: String,
    pub filter: FeedFilter,
    pub sort: FeedSort,
}

impl Default for ComposeOptions {
    fn default() -> Self {
        Self {
            search: String::new(),
            filter: FeedFilter::All,
            sort: FeedSort::RecentActivity,
        }
    }
}

/// Filter, search and sort the enriched feed. Filter runs before search,
/// search before sort.
pub fn compose(
    posts: Vec<EnrichedPost>,
    options: &ComposeOptions,
    now: DateTime<Utc>,
) -> Vec<EnrichedPost> {
    let mut posts: Vec<EnrichedPost> = posts
        .into_iter()
        .filter(|post| matches_filter(post, options.filter, now))
        .filter(|post| matches_search(post, &options.search))
        .collect();

    match options.sort {
        FeedSort::RecentPosts => posts.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
        FeedSort::RecentActivity => {
            posts.sort_by(|a, b| activity_score(b).cmp(&activity_score(a)))
        }
    }
    posts
}

/// A post is a question iff its trimmed title contains a question mark.
fn is_question(title: &str) -> bool {
    title.trim().contains('?')
}

fn matches_filter(post: &EnrichedPost, filter: FeedFilter, now: DateTime<Utc>) -> bool {
    match filter {
        FeedFilter::All => true,
        FeedFilter::New => now.signed_duration_since(post.created_at) <= Duration::hours(24),
        FeedFilter::Questions => is_question(&post.title),
        FeedFilter::Unanswered | FeedFilter::Unreplied => {
            is_question(&post.title) && post.comment_count == 0
        }
    }
}

fn matches_search(post: &EnrichedPost, search: &str) -> bool {
    let query = search.trim().to_lowercase();
    if query.is_empty() {
        return true;
    }
    post.title.to_lowercase().contains(&query) || post.raw_content.to_lowercase().contains(&query)
}

/// Comments bump recency by one second each.
fn activity_score(post: &EnrichedPost) -> i64 {
    post.created_at.timestamp_millis() + post.comment_count * 1000
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::ContentType;
    use uuid::Uuid;

    fn make_post(title: &str, content: &str, comment_count: i64, age_hours: i64) -> EnrichedPost {
        EnrichedPost {
            id: Uuid::new_v4(),
            community_id: Uuid::new_v4(),
            author_id: None,
            title: title.to_string(),
            raw_content: content.to_string(),
            cover_image_url: None,
            created_at: Utc::now() - Duration::hours(age_hours),
            community_name: "Test Community".to_string(),
            author_display_name: "Test User".to_string(),
            author_avatar_url: None,
            content_type: ContentType::Text,
            helpful_count: 0,
            insightful_count: 0,
            comment_count,
        }
    }

    #[test]
    fn test_all_filter_keeps_everything() {
        let posts = vec![
            make_post("a", "", 0, 1),
            make_post("b", "", 2, 30),
            make_post("c?", "", 0, 100),
        ];
        let composed = compose(posts, &ComposeOptions::default(), Utc::now());
        assert_eq!(composed.len(), 3);
    }

    #[test]
    fn test_new_filter_is_a_24_hour_window() {
        let posts = vec![
            make_post("fresh", "", 0, 2),
            make_post("stale", "", 0, 25),
        ];
        let options = ComposeOptions {
            filter: FeedFilter::New,
            ..Default::default()
        };
        let composed = compose(posts, &options, Utc::now());
        assert_eq!(composed.len(), 1);
        assert_eq!(composed[0].title, "fresh");
    }

    #[test]
    fn test_question_predicate_uses_trimmed_title() {
        let posts = vec![
            make_post("How do I deploy?  ", "", 0, 1),
            make_post("Why? because", "", 0, 1),
            make_post("Release notes", "", 0, 1),
        ];
        let options = ComposeOptions {
            filter: FeedFilter::Questions,
            ..Default::default()
        };
        let composed = compose(posts, &options, Utc::now());
        assert_eq!(composed.len(), 2);
    }

    #[test]
    fn test_unanswered_needs_question_and_zero_comments() {
        // End-to-end scenario: P1 is a fresh unanswered question, P2 an
        // older answered announcement.
        let posts = vec![
            make_post("How do I deploy?", "", 0, 2),
            make_post("Release notes", "", 3, 72),
        ];
        let options = ComposeOptions {
            filter: FeedFilter::Unanswered,
            ..Default::default()
        };
        let composed = compose(posts, &options, Utc::now());
        assert_eq!(composed.len(), 1);
        assert_eq!(composed[0].title, "How do I deploy?");
    }

    #[test]
    fn test_unreplied_behaves_exactly_like_unanswered() {
        // The two filters are defined identically on purpose; this locks
        // the equivalence so it cannot drift apart silently.
        let posts = vec![
            make_post("How?", "", 0, 1),
            make_post("How answered?", "", 1, 1),
            make_post("Statement", "", 0, 1),
        ];
        let unanswered = compose(
            posts.clone(),
            &ComposeOptions {
                filter: FeedFilter::Unanswered,
                ..Default::default()
            },
            Utc::now(),
        );
        let unreplied = compose(
            posts,
            &ComposeOptions {
                filter: FeedFilter::Unreplied,
                ..Default::default()
            },
            Utc::now(),
        );
        let titles = |list: &[EnrichedPost]| {
            list.iter().map(|p| p.title.clone()).collect::<Vec<_>>()
        };
        assert_eq!(titles(&unanswered), titles(&unreplied));
        assert_eq!(titles(&unanswered), vec!["How?"]);
    }

    #[test]
    fn test_search_is_case_insensitive_over_title_and_content() {
        let posts = vec![
            make_post("Deploy guide", "", 0, 1),
            make_post("Misc", "talks about DEPLOYMENT windows", 0, 1),
            make_post("Unrelated", "nothing here", 0, 1),
        ];
        let options = ComposeOptions {
            search: "deploy".to_string(),
            ..Default::default()
        };
        let composed = compose(posts, &options, Utc::now());
        assert_eq!(composed.len(), 2);
    }

    #[test]
    fn test_empty_search_matches_everything() {
        let posts = vec![make_post("a", "", 0, 1), make_post("b", "", 0, 1)];
        let options = ComposeOptions {
            search: "   ".to_string(),
            ..Default::default()
        };
        assert_eq!(compose(posts, &options, Utc::now()).len(), 2);
    }

    #[test]
    fn test_filter_and_search_compose() {
        // Only posts matching both the question predicate and the search
        // substring survive, regardless of which option "came first".
        let posts = vec![
            make_post("How do I deploy?", "", 0, 1),
            make_post("How do I test?", "", 0, 1),
            make_post("Deploy checklist", "", 0, 1),
        ];
        let options = ComposeOptions {
            search: "deploy".to_string(),
            filter: FeedFilter::Questions,
            ..Default::default()
        };
        let composed = compose(posts, &options, Utc::now());
        assert_eq!(composed.len(), 1);
        assert_eq!(composed[0].title, "How do I deploy?");
    }

    #[test]
    fn test_recent_posts_sorts_by_creation_desc() {
        let posts = vec![
            make_post("old", "", 50, 72),
            make_post("new", "", 0, 1),
            make_post("mid", "", 0, 24),
        ];
        let options = ComposeOptions {
            sort: FeedSort::RecentPosts,
            ..Default::default()
        };
        let composed = compose(posts, &options, Utc::now());
        let titles: Vec<_> = composed.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, vec!["new", "mid", "old"]);
    }

    #[test]
    fn test_recent_activity_comment_quantum_bumps_recency() {
        // Two posts created two seconds apart: five comments (5000ms) on
        // the older one outweigh the gap.
        let now = Utc::now();
        let mut older = make_post("older-but-active", "", 5, 0);
        older.created_at = now - Duration::seconds(2);
        let mut newer = make_post("newer-but-quiet", "", 0, 0);
        newer.created_at = now;

        let options = ComposeOptions {
            sort: FeedSort::RecentActivity,
            ..Default::default()
        };
        let composed = compose(vec![newer, older], &options, now);
        assert_eq!(composed[0].title, "older-but-active");
    }

    #[test]
    fn test_recent_activity_falls_back_to_creation_time() {
        let posts = vec![make_post("old", "", 0, 48), make_post("new", "", 0, 1)];
        let options = ComposeOptions {
            sort: FeedSort::RecentActivity,
            ..Default::default()
        };
        let composed = compose(posts, &options, Utc::now());
        assert_eq!(composed[0].title, "new");
    }
}
