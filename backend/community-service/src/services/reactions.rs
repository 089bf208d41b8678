//! Reaction toggle engine.
//!
//! Per (user, post, kind) the reaction state is boolean and the only
//! operation is a toggle. A local ledger is updated optimistically for UI
//! responsiveness, then overwritten unconditionally by an authoritative
//! recount. The optimistic value is a latency hint, never the system of
//! record, so two toggles can never leave a count permanently off by one.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::domain::models::{EngagementCounts, EnrichedPost, ReactionKind};
use crate::error::{EngineError, EngineResult, StoreError};
use crate::identity::IdentityResolver;
use crate::repository::ReactionRepository;
use crate::services::counts::CountAggregator;
use crate::services::membership::MembershipOracle;

/// Direction a toggle resolved to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    Added,
    Removed,
}

/// Result of a successful toggle: authoritative counts plus the caller's
/// reacted state for the toggled kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToggleOutcome {
    pub applied: Applied,
    pub helpful_count: i64,
    pub insightful_count: i64,
    pub reacted: bool,
}

/// Locally known per-post reaction state, as shown while a round trip is in
/// flight.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PostReactionView {
    pub helpful_count: i64,
    pub insightful_count: i64,
    pub reacted_helpful: bool,
    pub reacted_insightful: bool,
}

pub struct ReactionEngine {
    identity: Arc<dyn IdentityResolver>,
    oracle: Arc<MembershipOracle>,
    reactions: ReactionRepository,
    counts: Arc<CountAggregator>,
    ledger: Mutex<HashMap<Uuid, PostReactionView>>,
    in_flight: Mutex<HashSet<(Uuid, ReactionKind)>>,
}

impl ReactionEngine {
    pub fn new(
        identity: Arc<dyn IdentityResolver>,
        oracle: Arc<MembershipOracle>,
        reactions: ReactionRepository,
        counts: Arc<CountAggregator>,
    ) -> Self {
        Self {
            identity,
            oracle,
            reactions,
            counts,
            ledger: Mutex::new(HashMap::new()),
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    /// Seed the local ledger from a freshly fetched feed.
    pub async fn prime(&self, posts: &[EnrichedPost]) {
        let mut ledger = self.ledger.lock().await;
        for post in posts {
            let entry = ledger.entry(post.id).or_default();
            entry.helpful_count = post.helpful_count;
            entry.insightful_count = post.insightful_count;
        }
    }

    /// Locally known state for a post, if any toggle or prime touched it.
    pub async fn local_view(&self, post_id: Uuid) -> Option<PostReactionView> {
        self.ledger.lock().await.get(&post_id).copied()
    }

    /// Toggle a reaction for the acting user.
    ///
    /// `user` overrides identity resolution when the caller already knows
    /// the principal; otherwise the resolver supplies the authenticated or
    /// anonymous identity. When `community_id` is given the action is gated
    /// on membership and nothing is mutated for non-members.
    pub async fn toggle(
        &self,
        user: Option<Uuid>,
        post_id: Uuid,
        kind: ReactionKind,
        community_id: Option<Uuid>,
    ) -> EngineResult<ToggleOutcome> {
        // Busy flag, not a queue: a second toggle for the same target while
        // one is in flight is rejected outright.
        {
            let mut in_flight = self.in_flight.lock().await;
            if !in_flight.insert((post_id, kind)) {
                return Err(EngineError::ToggleInFlight);
            }
        }

        let result = self.toggle_inner(user, post_id, kind, community_id).await;

        self.in_flight.lock().await.remove(&(post_id, kind));
        result
    }

    async fn toggle_inner(
        &self,
        user: Option<Uuid>,
        post_id: Uuid,
        kind: ReactionKind,
        community_id: Option<Uuid>,
    ) -> EngineResult<ToggleOutcome> {
        let user_id = match user {
            Some(user_id) => user_id,
            None => self.identity.resolve().await?,
        };

        if let Some(community_id) = community_id {
            if !self.oracle.is_member(user_id, community_id).await {
                return Err(EngineError::NotAMember {
                    user_id,
                    community_id,
                });
            }
        }

        let reacted_before = self.reactions.exists(user_id, post_id, kind).await?;

        let applied = if reacted_before {
            self.reactions.remove(user_id, post_id, kind).await?;
            Applied::Removed
        } else {
            match self.reactions.add(user_id, post_id, kind).await {
                Ok(()) => Applied::Added,
                // Racing double-add: the reaction exists, which is what the
                // caller asked for.
                Err(StoreError::UniqueViolation) => Applied::Added,
                Err(err) => return Err(err.into()),
            }
        };

        self.apply_optimistic(post_id, kind, applied).await;

        let counts = self.counts.recount(post_id).await?;
        self.reconcile(post_id, kind, applied, counts).await;

        Ok(ToggleOutcome {
            applied,
            helpful_count: counts.helpful,
            insightful_count: counts.insightful,
            reacted: applied == Applied::Added,
        })
    }

    /// Speculative local delta for perceived latency: ±1 floored at zero
    /// plus a boolean flip.
    async fn apply_optimistic(&self, post_id: Uuid, kind: ReactionKind, applied: Applied) {
        let mut ledger = self.ledger.lock().await;
        let entry = ledger.entry(post_id).or_default();
        let delta = match applied {
            Applied::Added => 1,
            Applied::Removed => -1,
        };
        match kind {
            ReactionKind::Helpful => {
                entry.helpful_count = (entry.helpful_count + delta).max(0);
                entry.reacted_helpful = applied == Applied::Added;
            }
            ReactionKind::Insightful => {
                entry.insightful_count = (entry.insightful_count + delta).max(0);
                entry.reacted_insightful = applied == Applied::Added;
            }
        }
    }

    /// Overwrite the speculative entry with server-confirmed counts.
    async fn reconcile(
        &self,
        post_id: Uuid,
        kind: ReactionKind,
        applied: Applied,
        counts: EngagementCounts,
    ) {
        let mut ledger = self.ledger.lock().await;
        let entry = ledger.entry(post_id).or_default();
        entry.helpful_count = counts.helpful;
        entry.insightful_count = counts.insightful;
        match kind {
            ReactionKind::Helpful => entry.reacted_helpful = applied == Applied::Added,
            ReactionKind::Insightful => entry.reacted_insightful = applied == Applied::Added,
        }
    }
}
