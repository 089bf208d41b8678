//! Membership oracle.
//!
//! Membership is a union of presence across two physical tables (current +
//! legacy schema generations). Reads never error: a failed sub-check is
//! logged and treated as "not found". No caching: join/leave must be
//! visible to the reaction gate immediately.

use std::sync::Arc;
use tracing::warn;
use uuid::Uuid;

use crate::error::{EngineResult, StoreError};
use crate::repository::{CommunityRepository, MembershipSource};

pub struct MembershipOracle {
    current: Arc<dyn MembershipSource>,
    legacy: Arc<dyn MembershipSource>,
    communities: CommunityRepository,
}

impl MembershipOracle {
    pub fn new(
        current: Arc<dyn MembershipSource>,
        legacy: Arc<dyn MembershipSource>,
        communities: CommunityRepository,
    ) -> Self {
        Self {
            current,
            legacy,
            communities,
        }
    }

    /// Whether the user belongs to the community.
    ///
    /// Checks the current table first; the legacy table is consulted only
    /// when the current check found no row. Never errors.
    pub async fn is_member(&self, user_id: Uuid, community_id: Uuid) -> bool {
        for source in [&self.current, &self.legacy] {
            match source.contains(user_id, community_id).await {
                Ok(true) => return true,
                Ok(false) => {}
                Err(err) => {
                    warn!(
                        source = source.name(),
                        %user_id,
                        %community_id,
                        error = %err,
                        "membership check failed, treating as absent"
                    );
                }
            }
        }
        false
    }

    /// Record membership in the current table and bump the community's
    /// cached member count. Joining twice is success-equivalent.
    pub async fn join(&self, user_id: Uuid, community_id: Uuid) -> EngineResult<()> {
        match self.current.add(user_id, community_id).await {
            Ok(()) => {}
            Err(StoreError::UniqueViolation) => return Ok(()),
            Err(err) => return Err(err.into()),
        }

        // The cached count is a hint; a failed adjust is not a failed join.
        if let Err(err) = self.communities.adjust_member_count(community_id, 1).await {
            warn!(%community_id, error = %err, "member count adjust failed after join");
        }
        Ok(())
    }

    /// Remove membership from both tables (union semantics on the way out)
    /// and decrement the cached count when a row was actually removed.
    pub async fn leave(&self, user_id: Uuid, community_id: Uuid) -> EngineResult<()> {
        let mut removed = 0u64;
        for source in [&self.current, &self.legacy] {
            removed += source.remove(user_id, community_id).await?;
        }

        if removed > 0 {
            if let Err(err) = self.communities.adjust_member_count(community_id, -1).await {
                warn!(%community_id, error = %err, "member count adjust failed after leave");
            }
        }
        Ok(())
    }
}
