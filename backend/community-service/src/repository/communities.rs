use std::sync::Arc;
use uuid::Uuid;

use crate::domain::models::Community;
use crate::error::StoreResult;
use crate::store::{decode, Datastore, Filter, SelectQuery, StoreValue};

const COMMUNITIES: &str = "communities";

/// Repository for community rows
#[derive(Clone)]
pub struct CommunityRepository {
    store: Arc<dyn Datastore>,
}

impl CommunityRepository {
    pub fn new(store: Arc<dyn Datastore>) -> Self {
        Self { store }
    }

    pub async fn get(&self, community_id: Uuid) -> StoreResult<Option<Community>> {
        let row = self
            .store
            .select_one(SelectQuery::from(COMMUNITIES).filter(Filter::eq("id", community_id)))
            .await?;

        row.map(decode).transpose()
    }

    /// Display name only, for the enrichment fan-out.
    pub async fn display_name(&self, community_id: Uuid) -> StoreResult<Option<String>> {
        let row = self
            .store
            .select_one(
                SelectQuery::from(COMMUNITIES)
                    .columns(&["name"])
                    .filter(Filter::eq("id", community_id)),
            )
            .await?;

        Ok(row
            .and_then(|row| row.get("name").cloned())
            .and_then(|value| value.as_str().map(|s| s.to_string())))
    }

    /// Adjust the cached member count by `delta`, floored at zero.
    ///
    /// The count is an eventually-consistent hint, not reconciled here, so
    /// a read-modify-write without locking is acceptable.
    pub async fn adjust_member_count(&self, community_id: Uuid, delta: i64) -> StoreResult<()> {
        let Some(community) = self.get(community_id).await? else {
            return Ok(());
        };

        let next = (community.member_count + delta).max(0);
        self.store
            .update(
                COMMUNITIES,
                &[Filter::eq("id", community_id)],
                vec![("member_count".to_string(), StoreValue::from(next))],
            )
            .await?;

        Ok(())
    }
}
