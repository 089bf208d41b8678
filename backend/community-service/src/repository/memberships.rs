use std::sync::Arc;
use uuid::Uuid;

use crate::error::StoreResult;
use crate::store::{Assignments, Datastore, Filter, SelectQuery, StoreValue};

/// Current membership table.
const CURRENT_TABLE: &str = "community_members";
/// Legacy membership table, carried from the previous schema generation.
/// Presence in either table means membership.
const LEGACY_TABLE: &str = "group_members";

/// One physical location of the membership fact.
///
/// The system carries two historical schemas for the same relationship; the
/// oracle unions two of these so older members never lose access. Keeping
/// the table name behind this trait isolates the migration debt here.
#[async_trait::async_trait]
pub trait MembershipSource: Send + Sync {
    /// Physical table behind this source, for logging.
    fn name(&self) -> &str;

    /// Whether the (user, community) row exists here.
    async fn contains(&self, user_id: Uuid, community_id: Uuid) -> StoreResult<bool>;

    /// Record membership here.
    async fn add(&self, user_id: Uuid, community_id: Uuid) -> StoreResult<()>;

    /// Remove membership here, returning the number of rows removed.
    async fn remove(&self, user_id: Uuid, community_id: Uuid) -> StoreResult<u64>;
}

/// Membership source over one named table.
#[derive(Clone)]
pub struct TableMembershipSource {
    store: Arc<dyn Datastore>,
    table: &'static str,
}

impl TableMembershipSource {
    pub fn current(store: Arc<dyn Datastore>) -> Self {
        Self {
            store,
            table: CURRENT_TABLE,
        }
    }

    pub fn legacy(store: Arc<dyn Datastore>) -> Self {
        Self {
            store,
            table: LEGACY_TABLE,
        }
    }
}

#[async_trait::async_trait]
impl MembershipSource for TableMembershipSource {
    fn name(&self) -> &str {
        self.table
    }

    async fn contains(&self, user_id: Uuid, community_id: Uuid) -> StoreResult<bool> {
        let row = self
            .store
            .select_one(
                SelectQuery::from(self.table)
                    .columns(&["user_id"])
                    .filter(Filter::eq("user_id", user_id))
                    .filter(Filter::eq("community_id", community_id)),
            )
            .await?;

        Ok(row.is_some())
    }

    async fn add(&self, user_id: Uuid, community_id: Uuid) -> StoreResult<()> {
        let row: Assignments = vec![
            ("user_id".to_string(), StoreValue::from(user_id)),
            ("community_id".to_string(), StoreValue::from(community_id)),
        ];

        self.store.insert(self.table, row).await?;
        Ok(())
    }

    async fn remove(&self, user_id: Uuid, community_id: Uuid) -> StoreResult<u64> {
        self.store
            .delete(
                self.table,
                &[
                    Filter::eq("user_id", user_id),
                    Filter::eq("community_id", community_id),
                ],
            )
            .await
    }
}
