use std::sync::Arc;
use uuid::Uuid;

use crate::domain::models::Profile;
use crate::error::StoreResult;
use crate::store::{decode, Datastore, Filter, SelectQuery};

const PROFILES: &str = "profiles";

/// Repository for user profile rows
#[derive(Clone)]
pub struct ProfileRepository {
    store: Arc<dyn Datastore>,
}

impl ProfileRepository {
    pub fn new(store: Arc<dyn Datastore>) -> Self {
        Self { store }
    }

    pub async fn get(&self, user_id: Uuid) -> StoreResult<Option<Profile>> {
        let row = self
            .store
            .select_one(SelectQuery::from(PROFILES).filter(Filter::eq("id", user_id)))
            .await?;

        row.map(decode).transpose()
    }
}
