//! Identity resolution.
//!
//! The engines never read session state directly; they ask an
//! [`IdentityResolver`] for the acting user. Production wires
//! [`DeviceIdentity`] (session principal from the external identity
//! provider, anonymous fallback persisted per device); tests wire
//! [`StaticIdentity`].

use std::sync::Arc;
use tracing::warn;
use uuid::Uuid;

use crate::error::{EngineError, EngineResult, StoreError};
use crate::store::{Assignments, Datastore, Filter, SelectQuery, StoreValue};

/// Yields a stable user identifier for the current caller.
#[async_trait::async_trait]
pub trait IdentityResolver: Send + Sync {
    /// Authenticated principal, if a session exists.
    async fn current_user_id(&self) -> Option<Uuid>;

    /// Stable per-device anonymous identifier, generated once and persisted.
    /// `None` when the identifier cannot be resolved or persisted.
    async fn anonymous_id(&self) -> Option<Uuid>;

    /// Authenticated principal, else anonymous identity.
    async fn resolve(&self) -> EngineResult<Uuid> {
        if let Some(user_id) = self.current_user_id().await {
            return Ok(user_id);
        }
        if let Some(anonymous) = self.anonymous_id().await {
            return Ok(anonymous);
        }
        Err(EngineError::Unauthenticated)
    }
}

/// Fixed resolver for tests.
#[derive(Debug, Clone, Default)]
pub struct StaticIdentity {
    pub user: Option<Uuid>,
    pub anonymous: Option<Uuid>,
}

impl StaticIdentity {
    pub fn authenticated(user: Uuid) -> Self {
        Self {
            user: Some(user),
            anonymous: None,
        }
    }

    pub fn anonymous(anonymous: Uuid) -> Self {
        Self {
            user: None,
            anonymous: Some(anonymous),
        }
    }

    pub fn unauthenticated() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl IdentityResolver for StaticIdentity {
    async fn current_user_id(&self) -> Option<Uuid> {
        self.user
    }

    async fn anonymous_id(&self) -> Option<Uuid> {
        self.anonymous
    }
}

const DEVICE_IDENTITIES: &str = "device_identities";

/// Resolver holding the session principal (if any) and a device-scoped
/// anonymous identity persisted in a side table.
pub struct DeviceIdentity {
    store: Arc<dyn Datastore>,
    device_key: String,
    session: Option<Uuid>,
}

impl DeviceIdentity {
    pub fn new(store: Arc<dyn Datastore>, device_key: String, session: Option<Uuid>) -> Self {
        Self {
            store,
            device_key,
            session,
        }
    }

    async fn lookup(&self) -> Result<Option<Uuid>, StoreError> {
        let row = self
            .store
            .select_one(
                SelectQuery::from(DEVICE_IDENTITIES)
                    .columns(&["user_id"])
                    .filter(Filter::eq("device_key", self.device_key.as_str())),
            )
            .await?;

        Ok(row
            .and_then(|row| row.get("user_id").cloned())
            .and_then(|value| serde_json::from_value(value).ok()))
    }
}

#[async_trait::async_trait]
impl IdentityResolver for DeviceIdentity {
    async fn current_user_id(&self) -> Option<Uuid> {
        self.session
    }

    async fn anonymous_id(&self) -> Option<Uuid> {
        match self.lookup().await {
            Ok(Some(user_id)) => return Some(user_id),
            Ok(None) => {}
            Err(err) => {
                warn!(error = %err, "anonymous identity lookup failed");
                return None;
            }
        }

        let generated = Uuid::new_v4();
        let row: Assignments = vec![
            ("device_key".to_string(), StoreValue::from(self.device_key.as_str())),
            ("user_id".to_string(), StoreValue::from(generated)),
        ];

        match self.store.insert(DEVICE_IDENTITIES, row).await {
            Ok(_) => Some(generated),
            // Lost a generate-once race; the winner's id is authoritative.
            Err(StoreError::UniqueViolation) => match self.lookup().await {
                Ok(found) => found,
                Err(err) => {
                    warn!(error = %err, "anonymous identity re-read failed");
                    None
                }
            },
            Err(err) => {
                warn!(error = %err, "anonymous identity persist failed");
                None
            }
        }
    }
}
