//! Integration tests: device-scoped anonymous identity.

mod common;

use std::sync::Arc;
use uuid::Uuid;

use community_service::error::EngineError;
use community_service::identity::{DeviceIdentity, IdentityResolver};
use community_service::store::{Assignments, Datastore, StoreValue};

use common::*;

#[tokio::test]
async fn anonymous_id_is_generated_once_and_persisted() {
    let store = new_store().await;
    let identity = DeviceIdentity::new(store.clone(), "device-1".to_string(), None);

    let first = identity.anonymous_id().await.unwrap();
    let second = identity.anonymous_id().await.unwrap();

    assert_eq!(first, second);
    assert_eq!(store.table_len("device_identities").await, 1);
}

#[tokio::test]
async fn devices_get_distinct_anonymous_ids() {
    let store = new_store().await;
    let a = DeviceIdentity::new(store.clone(), "device-a".to_string(), None);
    let b = DeviceIdentity::new(store.clone(), "device-b".to_string(), None);

    assert_ne!(a.anonymous_id().await.unwrap(), b.anonymous_id().await.unwrap());
}

#[tokio::test]
async fn existing_side_table_row_wins() {
    let store = new_store().await;
    let persisted = Uuid::new_v4();
    let row: Assignments = vec![
        ("device_key".to_string(), StoreValue::from("device-1")),
        ("user_id".to_string(), StoreValue::from(persisted)),
    ];
    store.insert("device_identities", row).await.unwrap();

    let identity = DeviceIdentity::new(store.clone(), "device-1".to_string(), None);
    assert_eq!(identity.anonymous_id().await, Some(persisted));
}

#[tokio::test]
async fn session_principal_takes_precedence() {
    let store = new_store().await;
    let principal = Uuid::new_v4();
    let identity = DeviceIdentity::new(store.clone(), "device-1".to_string(), Some(principal));

    assert_eq!(identity.resolve().await.unwrap(), principal);
    // No anonymous identity was minted along the way.
    assert_eq!(store.table_len("device_identities").await, 0);
}

#[tokio::test]
async fn unreachable_side_table_resolves_to_unauthenticated() {
    let store = new_store().await;
    store.fail_table("device_identities").await;

    let identity = DeviceIdentity::new(store.clone(), "device-1".to_string(), None);
    assert!(identity.anonymous_id().await.is_none());
    assert!(matches!(
        identity.resolve().await,
        Err(EngineError::Unauthenticated)
    ));
}
