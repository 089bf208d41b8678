//! Shared fixtures: an in-memory gateway with the production constraints
//! declared, plus row seeders.

#![allow(dead_code)]

use chrono::{DateTime, Utc};
use std::sync::Arc;
use uuid::Uuid;

use community_service::store::{Assignments, Datastore, MemoryDatastore, StoreValue};

/// Fresh store with the unique indexes and foreign keys the production
/// schema carries.
pub async fn new_store() -> Arc<MemoryDatastore> {
    let store = MemoryDatastore::new();
    store
        .declare_unique("reactions", &["post_id", "user_id", "kind"])
        .await;
    store.declare_foreign_key("reactions", "post_id", "posts").await;
    store
        .declare_unique("community_members", &["user_id", "community_id"])
        .await;
    store
        .declare_unique("group_members", &["user_id", "community_id"])
        .await;
    store.declare_unique("device_identities", &["device_key"]).await;
    Arc::new(store)
}

pub async fn seed_community(store: &MemoryDatastore, name: &str) -> Uuid {
    let id = Uuid::new_v4();
    let row: Assignments = vec![
        ("id".to_string(), StoreValue::from(id)),
        ("name".to_string(), StoreValue::from(name)),
        ("member_count".to_string(), StoreValue::from(0i64)),
    ];
    store.insert("communities", row).await.unwrap();
    id
}

pub async fn seed_profile(store: &MemoryDatastore, display_name: &str) -> Uuid {
    let id = Uuid::new_v4();
    let row: Assignments = vec![
        ("id".to_string(), StoreValue::from(id)),
        ("display_name".to_string(), StoreValue::from(display_name)),
        ("avatar_url".to_string(), StoreValue::Null),
    ];
    store.insert("profiles", row).await.unwrap();
    id
}

pub async fn seed_post(
    store: &MemoryDatastore,
    community_id: Uuid,
    author_id: Option<Uuid>,
    title: &str,
    raw_content: &str,
    created_at: DateTime<Utc>,
) -> Uuid {
    let id = Uuid::new_v4();
    let row: Assignments = vec![
        ("id".to_string(), StoreValue::from(id)),
        ("community_id".to_string(), StoreValue::from(community_id)),
        ("author_id".to_string(), StoreValue::from(author_id)),
        ("title".to_string(), StoreValue::from(title)),
        ("raw_content".to_string(), StoreValue::from(raw_content)),
        ("cover_image_url".to_string(), StoreValue::Null),
        ("created_at".to_string(), StoreValue::from(created_at)),
    ];
    store.insert("posts", row).await.unwrap();
    id
}

pub async fn seed_comment(store: &MemoryDatastore, post_id: Uuid) {
    let row: Assignments = vec![
        ("id".to_string(), StoreValue::from(Uuid::new_v4())),
        ("post_id".to_string(), StoreValue::from(post_id)),
        ("content".to_string(), StoreValue::from("a comment")),
        ("created_at".to_string(), StoreValue::from(Utc::now())),
    ];
    store.insert("comments", row).await.unwrap();
}

pub async fn seed_poll_option(store: &MemoryDatastore, post_id: Uuid, label: &str) {
    let row: Assignments = vec![
        ("id".to_string(), StoreValue::from(Uuid::new_v4())),
        ("post_id".to_string(), StoreValue::from(post_id)),
        ("label".to_string(), StoreValue::from(label)),
    ];
    store.insert("poll_options", row).await.unwrap();
}

pub async fn seed_media_attachment(store: &MemoryDatastore, post_id: Uuid) {
    let row: Assignments = vec![
        ("id".to_string(), StoreValue::from(Uuid::new_v4())),
        ("post_id".to_string(), StoreValue::from(post_id)),
        ("url".to_string(), StoreValue::from("https://cdn.example/img.png")),
    ];
    store.insert("media_attachments", row).await.unwrap();
}

pub async fn seed_reaction(store: &MemoryDatastore, post_id: Uuid, user_id: Uuid, kind: &str) {
    let row: Assignments = vec![
        ("id".to_string(), StoreValue::from(Uuid::new_v4())),
        ("post_id".to_string(), StoreValue::from(post_id)),
        ("user_id".to_string(), StoreValue::from(user_id)),
        ("kind".to_string(), StoreValue::from(kind)),
        ("created_at".to_string(), StoreValue::from(Utc::now())),
    ];
    store.insert("reactions", row).await.unwrap();
}

pub async fn seed_membership(
    store: &MemoryDatastore,
    table: &str,
    user_id: Uuid,
    community_id: Uuid,
) {
    let row: Assignments = vec![
        ("user_id".to_string(), StoreValue::from(user_id)),
        ("community_id".to_string(), StoreValue::from(community_id)),
    ];
    store.insert(table, row).await.unwrap();
}
