//! Feed aggregation and reaction consistency engine for topic-scoped
//! communities.
//!
//! Library-level contract consumed by presentation code: it owns feed
//! enrichment, counting, composition, membership resolution and reaction
//! toggling, and talks to the world through the [`store::Datastore`] and
//! [`identity::IdentityResolver`] seams.

pub mod config;
pub mod domain;
pub mod error;
pub mod identity;
pub mod repository;
pub mod services;
pub mod store;
