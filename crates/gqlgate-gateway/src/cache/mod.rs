//! Query caches consulted by the execution engine.
//!
//! Two independent bounded caches sit in front of execution:
//! - documents: raw query text -> parsed [`Document`]
//! - persisted queries: APQ hash -> full query text
//!
//! The engine only sees the [`QueryCache`] trait, so tests can swap in
//! small or instrumented instances.

pub mod lru;

use std::sync::Arc;

use gqlgate_core::protocol::document::Document;

pub use self::lru::BoundedLru;

/// Lookup/insert contract the engine consumes.
///
/// Both operations count as an access for recency purposes.
pub trait QueryCache<V>: Send + Sync {
    fn lookup(&self, key: &str) -> Option<V>;
    fn insert(&self, key: String, value: V);
}

pub type SharedDocumentCache = Arc<dyn QueryCache<Arc<Document>>>;
pub type SharedPersistedQueryCache = Arc<dyn QueryCache<String>>;
