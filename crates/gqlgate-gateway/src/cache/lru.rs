//! Fixed-capacity LRU store.
//!
//! Lookups promote entries, so both read and write paths take the same
//! exclusive lock.

use std::num::NonZeroUsize;
use std::sync::{Mutex, PoisonError};

use lru::LruCache;

use gqlgate_core::error::{GqlGateError, Result};

use super::QueryCache;

pub struct BoundedLru<V> {
    name: &'static str,
    inner: Mutex<LruCache<String, V>>,
}

impl<V: Clone> BoundedLru<V> {
    pub fn new(name: &'static str, capacity: NonZeroUsize) -> Self {
        Self {
            name,
            inner: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Capacity from config; zero is rejected.
    pub fn with_capacity(name: &'static str, capacity: usize) -> Result<Self> {
        let cap = NonZeroUsize::new(capacity).ok_or_else(|| {
            GqlGateError::BadRequest(format!("{name} cache capacity must be greater than 0"))
        })?;
        Ok(Self::new(name, cap))
    }

    pub fn capacity(&self) -> usize {
        self.lock().cap().get()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Membership test that leaves recency untouched.
    pub fn contains(&self, key: &str) -> bool {
        self.lock().contains(key)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, LruCache<String, V>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<V: Clone + Send> QueryCache<V> for BoundedLru<V> {
    fn lookup(&self, key: &str) -> Option<V> {
        self.lock().get(key).cloned()
    }

    fn insert(&self, key: String, value: V) {
        let evicted = {
            let mut g = self.lock();
            match g.push(key, value) {
                // `push` also hands back the old value when the key was present.
                Some((old_key, _)) if !g.contains(&old_key) => Some(old_key),
                _ => None,
            }
        };
        if let Some(k) = evicted {
            tracing::trace!(cache = self.name, evicted = %k, "lru eviction");
        }
    }
}
