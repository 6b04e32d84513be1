//! Concurrency-safe optional instant.
//!
//! Built once in `AppState::new` and handed out as `Arc<SharedTimestamp>`;
//! there is no global. Reads vastly outnumber writes, so the value sits
//! behind an `RwLock`. A poisoned lock is recovered rather than propagated:
//! the guarded value is a `Copy` instant and cannot be left half-written.

use std::sync::{PoisonError, RwLock};

use chrono::{DateTime, Utc};

#[derive(Debug, Default)]
pub struct SharedTimestamp {
    value: RwLock<Option<DateTime<Utc>>>,
}

impl SharedTimestamp {
    /// New holder with the value absent.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current value, `None` until the first `set`.
    pub fn get(&self) -> Option<DateTime<Utc>> {
        *self.value.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replace the value. Concurrent writers are ordered by the lock.
    pub fn set(&self, at: DateTime<Utc>) {
        *self.value.write().unwrap_or_else(PoisonError::into_inner) = Some(at);
    }

    /// Set to now and return the stored instant.
    pub fn touch(&self) -> DateTime<Utc> {
        let now = Utc::now();
        self.set(now);
        now
    }
}
