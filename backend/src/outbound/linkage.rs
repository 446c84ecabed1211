//! In-memory pending-link store.
//!
//! The deployment model is single-process, so pending federated linkages
//! live in process memory. Expired records are
//! swept opportunistically on reads and writes; the identity service applies
//! the TTL check again on use.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use uuid::Uuid;

use crate::domain::ports::{LinkToken, PendingLink, PendingLinkStore, PendingLinkStoreError};

/// Process-local pending-link store with opportunistic expiry sweeping.
pub struct InMemoryPendingLinkStore {
    retention: Duration,
    entries: Mutex<HashMap<Uuid, PendingLink>>,
}

impl InMemoryPendingLinkStore {
    /// Create a store with the default 30-minute retention window.
    pub fn new() -> Self {
        Self::with_retention(Duration::minutes(30))
    }

    /// Create a store that drops records older than `retention`.
    pub fn with_retention(retention: Duration) -> Self {
        Self {
            retention,
            entries: Mutex::new(HashMap::new()),
        }
    }

    fn lock_and_sweep(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, HashMap<Uuid, PendingLink>>, PendingLinkStoreError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| PendingLinkStoreError::store("pending link store poisoned"))?;
        let now = Utc::now();
        entries.retain(|_, link| !link.is_expired(self.retention, now));
        Ok(entries)
    }
}

impl Default for InMemoryPendingLinkStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PendingLinkStore for InMemoryPendingLinkStore {
    async fn put(&self, link: PendingLink) -> Result<(), PendingLinkStoreError> {
        self.lock_and_sweep()?.insert(*link.token.as_uuid(), link);
        Ok(())
    }

    async fn get(&self, token: &LinkToken) -> Result<Option<PendingLink>, PendingLinkStoreError> {
        Ok(self.lock_and_sweep()?.get(token.as_uuid()).cloned())
    }

    async fn remove(&self, token: &LinkToken) -> Result<(), PendingLinkStoreError> {
        self.lock_and_sweep()?.remove(token.as_uuid());
        Ok(())
    }
}
