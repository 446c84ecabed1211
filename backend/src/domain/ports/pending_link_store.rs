//! Port for short-lived federated-identity linkage state.
//!
//! The federated sign-in flow spans multiple round-trips. Instead of ad hoc
//! session keys, the pending state is an explicit record addressed by an
//! opaque token with a bounded lifetime; the session carries only the token.

use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::user::{EmailAddress, FederatedId};

/// Opaque reference to a pending linkage record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LinkToken(Uuid);

impl LinkToken {
    /// Generate a new random token.
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an existing UUID.
    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Access the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for LinkToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Pending federated-identity linkage awaiting password setup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingLink {
    pub token: LinkToken,
    pub federated_id: FederatedId,
    pub email: EmailAddress,
    pub name: Option<String>,
    pub picture_url: Option<String>,
    pub issued_at: DateTime<Utc>,
}

impl PendingLink {
    /// Create a pending linkage record with a fresh token.
    pub fn new(
        federated_id: FederatedId,
        email: EmailAddress,
        name: Option<String>,
        picture_url: Option<String>,
    ) -> Self {
        Self {
            token: LinkToken::random(),
            federated_id,
            email,
            name,
            picture_url,
            issued_at: Utc::now(),
        }
    }

    /// Whether the record has outlived `ttl` as of `now`.
    pub fn is_expired(&self, ttl: Duration, now: DateTime<Utc>) -> bool {
        self.issued_at + ttl < now
    }
}

/// Storage errors raised by pending link store adapters.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PendingLinkStoreError {
    /// The store rejected the operation.
    #[error("pending link store failed: {message}")]
    Store { message: String },
}

impl PendingLinkStoreError {
    /// Create a store error with the given message.
    pub fn store(message: impl Into<String>) -> Self {
        Self::Store {
            message: message.into(),
        }
    }
}

/// Port for pending linkage records.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PendingLinkStore: Send + Sync {
    /// Store a pending linkage record, replacing any record with the same
    /// token.
    async fn put(&self, link: PendingLink) -> Result<(), PendingLinkStoreError>;

    /// Fetch a record by token. Expired records may be reported as absent.
    async fn get(&self, token: &LinkToken) -> Result<Option<PendingLink>, PendingLinkStoreError>;

    /// Remove a record, if present.
    async fn remove(&self, token: &LinkToken) -> Result<(), PendingLinkStoreError>;
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;

    fn link() -> PendingLink {
        PendingLink::new(
            FederatedId::new("google-123").expect("valid id"),
            EmailAddress::new("ada@example.com").expect("valid email"),
            None,
            None,
        )
    }

    #[test]
    fn fresh_links_are_not_expired() {
        let link = link();
        assert!(!link.is_expired(Duration::minutes(15), Utc::now()));
    }

    #[test]
    fn aged_links_expire() {
        let mut link = link();
        link.issued_at = Utc::now() - Duration::minutes(16);
        assert!(link.is_expired(Duration::minutes(15), Utc::now()));
    }
}
