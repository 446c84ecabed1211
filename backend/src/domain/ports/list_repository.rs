//! Port abstraction for vocabulary list/entry persistence.

use async_trait::async_trait;

use crate::domain::user::UserId;
use crate::domain::vocabulary::{EntryId, ListId, ListName, VocabularyEntry, VocabularyList};

/// Persistence errors raised by list repository adapters.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ListPersistenceError {
    /// Repository connection could not be established.
    #[error("list repository connection failed: {message}")]
    Connection { message: String },
    /// Query or mutation failed during execution.
    #[error("list repository query failed: {message}")]
    Query { message: String },
    /// The per-owner name unique constraint rejected the write.
    #[error("owner already has a list named {name}")]
    DuplicateName { name: String },
}

impl ListPersistenceError {
    /// Create a connection error with the given message.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Create a query error with the given message.
    pub fn query(message: impl Into<String>) -> Self {
        Self::Query {
            message: message.into(),
        }
    }

    /// Create a duplicate-name error for the given list name.
    pub fn duplicate_name(name: impl Into<String>) -> Self {
        Self::DuplicateName { name: name.into() }
    }
}

/// Port for vocabulary list and entry persistence.
///
/// Multi-row mutations (`append_entries`, `delete_list`) are transactional:
/// either every row is written/removed or none are.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ListRepository: Send + Sync {
    /// Insert a new list. The compound `(owner, name)` constraint is the
    /// authoritative uniqueness check and surfaces as `DuplicateName`.
    async fn create_list(&self, list: &VocabularyList) -> Result<(), ListPersistenceError>;

    /// Insert a new list together with its first batch of entries, in one
    /// transaction: on any failure neither the list nor any entry survives.
    async fn create_list_with_entries(
        &self,
        list: &VocabularyList,
        entries: &[VocabularyEntry],
    ) -> Result<(), ListPersistenceError>;

    /// Fetch a list by identifier.
    async fn find_list(&self, id: &ListId) -> Result<Option<VocabularyList>, ListPersistenceError>;

    /// Fetch a list by exact name for one owner.
    async fn find_list_by_name(
        &self,
        owner: &UserId,
        name: &str,
    ) -> Result<Option<VocabularyList>, ListPersistenceError>;

    /// All lists owned by `owner`, newest first.
    async fn lists_for_owner(
        &self,
        owner: &UserId,
    ) -> Result<Vec<VocabularyList>, ListPersistenceError>;

    /// Rename a list, subject to the same uniqueness constraint.
    async fn rename_list(
        &self,
        id: &ListId,
        name: &ListName,
    ) -> Result<(), ListPersistenceError>;

    /// Delete a list and all of its entries in one transaction.
    async fn delete_list(&self, id: &ListId) -> Result<(), ListPersistenceError>;

    /// Append a batch of entries atomically.
    async fn append_entries(
        &self,
        entries: &[VocabularyEntry],
    ) -> Result<(), ListPersistenceError>;

    /// Fetch an entry by identifier.
    async fn find_entry(
        &self,
        id: &EntryId,
    ) -> Result<Option<VocabularyEntry>, ListPersistenceError>;

    /// All entries in a list, oldest first.
    async fn entries_for_list(
        &self,
        id: &ListId,
    ) -> Result<Vec<VocabularyEntry>, ListPersistenceError>;

    /// Persist changes to an existing entry.
    async fn update_entry(&self, entry: &VocabularyEntry) -> Result<(), ListPersistenceError>;

    /// Delete a single entry, leaving siblings and the parent list intact.
    async fn delete_entry(&self, id: &EntryId) -> Result<(), ListPersistenceError>;

    /// Number of lists owned by `owner`.
    async fn count_lists_for_owner(&self, owner: &UserId) -> Result<u64, ListPersistenceError>;

    /// Number of entries owned by `owner` across all lists.
    async fn count_entries_for_owner(&self, owner: &UserId)
        -> Result<u64, ListPersistenceError>;
}
