//! List and entry curation use-cases.
//!
//! Every operation takes the resolved acting user and composes the
//! authorization guards before touching the repository. Name uniqueness is
//! checked twice: a pre-check for a friendly fast-path rejection, and the
//! storage constraint as the authoritative answer for the race window.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::domain::access::{require_active, require_owner_or_admin};
use crate::domain::error::Error;
use crate::domain::ports::{ListPersistenceError, ListRepository};
use crate::domain::user::{User, UserId};
use crate::domain::vocabulary::{
    EntryDraft, EntryEdit, EntryId, ListId, ListName, VocabularyEntry, VocabularyList,
    VocabularyValidationError,
};

/// Where a batch of enrichment results should be saved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SaveTarget {
    /// Append to a list the caller already owns.
    ExistingList(ListId),
    /// Create a new list with this name, then append.
    NewList(String),
}

/// Result of a save operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveOutcome {
    pub list: VocabularyList,
    pub appended: usize,
    pub created_list: bool,
}

/// List/entry counts for the profile and dashboard views.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurationStats {
    pub lists: u64,
    pub entries: u64,
}

/// Curation use-cases over list persistence.
#[derive(Clone)]
pub struct CurationService<L> {
    lists: Arc<L>,
}

impl<L> CurationService<L>
where
    L: ListRepository,
{
    /// Create a service over the given repository.
    pub fn new(lists: Arc<L>) -> Self {
        Self { lists }
    }

    fn map_list_error(error: ListPersistenceError) -> Error {
        match error {
            ListPersistenceError::Connection { message } => Error::service_unavailable(message),
            ListPersistenceError::Query { message } => Error::internal(message),
            ListPersistenceError::DuplicateName { name } => {
                Error::invalid_request(format!("a list named '{name}' already exists"))
            }
        }
    }

    fn map_validation_error(error: VocabularyValidationError) -> Error {
        Error::invalid_request(error.to_string())
    }

    /// Create an empty list owned by the acting user.
    pub async fn create_list(&self, actor: &User, name: &str) -> Result<VocabularyList, Error> {
        require_active(actor)?;
        let name = ListName::new(name).map_err(Self::map_validation_error)?;
        self.reject_duplicate_name(&actor.id, name.as_ref(), None)
            .await?;

        let list = VocabularyList::new(actor.id, name);
        self.lists
            .create_list(&list)
            .await
            .map_err(Self::map_list_error)?;
        Ok(list)
    }

    /// Save a batch of enrichment drafts under an existing or new list.
    ///
    /// The batch is atomic either way: for a new list, the list row and all
    /// entries are one transaction; for an existing list, the append is.
    pub async fn save_entries(
        &self,
        actor: &User,
        target: SaveTarget,
        drafts: Vec<EntryDraft>,
    ) -> Result<SaveOutcome, Error> {
        require_active(actor)?;
        if drafts.is_empty() {
            return Err(Error::invalid_request("no vocabulary to save"));
        }

        match target {
            SaveTarget::ExistingList(list_id) => {
                let list = self.load_list(&list_id).await?;
                require_owner_or_admin(actor, &list.owner_id)?;
                let entries = Self::materialise(drafts, &list)?;
                self.lists
                    .append_entries(&entries)
                    .await
                    .map_err(Self::map_list_error)?;
                Ok(SaveOutcome {
                    appended: entries.len(),
                    list,
                    created_list: false,
                })
            }
            SaveTarget::NewList(raw_name) => {
                let name = ListName::new(raw_name).map_err(Self::map_validation_error)?;
                self.reject_duplicate_name(&actor.id, name.as_ref(), None)
                    .await?;
                let list = VocabularyList::new(actor.id, name);
                let entries = Self::materialise(drafts, &list)?;
                self.lists
                    .create_list_with_entries(&list, &entries)
                    .await
                    .map_err(Self::map_list_error)?;
                Ok(SaveOutcome {
                    appended: entries.len(),
                    list,
                    created_list: true,
                })
            }
        }
    }

    /// Rename a list, keeping names unique within its owner's namespace.
    pub async fn rename_list(
        &self,
        actor: &User,
        list_id: &ListId,
        new_name: &str,
    ) -> Result<VocabularyList, Error> {
        let mut list = self.load_list(list_id).await?;
        require_owner_or_admin(actor, &list.owner_id)?;
        let name = ListName::new(new_name).map_err(Self::map_validation_error)?;
        self.reject_duplicate_name(&list.owner_id, name.as_ref(), Some(list_id))
            .await?;

        self.lists
            .rename_list(list_id, &name)
            .await
            .map_err(Self::map_list_error)?;
        list.name = name;
        Ok(list)
    }

    /// Delete a list and, with it, every entry it owns.
    pub async fn delete_list(&self, actor: &User, list_id: &ListId) -> Result<(), Error> {
        let list = self.load_list(list_id).await?;
        require_owner_or_admin(actor, &list.owner_id)?;
        self.lists
            .delete_list(list_id)
            .await
            .map_err(Self::map_list_error)
    }

    /// Edit an entry's type, definitions, or example. The original word is
    /// immutable; ownership is checked against the parent list's owner.
    pub async fn edit_entry(
        &self,
        actor: &User,
        entry_id: &EntryId,
        edit: EntryEdit,
    ) -> Result<VocabularyEntry, Error> {
        let mut entry = self.load_entry(entry_id).await?;
        let list = self.load_list(&entry.list_id).await?;
        require_owner_or_admin(actor, &list.owner_id)?;

        entry.apply_edit(edit);
        self.lists
            .update_entry(&entry)
            .await
            .map_err(Self::map_list_error)?;
        Ok(entry)
    }

    /// Delete a single entry without touching siblings or the parent list.
    pub async fn delete_entry(&self, actor: &User, entry_id: &EntryId) -> Result<(), Error> {
        let entry = self.load_entry(entry_id).await?;
        let list = self.load_list(&entry.list_id).await?;
        require_owner_or_admin(actor, &list.owner_id)?;
        self.lists
            .delete_entry(entry_id)
            .await
            .map_err(Self::map_list_error)
    }

    /// Lists owned by `owner`, visible to the owner and admins.
    pub async fn lists_for(
        &self,
        actor: &User,
        owner: &UserId,
    ) -> Result<Vec<VocabularyList>, Error> {
        require_owner_or_admin(actor, owner)?;
        self.lists
            .lists_for_owner(owner)
            .await
            .map_err(Self::map_list_error)
    }

    /// Entries of one list, visible to the owner and admins.
    pub async fn entries_for(
        &self,
        actor: &User,
        list_id: &ListId,
    ) -> Result<Vec<VocabularyEntry>, Error> {
        let list = self.load_list(list_id).await?;
        require_owner_or_admin(actor, &list.owner_id)?;
        self.lists
            .entries_for_list(list_id)
            .await
            .map_err(Self::map_list_error)
    }

    /// List/entry counts for `owner`, visible to the owner and admins.
    pub async fn stats_for(&self, actor: &User, owner: &UserId) -> Result<CurationStats, Error> {
        require_owner_or_admin(actor, owner)?;
        let lists = self
            .lists
            .count_lists_for_owner(owner)
            .await
            .map_err(Self::map_list_error)?;
        let entries = self
            .lists
            .count_entries_for_owner(owner)
            .await
            .map_err(Self::map_list_error)?;
        Ok(CurationStats { lists, entries })
    }

    fn materialise(
        drafts: Vec<EntryDraft>,
        list: &VocabularyList,
    ) -> Result<Vec<VocabularyEntry>, Error> {
        drafts
            .into_iter()
            .map(|draft| VocabularyEntry::from_draft(draft, list))
            .collect::<Result<Vec<_>, _>>()
            .map_err(Self::map_validation_error)
    }

    async fn reject_duplicate_name(
        &self,
        owner: &UserId,
        name: &str,
        exclude: Option<&ListId>,
    ) -> Result<(), Error> {
        let existing = self
            .lists
            .find_list_by_name(owner, name)
            .await
            .map_err(Self::map_list_error)?;
        if let Some(existing) = existing {
            if exclude != Some(&existing.id) {
                return Err(Error::invalid_request(format!(
                    "a list named '{name}' already exists"
                )));
            }
        }
        Ok(())
    }

    async fn load_list(&self, list_id: &ListId) -> Result<VocabularyList, Error> {
        self.lists
            .find_list(list_id)
            .await
            .map_err(Self::map_list_error)?
            .ok_or_else(|| Error::not_found("list not found"))
    }

    async fn load_entry(&self, entry_id: &EntryId) -> Result<VocabularyEntry, Error> {
        self.lists
            .find_entry(entry_id)
            .await
            .map_err(Self::map_list_error)?
            .ok_or_else(|| Error::not_found("entry not found"))
    }
}
