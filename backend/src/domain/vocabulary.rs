//! Vocabulary list and entry aggregates.
//!
//! Lists are owned by exactly one user and own their entries exclusively:
//! deleting a list destroys its entries. Each entry carries a denormalised
//! owner id that must always agree with the parent list's owner; the
//! curation service copies it from the list at creation time and no edit
//! path can change it afterwards.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::user::UserId;

/// Maximum accepted length for a list name, in characters.
pub const LIST_NAME_MAX: usize = 100;

/// Validation errors for vocabulary value types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VocabularyValidationError {
    EmptyListName,
    ListNameTooLong { max: usize },
    EmptyWord,
}

impl fmt::Display for VocabularyValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyListName => write!(f, "list name must not be empty"),
            Self::ListNameTooLong { max } => {
                write!(f, "list name must be at most {max} characters")
            }
            Self::EmptyWord => write!(f, "word must not be empty"),
        }
    }
}

impl std::error::Error for VocabularyValidationError {}

/// Stable vocabulary list identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ListId(Uuid);

impl ListId {
    /// Generate a new random identifier.
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an existing UUID, e.g. one read back from storage.
    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Access the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for ListId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Stable vocabulary entry identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryId(Uuid);

impl EntryId {
    /// Generate a new random identifier.
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an existing UUID, e.g. one read back from storage.
    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Access the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Trimmed, bounded list name. Uniqueness per owner is enforced by the
/// curation service (fast path) and the storage constraint (authoritative).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ListName(String);

impl ListName {
    /// Validate and construct a list name.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, VocabularyValidationError> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            return Err(VocabularyValidationError::EmptyListName);
        }
        if trimmed.chars().count() > LIST_NAME_MAX {
            return Err(VocabularyValidationError::ListNameTooLong { max: LIST_NAME_MAX });
        }
        Ok(Self(trimmed.to_owned()))
    }
}

impl AsRef<str> for ListName {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for ListName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<ListName> for String {
    fn from(value: ListName) -> Self {
        value.0
    }
}

impl TryFrom<String> for ListName {
    type Error = VocabularyValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// A named collection of vocabulary entries owned by one user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VocabularyList {
    pub id: ListId,
    pub name: ListName,
    pub owner_id: UserId,
    pub created_at: DateTime<Utc>,
}

impl VocabularyList {
    /// Create a list for `owner` with a fresh id.
    pub fn new(owner_id: UserId, name: ListName) -> Self {
        Self {
            id: ListId::random(),
            name,
            owner_id,
            created_at: Utc::now(),
        }
    }
}

/// Enrichment output selected by the user for saving, before it gains an
/// identity or a list association.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryDraft {
    pub original_word: String,
    pub word_type: Option<String>,
    pub ipa: Option<String>,
    pub definition_en: Option<String>,
    pub definition_vi: Option<String>,
    pub example_en: Option<String>,
}

/// One enriched word record persisted under a list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VocabularyEntry {
    pub id: EntryId,
    pub original_word: String,
    pub word_type: Option<String>,
    pub ipa: Option<String>,
    pub definition_en: Option<String>,
    pub definition_vi: Option<String>,
    pub example_en: Option<String>,
    pub added_at: DateTime<Utc>,
    pub list_id: ListId,
    pub owner_id: UserId,
}

impl VocabularyEntry {
    /// Materialise a draft under `list`, copying the owner from the list so
    /// the denormalised owner can never disagree with the parent.
    pub fn from_draft(
        draft: EntryDraft,
        list: &VocabularyList,
    ) -> Result<Self, VocabularyValidationError> {
        let original_word = draft.original_word.trim().to_owned();
        if original_word.is_empty() {
            return Err(VocabularyValidationError::EmptyWord);
        }
        Ok(Self {
            id: EntryId::random(),
            original_word,
            word_type: draft.word_type,
            ipa: draft.ipa,
            definition_en: draft.definition_en,
            definition_vi: draft.definition_vi,
            example_en: draft.example_en,
            added_at: Utc::now(),
            list_id: list.id,
            owner_id: list.owner_id,
        })
    }

    /// Apply an edit. The original word has no edit path.
    pub fn apply_edit(&mut self, edit: EntryEdit) {
        if let Some(word_type) = edit.word_type {
            self.word_type = Some(word_type);
        }
        if let Some(definition_en) = edit.definition_en {
            self.definition_en = Some(definition_en);
        }
        if let Some(definition_vi) = edit.definition_vi {
            self.definition_vi = Some(definition_vi);
        }
        if let Some(example_en) = edit.example_en {
            self.example_en = Some(example_en);
        }
    }
}

/// Partial update for an entry; `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryEdit {
    pub word_type: Option<String>,
    pub definition_en: Option<String>,
    pub definition_vi: Option<String>,
    pub example_en: Option<String>,
}
