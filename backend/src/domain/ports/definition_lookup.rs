//! Port for the external dictionary lookup service.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::user::UserId;

/// One selected definition for a word, as extracted from the dictionary
/// service. All fields are optional: an IPA-only response is a legitimate
/// partial success with `definition: None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordDefinition {
    pub part_of_speech: Option<String>,
    pub definition: Option<String>,
    pub example: Option<String>,
    pub ipa: Option<String>,
}

/// Port wrapping the dictionary service call.
///
/// The contract is deliberately infallible: transport failures, error
/// statuses, and unusable payloads all collapse to `None`. The adapter is
/// responsible for writing exactly one audit record per invocation.
#[async_trait]
pub trait DefinitionLookup: Send + Sync {
    /// Look up one word; `None` means "no data", never an error.
    async fn lookup(&self, word: &str, actor: Option<&UserId>) -> Option<WordDefinition>;
}
