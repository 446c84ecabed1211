//! Append-only audit records for external API calls.
//!
//! Every networked adapter invocation produces exactly one record, success
//! or failure, before the caller proceeds. Records are never mutated or
//! deleted by normal operation; deleting a user detaches their records
//! rather than removing them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::user::UserId;

/// Character limit for stored error messages.
pub const ERROR_MESSAGE_MAX: usize = 500;
/// Character limit for stored request summaries.
pub const REQUEST_SUMMARY_MAX: usize = 100;

/// Tag identifying which adapter issued the call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiName {
    Dictionary,
    Translation,
}

impl ApiName {
    /// Stable storage tag for the adapter.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Dictionary => "dictionary_api",
            Self::Translation => "libre_translate",
        }
    }
}

impl std::fmt::Display for ApiName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Audit record of one external call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiCallRecord {
    pub api: ApiName,
    pub timestamp: DateTime<Utc>,
    pub success: bool,
    pub status_code: Option<u16>,
    pub error_message: Option<String>,
    pub request_summary: Option<String>,
    pub user_id: Option<UserId>,
}

impl ApiCallRecord {
    /// Record a successful call.
    pub fn success(
        api: ApiName,
        request_summary: impl AsRef<str>,
        status_code: Option<u16>,
        user_id: Option<UserId>,
    ) -> Self {
        Self {
            api,
            timestamp: Utc::now(),
            success: true,
            status_code,
            error_message: None,
            request_summary: Some(truncate_chars(request_summary.as_ref(), REQUEST_SUMMARY_MAX)),
            user_id,
        }
    }

    /// Record a failed call, truncating the error message for storage.
    pub fn failure(
        api: ApiName,
        request_summary: impl AsRef<str>,
        status_code: Option<u16>,
        error_message: impl AsRef<str>,
        user_id: Option<UserId>,
    ) -> Self {
        Self {
            api,
            timestamp: Utc::now(),
            success: false,
            status_code,
            error_message: Some(truncate_chars(error_message.as_ref(), ERROR_MESSAGE_MAX)),
            request_summary: Some(truncate_chars(request_summary.as_ref(), REQUEST_SUMMARY_MAX)),
            user_id,
        }
    }
}

/// Per-adapter call totals for the audit overview.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiCallStat {
    pub api_name: String,
    pub total: u64,
    pub successful: u64,
    pub failed: u64,
}

/// Aggregate view over the audit log.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditStats {
    pub total_calls: u64,
    pub successful_calls: u64,
    pub failed_calls: u64,
    pub by_api: Vec<ApiCallStat>,
}

fn truncate_chars(raw: &str, limit: usize) -> String {
    if raw.chars().count() <= limit {
        return raw.to_owned();
    }
    let truncated: String = raw.chars().take(limit).collect();
    format!("{truncated}...")
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;

    #[test]
    fn failure_truncates_long_error_messages() {
        let long = "e".repeat(ERROR_MESSAGE_MAX * 2);
        let record = ApiCallRecord::failure(ApiName::Translation, "word", None, &long, None);
        let stored = record.error_message.expect("message present");
        assert!(stored.chars().count() <= ERROR_MESSAGE_MAX + 3);
        assert!(stored.ends_with("..."));
    }

    #[test]
    fn short_summaries_are_stored_verbatim() {
        let record = ApiCallRecord::success(ApiName::Dictionary, "word: cat", Some(200), None);
        assert_eq!(record.request_summary.as_deref(), Some("word: cat"));
        assert!(record.success);
        assert_eq!(record.status_code, Some(200));
        assert!(record.error_message.is_none());
    }

    #[test]
    fn api_names_have_stable_tags() {
        assert_eq!(ApiName::Dictionary.as_str(), "dictionary_api");
        assert_eq!(ApiName::Translation.as_str(), "libre_translate");
    }
}
