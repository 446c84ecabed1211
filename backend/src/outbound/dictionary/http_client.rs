//! Reqwest-backed dictionary lookup adapter.
//!
//! This adapter owns transport details only: request construction, timeout
//! and HTTP error normalisation, JSON decoding, and the per-invocation audit
//! record. Every failure collapses to `None` for the caller; nothing here
//! can abort an enrichment run.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use tracing::{debug, warn};

use super::dto::{select_definition, DictionaryEntryDto};
use crate::domain::audit::{ApiCallRecord, ApiName};
use crate::domain::ports::{AuditLog, DefinitionLookup, WordDefinition};
use crate::domain::user::UserId;

/// Default request timeout for dictionary lookups.
pub const DEFAULT_DICTIONARY_TIMEOUT: Duration = Duration::from_secs(15);

/// Well-known public endpoint this adapter was written against. The word is
/// appended to the path, so the trailing slash matters.
pub const DEFAULT_DICTIONARY_ENDPOINT: &str = "https://api.dictionaryapi.dev/api/v2/entries/en/";

/// Dictionary adapter performing HTTP GET requests against one endpoint.
pub struct DictionaryHttpClient {
    client: Client,
    endpoint: Url,
    audit: Arc<dyn AuditLog>,
}

impl DictionaryHttpClient {
    /// Build an adapter with the default timeout.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(endpoint: Url, audit: Arc<dyn AuditLog>) -> Result<Self, reqwest::Error> {
        Self::with_timeout(endpoint, DEFAULT_DICTIONARY_TIMEOUT, audit)
    }

    /// Build an adapter with an explicit request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn with_timeout(
        endpoint: Url,
        timeout: Duration,
        audit: Arc<dyn AuditLog>,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint,
            audit,
        })
    }

    /// Append one audit record, degrading to a warning if the log itself is
    /// unavailable; an audit failure must never fail the lookup.
    async fn record(&self, record: ApiCallRecord) {
        if let Err(error) = self.audit.record(&record).await {
            warn!(%error, api = %record.api, "failed to write audit record");
        }
    }

    async fn record_failure(
        &self,
        summary: &str,
        status: Option<u16>,
        message: String,
        actor: Option<&UserId>,
    ) {
        debug!(summary, ?status, %message, "dictionary lookup failed");
        self.record(ApiCallRecord::failure(
            ApiName::Dictionary,
            summary,
            status,
            message,
            actor.copied(),
        ))
        .await;
    }
}

#[async_trait]
impl DefinitionLookup for DictionaryHttpClient {
    async fn lookup(&self, word: &str, actor: Option<&UserId>) -> Option<WordDefinition> {
        let summary = format!("word: {word}");

        let url = match self.endpoint.join(word) {
            Ok(url) => url,
            Err(error) => {
                self.record_failure(&summary, None, format!("unusable word: {error}"), actor)
                    .await;
                return None;
            }
        };

        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(error) => {
                let message = if error.is_timeout() {
                    format!("timeout: {error}")
                } else {
                    format!("transport error: {error}")
                };
                self.record_failure(&summary, None, message, actor).await;
                return None;
            }
        };

        let status = response.status();
        if !status.is_success() {
            self.record_failure(
                &summary,
                Some(status.as_u16()),
                format!("status {status}"),
                actor,
            )
            .await;
            return None;
        }

        let entries: Vec<DictionaryEntryDto> = match response.json().await {
            Ok(entries) => entries,
            Err(error) => {
                self.record_failure(
                    &summary,
                    Some(status.as_u16()),
                    format!("undecodable payload: {error}"),
                    actor,
                )
                .await;
                return None;
            }
        };

        match select_definition(&entries) {
            Some(found) => {
                self.record(ApiCallRecord::success(
                    ApiName::Dictionary,
                    &summary,
                    Some(status.as_u16()),
                    actor.copied(),
                ))
                .await;
                Some(found)
            }
            None => {
                self.record_failure(
                    &summary,
                    Some(status.as_u16()),
                    "no usable definition or phonetic text".to_owned(),
                    actor,
                )
                .await;
                None
            }
        }
    }
}
