//! Reqwest-backed translation adapter (LibreTranslate wire shape).
//!
//! Translation is strictly best-effort: blank input short-circuits without a
//! network call, and every failure degrades to returning the input
//! unchanged. The batch variant is fail-closed: a misaligned response
//! falls back to the whole input batch rather than a partial one.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::domain::audit::{ApiCallRecord, ApiName};
use crate::domain::ports::{AuditLog, Translator};
use crate::domain::user::UserId;

/// Default request timeout for single translations.
pub const DEFAULT_SINGLE_TIMEOUT: Duration = Duration::from_secs(20);
/// Default request timeout for batch translations.
pub const DEFAULT_BATCH_TIMEOUT: Duration = Duration::from_secs(45);

#[derive(Debug, Serialize)]
struct TranslateRequest<'a, Q: Serialize> {
    q: Q,
    source: &'a str,
    target: &'a str,
    format: &'a str,
}

#[derive(Debug, Deserialize)]
struct SingleResponseDto {
    #[serde(rename = "translatedText")]
    translated_text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct BatchResponseDto {
    #[serde(rename = "translatedTexts")]
    translated_texts: Option<Vec<String>>,
}

/// Accept a batch response only when it aligns one-to-one with the input.
fn aligned_batch(inputs: &[String], translated: Option<Vec<String>>) -> Result<Vec<String>, String> {
    match translated {
        Some(texts) if texts.len() == inputs.len() => Ok(texts),
        Some(texts) => Err(format!(
            "translated list length {} does not match input length {}",
            texts.len(),
            inputs.len(),
        )),
        None => Err("response carried no translated list".to_owned()),
    }
}

/// Translation adapter performing HTTP POST requests against one endpoint.
pub struct TranslationHttpClient {
    client: Client,
    endpoint: Url,
    single_timeout: Duration,
    batch_timeout: Duration,
    audit: Arc<dyn AuditLog>,
}

impl TranslationHttpClient {
    /// Build an adapter with default timeouts.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(endpoint: Url, audit: Arc<dyn AuditLog>) -> Result<Self, reqwest::Error> {
        Self::with_timeouts(endpoint, DEFAULT_SINGLE_TIMEOUT, DEFAULT_BATCH_TIMEOUT, audit)
    }

    /// Build an adapter with explicit per-variant timeouts.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn with_timeouts(
        endpoint: Url,
        single_timeout: Duration,
        batch_timeout: Duration,
        audit: Arc<dyn AuditLog>,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder().build()?;
        Ok(Self {
            client,
            endpoint,
            single_timeout,
            batch_timeout,
            audit,
        })
    }

    /// Append one audit record, degrading to a warning if the log itself is
    /// unavailable.
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
        debug!(summary, ?status, %message, "translation failed");
        self.record(ApiCallRecord::failure(
            ApiName::Translation,
            summary,
            status,
            message,
            actor.copied(),
        ))
        .await;
    }

    /// Issue one POST and decode the response, reporting every failure mode
    /// as a message so callers can degrade uniformly.
    async fn post<Q: Serialize + Send, R: serde::de::DeserializeOwned>(
        &self,
        payload: &TranslateRequest<'_, Q>,
        timeout: Duration,
    ) -> Result<(u16, R), (Option<u16>, String)> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .timeout(timeout)
            .json(payload)
            .send()
            .await
            .map_err(|error| {
                let message = if error.is_timeout() {
                    format!("timeout: {error}")
                } else {
                    format!("transport error: {error}")
                };
                (None, message)
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err((Some(status.as_u16()), format!("status {status}")));
        }

        let decoded: R = response
            .json()
            .await
            .map_err(|error| (Some(status.as_u16()), format!("undecodable payload: {error}")))?;
        Ok((status.as_u16(), decoded))
    }
}

#[async_trait]
impl Translator for TranslationHttpClient {
    async fn translate(
        &self,
        text: &str,
        source: &str,
        target: &str,
        actor: Option<&UserId>,
    ) -> String {
        // Blank input: no call, no audit record.
        if text.trim().is_empty() {
            return text.to_owned();
        }

        let summary = format!("text: {text}");
        let payload = TranslateRequest {
            q: text,
            source,
            target,
            format: "text",
        };

        match self
            .post::<_, SingleResponseDto>(&payload, self.single_timeout)
            .await
        {
            Ok((status, decoded)) => match decoded
                .translated_text
                .filter(|translated| !translated.trim().is_empty())
            {
                Some(translated) => {
                    self.record(ApiCallRecord::success(
                        ApiName::Translation,
                        &summary,
                        Some(status),
                        actor.copied(),
                    ))
                    .await;
                    translated
                }
                None => {
                    self.record_failure(
                        &summary,
                        Some(status),
                        "response carried no translated text".to_owned(),
                        actor,
                    )
                    .await;
                    text.to_owned()
                }
            },
            Err((status, message)) => {
                self.record_failure(&summary, status, message, actor).await;
                text.to_owned()
            }
        }
    }

    async fn translate_batch(
        &self,
        texts: &[String],
        source: &str,
        target: &str,
        actor: Option<&UserId>,
    ) -> Vec<String> {
        if texts.is_empty() {
            return Vec::new();
        }

        let summary = format!("batch of {} texts", texts.len());
        let payload = TranslateRequest {
            q: texts,
            source,
            target,
            format: "text",
        };

        match self
            .post::<_, BatchResponseDto>(&payload, self.batch_timeout)
            .await
        {
            Ok((status, decoded)) => match aligned_batch(texts, decoded.translated_texts) {
                Ok(translated) => {
                    self.record(ApiCallRecord::success(
                        ApiName::Translation,
                        &summary,
                        Some(status),
                        actor.copied(),
                    ))
                    .await;
                    translated
                }
                Err(message) => {
                    self.record_failure(&summary, Some(status), message, actor).await;
                    texts.to_vec()
                }
            },
            Err((status, message)) => {
                self.record_failure(&summary, status, message, actor).await;
                texts.to_vec()
            }
        }
    }
}
