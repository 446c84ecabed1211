//! Port for the external translation service.

use async_trait::async_trait;

use crate::domain::user::UserId;

/// Port wrapping the translation service call.
///
/// Translation never fails from the caller's point of view: any failure
/// degrades to returning the input unchanged. The caller therefore cannot
/// distinguish "translation equals the source text" from "translation
/// silently failed"; the enrichment pipeline documents how it resolves that
/// ambiguity. The adapter writes one audit record per non-blank invocation.
#[async_trait]
pub trait Translator: Send + Sync {
    /// Translate one text. Blank input is returned unchanged without a
    /// network call; failures return the input unchanged.
    async fn translate(
        &self,
        text: &str,
        source: &str,
        target: &str,
        actor: Option<&UserId>,
    ) -> String;

    /// Translate a batch, returning a list parallel to the input. If the
    /// remote result does not align one-to-one with the input, the whole
    /// batch falls back to the inputs unchanged (fail-closed).
    async fn translate_batch(
        &self,
        texts: &[String],
        source: &str,
        target: &str,
        actor: Option<&UserId>,
    ) -> Vec<String>;
}
