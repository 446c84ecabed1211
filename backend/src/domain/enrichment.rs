//! Word enrichment pipeline.
//!
//! Takes raw comma-separated input, runs each word through the dictionary
//! and translation adapters, and produces one record per occurrence.
//! Processing is sequential in input order; adapter failures only degrade
//! the affected record and never abort the run.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::domain::ports::{DefinitionLookup, Translator, WordDefinition};
use crate::domain::user::UserId;
use crate::domain::vocabulary::EntryDraft;

/// Sentinel shown for unavailable type/example/IPA fields.
pub const NOT_AVAILABLE: &str = "N/A";
/// Placeholder the dictionary adapter uses for IPA-only responses.
pub const NO_DEFINITION_FOUND: &str = "No definition found.";
/// Placeholder when a definition could not be translated.
pub const UNTRANSLATED_DEFINITION: &str = "Could not translate this definition.";
/// Placeholder when a word could not be translated.
pub const UNTRANSLATED_WORD: &str = "Could not translate this word.";

/// Source language for dictionary words.
const SOURCE_LANG: &str = "en";
/// Target language for translated definitions.
const TARGET_LANG: &str = "vi";

/// One fully enriched record for a single word occurrence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichedRecord {
    pub word_type: String,
    pub definition_en: String,
    pub definition_vi: String,
    pub example_en: String,
    pub ipa: String,
}

impl EnrichedRecord {
    /// Convert to a draft ready for persistence, mapping sentinels back to
    /// absent fields so placeholders are not stored as data.
    pub fn to_draft(&self, word: &str) -> EntryDraft {
        let present = |value: &str| {
            (value != NOT_AVAILABLE && !value.trim().is_empty()).then(|| value.to_owned())
        };
        EntryDraft {
            original_word: word.to_owned(),
            word_type: present(&self.word_type),
            ipa: present(&self.ipa),
            definition_en: present(&self.definition_en),
            definition_vi: present(&self.definition_vi),
            example_en: present(&self.example_en),
        }
    }
}

/// All records gathered for one distinct input word, in occurrence order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichedWord {
    pub word: String,
    pub records: Vec<EnrichedRecord>,
}

/// Enrichment result: an ordered association list keyed by word.
///
/// Duplicate input words are processed independently and preserved: a
/// repeated word appends another record under its first occurrence's key,
/// so no occurrence is ever silently dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichmentOutcome {
    pub items: Vec<EnrichedWord>,
}

impl EnrichmentOutcome {
    /// Total number of records across all words.
    pub fn record_count(&self) -> usize {
        self.items.iter().map(|item| item.records.len()).sum()
    }

    /// Records gathered for one word, if it was part of the input.
    pub fn records_for(&self, word: &str) -> Option<&[EnrichedRecord]> {
        self.items
            .iter()
            .find(|item| item.word == word)
            .map(|item| item.records.as_slice())
    }

    fn push(&mut self, word: &str, record: EnrichedRecord) {
        if let Some(item) = self.items.iter_mut().find(|item| item.word == word) {
            item.records.push(record);
        } else {
            self.items.push(EnrichedWord {
                word: word.to_owned(),
                records: vec![record],
            });
        }
    }
}

/// Pipeline orchestrating the two lookup adapters per word.
#[derive(Clone)]
pub struct EnrichmentService<D, T> {
    definitions: Arc<D>,
    translator: Arc<T>,
}

impl<D, T> EnrichmentService<D, T>
where
    D: DefinitionLookup,
    T: Translator,
{
    /// Create a pipeline over the given adapters.
    pub fn new(definitions: Arc<D>, translator: Arc<T>) -> Self {
        Self {
            definitions,
            translator,
        }
    }

    /// Enrich a raw comma-separated word list.
    ///
    /// Tokens are trimmed and empty ones discarded; surviving tokens are
    /// processed sequentially in input order, one adapter round per
    /// occurrence.
    pub async fn enrich(&self, raw_input: &str, actor: Option<&UserId>) -> EnrichmentOutcome {
        let mut outcome = EnrichmentOutcome::default();
        for word in raw_input
            .split(',')
            .map(str::trim)
            .filter(|token| !token.is_empty())
        {
            let record = match self.definitions.lookup(word, actor).await {
                Some(found) => self.enrich_from_definition(word, found, actor).await,
                None => self.enrich_without_definition(word, actor).await,
            };
            outcome.push(word, record);
        }
        outcome
    }

    /// Build the record for a word the dictionary knew about.
    async fn enrich_from_definition(
        &self,
        word: &str,
        found: WordDefinition,
        actor: Option<&UserId>,
    ) -> EnrichedRecord {
        let definition_vi = match found.definition.as_deref() {
            // The API sometimes regurgitates the word itself as its own
            // "definition"; translating that text would be a no-op, so the
            // word is translated instead.
            Some(definition) if !definition.eq_ignore_ascii_case(word) => {
                self.translate_or_placeholder(definition, UNTRANSLATED_DEFINITION, actor)
                    .await
            }
            _ => {
                self.translate_or_placeholder(word, UNTRANSLATED_WORD, actor)
                    .await
            }
        };

        EnrichedRecord {
            word_type: found
                .part_of_speech
                .unwrap_or_else(|| NOT_AVAILABLE.to_owned()),
            definition_en: found
                .definition
                .unwrap_or_else(|| NO_DEFINITION_FOUND.to_owned()),
            definition_vi,
            example_en: found.example.unwrap_or_else(|| NOT_AVAILABLE.to_owned()),
            ipa: found.ipa.unwrap_or_else(|| NOT_AVAILABLE.to_owned()),
        }
    }

    /// Build the record for a dictionary miss: the word itself stands in for
    /// the English definition and is translated directly.
    async fn enrich_without_definition(
        &self,
        word: &str,
        actor: Option<&UserId>,
    ) -> EnrichedRecord {
        let definition_vi = self
            .translate_or_placeholder(word, UNTRANSLATED_WORD, actor)
            .await;
        EnrichedRecord {
            word_type: NOT_AVAILABLE.to_owned(),
            definition_en: word.to_owned(),
            definition_vi,
            example_en: NOT_AVAILABLE.to_owned(),
            ipa: NOT_AVAILABLE.to_owned(),
        }
    }

    /// Translate `text`, substituting `placeholder` when the result equals
    /// the source. An unchanged result is indistinguishable from a silent
    /// adapter failure at this layer, so legitimate identity translations
    /// also surface as the placeholder.
    async fn translate_or_placeholder(
        &self,
        text: &str,
        placeholder: &str,
        actor: Option<&UserId>,
    ) -> String {
        let translated = self
            .translator
            .translate(text, SOURCE_LANG, TARGET_LANG, actor)
            .await;
        if translated.trim().eq_ignore_ascii_case(text.trim()) || translated.trim().is_empty() {
            placeholder.to_owned()
        } else {
            translated
        }
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for the enrichment pipeline over stub adapters.
    use std::collections::HashMap;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use rstest::rstest;

    use super::*;
    use crate::domain::ports::{DefinitionLookup, Translator, WordDefinition};

    /// Stub dictionary returning canned definitions per word.
    #[derive(Default)]
    struct StubDictionary {
        definitions: HashMap<String, WordDefinition>,
        calls: Mutex<Vec<String>>,
    }

    impl StubDictionary {
        fn with(mut self, word: &str, definition: WordDefinition) -> Self {
            self.definitions.insert(word.to_owned(), definition);
            self
        }
    }

    #[async_trait]
    impl DefinitionLookup for StubDictionary {
        async fn lookup(&self, word: &str, _actor: Option<&UserId>) -> Option<WordDefinition> {
            self.calls.lock().expect("calls lock").push(word.to_owned());
            self.definitions.get(word).cloned()
        }
    }

    /// Stub translator with a canned phrasebook; unknown text echoes back,
    /// mimicking the adapter's failure mode.
    #[derive(Default)]
    struct StubTranslator {
        phrasebook: HashMap<String, String>,
        calls: Mutex<Vec<String>>,
    }

    impl StubTranslator {
        fn with(mut self, source: &str, target: &str) -> Self {
            self.phrasebook.insert(source.to_owned(), target.to_owned());
            self
        }
    }

    #[async_trait]
    impl Translator for StubTranslator {
        async fn translate(
            &self,
            text: &str,
            _source: &str,
            _target: &str,
            _actor: Option<&UserId>,
        ) -> String {
            self.calls.lock().expect("calls lock").push(text.to_owned());
            self.phrasebook
                .get(text)
                .cloned()
                .unwrap_or_else(|| text.to_owned())
        }

        async fn translate_batch(
            &self,
            texts: &[String],
            source: &str,
            target: &str,
            actor: Option<&UserId>,
        ) -> Vec<String> {
            let mut out = Vec::with_capacity(texts.len());
            for text in texts {
                out.push(self.translate(text, source, target, actor).await);
            }
            out
        }
    }

    fn service(
        dictionary: StubDictionary,
        translator: StubTranslator,
    ) -> EnrichmentService<StubDictionary, StubTranslator> {
        EnrichmentService::new(Arc::new(dictionary), Arc::new(translator))
    }

    fn cat_definition() -> WordDefinition {
        WordDefinition {
            part_of_speech: Some("noun".to_owned()),
            definition: Some("a small domesticated felid".to_owned()),
            example: Some("The cat sat on the mat.".to_owned()),
            ipa: Some("/kæt/".to_owned()),
        }
    }

    #[tokio::test]
    async fn known_word_translates_its_definition() {
        let dictionary = StubDictionary::default().with("cat", cat_definition());
        let translator =
            StubTranslator::default().with("a small domesticated felid", "một con mèo nhỏ");
        let outcome = service(dictionary, translator).enrich("cat", None).await;

        let records = outcome.records_for("cat").expect("cat present");
        assert_eq!(records.len(), 1);
        let record = records.first().expect("one record");
        assert_eq!(record.word_type, "noun");
        assert_eq!(record.definition_en, "a small domesticated felid");
        assert_eq!(record.definition_vi, "một con mèo nhỏ");
        assert_eq!(record.example_en, "The cat sat on the mat.");
        assert_eq!(record.ipa, "/kæt/");
    }

    #[tokio::test]
    async fn unknown_word_is_translated_directly() {
        let dictionary = StubDictionary::default();
        let translator = StubTranslator::default();
        let outcome = service(dictionary, translator)
            .enrich("xyzzynonword", None)
            .await;

        let records = outcome.records_for("xyzzynonword").expect("word present");
        let record = records.first().expect("one record");
        assert_eq!(record.word_type, NOT_AVAILABLE);
        assert_eq!(record.definition_en, "xyzzynonword");
        assert_eq!(record.example_en, NOT_AVAILABLE);
        assert_eq!(record.ipa, NOT_AVAILABLE);
        // The stub echoed the input, indistinguishable from failure.
        assert_eq!(record.definition_vi, UNTRANSLATED_WORD);
    }

    #[tokio::test]
    async fn degenerate_definition_falls_back_to_translating_the_word() {
        let definition = WordDefinition {
            part_of_speech: Some("noun".to_owned()),
            definition: Some("Cat".to_owned()),
            example: None,
            ipa: None,
        };
        let dictionary = StubDictionary::default().with("cat", definition);
        let translator = StubTranslator::default().with("cat", "con mèo");
        let outcome = service(dictionary, translator).enrich("cat", None).await;

        let record = outcome
            .records_for("cat")
            .and_then(<[EnrichedRecord]>::first)
            .expect("one record");
        assert_eq!(record.definition_en, "Cat");
        assert_eq!(record.definition_vi, "con mèo");
    }

    #[tokio::test]
    async fn duplicates_are_processed_independently_and_preserved() {
        let dictionary = StubDictionary::default().with("cat", cat_definition());
        let translator = StubTranslator::default();
        let pipeline = service(dictionary, translator);
        let outcome = pipeline.enrich("cat, dog, cat", None).await;

        assert_eq!(outcome.record_count(), 3, "three occurrences processed");
        assert_eq!(outcome.items.len(), 2, "two distinct keys");
        let words: Vec<&str> = outcome.items.iter().map(|i| i.word.as_str()).collect();
        assert_eq!(words, vec!["cat", "dog"], "first-occurrence order");
        assert_eq!(
            outcome.records_for("cat").map(<[EnrichedRecord]>::len),
            Some(2),
        );
        assert_eq!(
            pipeline.definitions.calls.lock().expect("calls lock").len(),
            3,
            "each occurrence triggers its own lookup",
        );
    }

    #[rstest]
    #[case("", 0)]
    #[case(" , ,, ", 0)]
    #[case("cat,,dog", 2)]
    #[case("  cat  ", 1)]
    #[tokio::test]
    async fn tokenisation_discards_empty_tokens(#[case] input: &str, #[case] expected: usize) {
        let outcome = service(StubDictionary::default(), StubTranslator::default())
            .enrich(input, None)
            .await;
        assert_eq!(outcome.record_count(), expected);
    }

    #[tokio::test]
    async fn ipa_only_response_keeps_placeholder_and_translates_the_word() {
        let definition = WordDefinition {
            part_of_speech: None,
            definition: None,
            example: None,
            ipa: Some("/ˈzɪzi/".to_owned()),
        };
        let dictionary = StubDictionary::default().with("xyzzy", definition);
        let translator = StubTranslator::default().with("xyzzy", "từ bí ẩn");
        let pipeline = service(dictionary, translator);
        let outcome = pipeline.enrich("xyzzy", None).await;

        let record = outcome
            .records_for("xyzzy")
            .and_then(<[EnrichedRecord]>::first)
            .expect("one record");
        assert_eq!(record.definition_en, NO_DEFINITION_FOUND);
        assert_eq!(record.ipa, "/ˈzɪzi/");
        assert_eq!(record.definition_vi, "từ bí ẩn");
        let translated = pipeline.translator.calls.lock().expect("calls lock");
        assert_eq!(
            translated.as_slice(),
            ["xyzzy"],
            "the word is translated, not the placeholder",
        );
    }

    #[test]
    fn drafts_map_sentinels_back_to_absent_fields() {
        let record = EnrichedRecord {
            word_type: NOT_AVAILABLE.to_owned(),
            definition_en: "xyzzynonword".to_owned(),
            definition_vi: "nghĩa".to_owned(),
            example_en: NOT_AVAILABLE.to_owned(),
            ipa: NOT_AVAILABLE.to_owned(),
        };
        let draft = record.to_draft("xyzzynonword");
        assert_eq!(draft.original_word, "xyzzynonword");
        assert!(draft.word_type.is_none());
        assert!(draft.example_en.is_none());
        assert!(draft.ipa.is_none());
        assert_eq!(draft.definition_en.as_deref(), Some("xyzzynonword"));
        assert_eq!(draft.definition_vi.as_deref(), Some("nghĩa"));
    }
}
