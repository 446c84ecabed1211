//! DTOs for decoding dictionary API responses.
//!
//! The adapter decodes into these transport DTOs first, then selects one
//! definition per word in a single pass over the decoded entries.

use serde::Deserialize;

use crate::domain::ports::WordDefinition;

#[derive(Debug, Deserialize)]
pub(super) struct DictionaryEntryDto {
    #[serde(default)]
    pub(super) phonetics: Vec<PhoneticDto>,
    #[serde(default)]
    pub(super) meanings: Vec<MeaningDto>,
}

#[derive(Debug, Deserialize)]
pub(super) struct PhoneticDto {
    pub(super) text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct MeaningDto {
    #[serde(rename = "partOfSpeech")]
    pub(super) part_of_speech: Option<String>,
    #[serde(default)]
    pub(super) definitions: Vec<DefinitionDto>,
}

#[derive(Debug, Deserialize)]
pub(super) struct DefinitionDto {
    pub(super) definition: Option<String>,
    pub(super) example: Option<String>,
}

fn non_blank(value: Option<&String>) -> Option<String> {
    value
        .map(|text| text.trim())
        .filter(|text| !text.is_empty())
        .map(str::to_owned)
}

/// Select one definition from the decoded response.
///
/// Scans every (part-of-speech, definition, example) triple in response
/// order: the first triple carrying a non-empty example wins outright,
/// otherwise the first non-empty definition does. The phonetic transcription
/// is picked independently of the chosen definition. A response with an IPA
/// but no usable definition still yields a record (partial success); a
/// response with neither yields `None`.
pub(super) fn select_definition(entries: &[DictionaryEntryDto]) -> Option<WordDefinition> {
    let ipa = entries
        .iter()
        .flat_map(|entry| entry.phonetics.iter())
        .find_map(|phonetic| non_blank(phonetic.text.as_ref()));

    let mut first_without_example: Option<WordDefinition> = None;
    for entry in entries {
        for meaning in &entry.meanings {
            for definition in &meaning.definitions {
                let Some(text) = non_blank(definition.definition.as_ref()) else {
                    continue;
                };
                let candidate = WordDefinition {
                    part_of_speech: non_blank(meaning.part_of_speech.as_ref()),
                    definition: Some(text),
                    example: non_blank(definition.example.as_ref()),
                    ipa: ipa.clone(),
                };
                if candidate.example.is_some() {
                    return Some(candidate);
                }
                if first_without_example.is_none() {
                    first_without_example = Some(candidate);
                }
            }
        }
    }

    if let Some(found) = first_without_example {
        return Some(found);
    }
    // No definition anywhere, but an IPA still counts as partial data.
    ipa.map(|ipa| WordDefinition {
        part_of_speech: None,
        definition: None,
        example: None,
        ipa: Some(ipa),
    })
}
