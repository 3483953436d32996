use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::content::ItemId;
use super::template::SentenceId;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("a blank needs a part of speech")]
    EmptyPartOfSpeech,
    #[error("blank {item} in sentence {sentence} has no part of speech")]
    EmptyBlankInTemplate { sentence: SentenceId, item: ItemId },
}

/// The kind of word a blank asks for, with an optional clarifying note.
///
/// Serialized as `{"partOfSpeech": "...", "hint": "..."}`; the hint key is
/// omitted when absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Blank {
    pub part_of_speech: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl Blank {
    /// Build a committed blank. Both fields are trimmed, and an empty part of
    /// speech is rejected.
    pub fn new(part_of_speech: &str, hint: Option<&str>) -> Result<Blank, ValidationError> {
        let blank = Self::draft(part_of_speech, hint);
        blank.validate()?;
        Ok(blank)
    }

    /// Build a blank without validating it. The live parser produces drafts
    /// because the author may be halfway through typing `[`...`]`.
    pub fn draft(part_of_speech: &str, hint: Option<&str>) -> Blank {
        Blank {
            part_of_speech: part_of_speech.trim().to_string(),
            hint: normalize_hint(hint),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.part_of_speech.trim().is_empty() {
            return Err(ValidationError::EmptyPartOfSpeech);
        }
        Ok(())
    }

    /// Value equality on trimmed fields, where an empty hint counts as no hint.
    pub fn same_as(&self, other: &Blank) -> bool {
        self.part_of_speech.trim() == other.part_of_speech.trim()
            && normalize_hint(self.hint.as_deref()) == normalize_hint(other.hint.as_deref())
    }

    /// Form-field label, e.g. `adjective (describing color)`.
    pub fn label(&self) -> String {
        match &self.hint {
            Some(hint) => format!("{} ({})", self.part_of_speech, hint),
            None => self.part_of_speech.clone(),
        }
    }
}

fn normalize_hint(hint: Option<&str>) -> Option<String> {
    hint.map(str::trim)
        .filter(|h| !h.is_empty())
        .map(str::to_string)
}
