//! Templates and example stories that ship with the crate, plus loading of
//! RON template files.
//!
//! A template file gives each sentence in bracket syntax:
//!
//! ```ron
//! (
//!     id: "builtin-picnic",
//!     title: "The Picnic That Went Sideways",
//!     sentences: ["Last [day of the week], my [relative] packed a basket."],
//! )
//! ```
//!
//! Item ids are derived from the template id and the position of each item,
//! so loading the same file twice yields identical ids and stories saved
//! against a built-in template keep resolving.
//!
//! Example stories give their words in blank order rather than by item id:
//!
//! ```ron
//! [
//!     (
//!         id: "builtin-picnic-story-1",
//!         template: "builtin-picnic",
//!         saved_at: "2025-07-21T18:30:00Z",
//!         words: ["Tuesday", "grandma"],
//!     ),
//! ]
//! ```

use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

use crate::core::brackets;
use crate::core::ids::SequentialIds;
use crate::schema::story::{BlankValues, StoryId, StoryInstance};
use crate::schema::template::{Sentence, SentenceId, Template, TemplateId};

#[derive(Debug, Error)]
pub enum TemplateFileError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON deserialization error: {0}")]
    Ron(#[from] ron::error::SpannedError),
    #[error("story '{story}' refers to unknown template '{template}'")]
    UnknownTemplate { story: String, template: String },
    #[error("story '{story}' has {found} words for {expected} blanks")]
    WordCount {
        story: String,
        expected: usize,
        found: usize,
    },
}

const PICNIC: &str = include_str!("../template_data/picnic.ron");
const SPACE_INTERVIEW: &str = include_str!("../template_data/space_interview.ron");
const EXAMPLE_STORIES: &str = include_str!("../template_data/example_stories.ron");

#[derive(Debug, Deserialize)]
#[serde(rename = "Template")]
struct RonTemplate {
    id: String,
    title: String,
    #[serde(default)]
    sentences: Vec<String>,
}

impl From<RonTemplate> for Template {
    fn from(raw: RonTemplate) -> Self {
        let mut ids = SequentialIds::namespaced(raw.id.clone());
        let sentences = raw
            .sentences
            .iter()
            .enumerate()
            .map(|(i, text)| Sentence {
                id: SentenceId(format!("{}-sentence-{}", raw.id, i)),
                content: brackets::parse(text, &[], &mut ids),
            })
            .collect();
        Template {
            id: TemplateId(raw.id),
            title: raw.title,
            sentences,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename = "Story")]
struct RonStory {
    id: String,
    template: String,
    saved_at: DateTime<Utc>,
    #[serde(default)]
    custom_title: Option<String>,
    #[serde(default)]
    author_name: Option<String>,
    words: Vec<String>,
}

impl RonStory {
    fn into_story(self, templates: &[Template]) -> Result<StoryInstance, TemplateFileError> {
        let Some(template) = templates.iter().find(|t| t.id.as_str() == self.template) else {
            return Err(TemplateFileError::UnknownTemplate {
                story: self.id,
                template: self.template,
            });
        };
        let expected = template.blanks().count();
        if expected != self.words.len() {
            return Err(TemplateFileError::WordCount {
                story: self.id,
                expected,
                found: self.words.len(),
            });
        }
        let blank_values: BlankValues = template
            .blanks()
            .map(|b| b.id.clone())
            .zip(self.words)
            .collect();
        Ok(StoryInstance {
            id: StoryId(self.id),
            template_id: template.id.clone(),
            saved_at: self.saved_at,
            blank_values,
            custom_title: self.custom_title,
            author_name: self.author_name,
        })
    }
}

/// Parse a template from a RON string.
pub fn parse_ron(input: &str) -> Result<Template, TemplateFileError> {
    let raw: RonTemplate = ron::from_str(input)?;
    Ok(raw.into())
}

/// Load a template from a RON file.
pub fn load_from_ron(path: &Path) -> Result<Template, TemplateFileError> {
    let contents = std::fs::read_to_string(path)?;
    parse_ron(&contents)
}

/// Every template bundled with the crate.
pub fn builtin_templates() -> Vec<Template> {
    [PICNIC, SPACE_INTERVIEW]
        .into_iter()
        .filter_map(|source| match parse_ron(source) {
            Ok(template) => Some(template),
            Err(e) => {
                tracing::error!(error = %e, "bundled template failed to parse");
                None
            }
        })
        .collect()
}

/// Parse a RON list of stories, resolving each one's words against `templates`.
pub fn parse_stories_ron(
    input: &str,
    templates: &[Template],
) -> Result<Vec<StoryInstance>, TemplateFileError> {
    let raw: Vec<RonStory> = ron::from_str(input)?;
    raw.into_iter().map(|story| story.into_story(templates)).collect()
}

/// Example stories bundled for the built-in templates.
pub fn builtin_stories(templates: &[Template]) -> Vec<StoryInstance> {
    match parse_stories_ron(EXAMPLE_STORIES, templates) {
        Ok(stories) => stories,
        Err(e) => {
            tracing::error!(error = %e, "bundled stories failed to load");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::content::ContentItem;

    #[test]
    fn bundled_templates_parse() {
        let templates = builtin_templates();
        assert_eq!(templates.len(), 2);
        for template in &templates {
            assert!(!template.sentences.is_empty());
            assert!(template.validate().is_empty(), "{} has empty blanks", template.id);
        }
    }

    #[test]
    fn bundled_ids_are_stable() {
        assert_eq!(builtin_templates(), builtin_templates());
    }

    #[test]
    fn item_ids_are_namespaced() {
        let template = parse_ron(r#"(id: "t1", title: "T", sentences: ["A [noun].", "B [verb]."])"#)
            .unwrap();
        assert_eq!(template.sentences[1].id, SentenceId::from("t1-sentence-1"));
        let ids: Vec<&str> = template
            .sentences
            .iter()
            .flat_map(|s| s.content.iter().map(|c| c.id().as_str()))
            .collect();
        assert_eq!(
            ids,
            vec!["t1-text-0", "t1-blank-1", "t1-text-2", "t1-text-3", "t1-blank-4", "t1-text-5"]
        );
    }

    #[test]
    fn escaped_brackets_in_bundled_text() {
        let picnic = parse_ron(PICNIC).unwrap();
        let last = picnic.sentences.last().unwrap();
        let ContentItem::Text(text) = last.content.last().unwrap() else {
            panic!("expected trailing text");
        };
        assert_eq!(text.text, " picnic in [family] history.");
    }

    #[test]
    fn missing_sentences_field_defaults() {
        let template = parse_ron(r#"(id: "empty", title: "Nothing yet")"#).unwrap();
        assert!(template.sentences.is_empty());
    }

    #[test]
    fn bundled_stories_fill_every_blank() {
        let templates = builtin_templates();
        let stories = builtin_stories(&templates);
        assert_eq!(stories.len(), 2);
        for story in &stories {
            let template = templates.iter().find(|t| t.id == story.template_id).unwrap();
            assert!(crate::core::render::find_missing_blanks(template, &story.blank_values).is_empty());
        }
        assert_eq!(stories[0].custom_title.as_deref(), Some("Grandma vs. the Raccoon"));
        assert_eq!(stories[1].author_name, None);
    }

    #[test]
    fn story_word_count_must_match() {
        let templates = vec![
            parse_ron(r#"(id: "t1", title: "T", sentences: ["A [noun] and a [verb]."])"#).unwrap(),
        ];
        let short = r#"[(id: "s", template: "t1", saved_at: "2025-01-01T00:00:00Z", words: ["hat"])]"#;
        assert!(matches!(
            parse_stories_ron(short, &templates),
            Err(TemplateFileError::WordCount { expected: 2, found: 1, .. })
        ));
        let stray = r#"[(id: "s", template: "nope", saved_at: "2025-01-01T00:00:00Z", words: [])]"#;
        assert!(matches!(
            parse_stories_ron(stray, &templates),
            Err(TemplateFileError::UnknownTemplate { .. })
        ));
    }

    #[test]
    fn bad_ron_is_an_error() {
        assert!(parse_ron("(id: 3)").is_err());
    }
}
