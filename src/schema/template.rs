use serde::{Deserialize, Serialize};

use super::blank::ValidationError;
use super::content::{BlankItem, ContentItem, blank_items};
use super::string_id;
use crate::core::brackets;
use crate::core::ids::IdSource;

string_id!(
    /// Template id. Assigned once at creation and never reused.
    TemplateId
);

string_id!(
    /// Sentence id, unique within its template.
    SentenceId
);

/// One sentence of a template: literal text and blanks in reading order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sentence {
    pub id: SentenceId,
    #[serde(default)]
    pub content: Vec<ContentItem>,
}

impl Sentence {
    /// The sentence in its editable bracket form.
    pub fn to_text(&self) -> String {
        brackets::serialize(&self.content)
    }
}

/// An authored story skeleton.
///
/// Every mutator takes `&self` and returns a new `Template`. Mutators that
/// name a sentence which does not exist return an unchanged copy, since such
/// requests come from stale views rather than from bugs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "StoredTemplate")]
pub struct Template {
    pub id: TemplateId,
    pub title: String,
    pub sentences: Vec<Sentence>,
}

impl Template {
    pub fn create(title: impl Into<String>, ids: &mut dyn IdSource) -> Template {
        Template {
            id: TemplateId(ids.next_id("template")),
            title: title.into(),
            sentences: Vec::new(),
        }
    }

    pub fn with_title(&self, title: impl Into<String>) -> Template {
        Template {
            title: title.into(),
            ..self.clone()
        }
    }

    /// Append an empty sentence with an id not used elsewhere in the template.
    pub fn add_sentence(&self, ids: &mut dyn IdSource) -> Template {
        let mut id = SentenceId(ids.next_id("sentence"));
        while self.sentence(&id).is_some() {
            id = SentenceId(ids.next_id("sentence"));
        }
        let mut next = self.clone();
        next.sentences.push(Sentence {
            id,
            content: Vec::new(),
        });
        next
    }

    pub fn remove_sentence(&self, sentence_id: &SentenceId) -> Template {
        let mut next = self.clone();
        next.sentences.retain(|s| &s.id != sentence_id);
        next
    }

    pub fn replace_sentence_content(
        &self,
        sentence_id: &SentenceId,
        content: Vec<ContentItem>,
    ) -> Template {
        let mut next = self.clone();
        if let Some(sentence) = next.sentences.iter_mut().find(|s| &s.id == sentence_id) {
            sentence.content = content;
        }
        next
    }

    /// Re-parse a sentence from its edited bracket text, keeping the ids of
    /// blanks that did not change.
    pub fn edit_sentence_text(
        &self,
        sentence_id: &SentenceId,
        text: &str,
        ids: &mut dyn IdSource,
    ) -> Template {
        match self.sentence(sentence_id) {
            Some(sentence) => {
                let content = brackets::parse(text, &sentence.content, ids);
                self.replace_sentence_content(sentence_id, content)
            }
            None => self.clone(),
        }
    }

    pub fn sentence(&self, sentence_id: &SentenceId) -> Option<&Sentence> {
        self.sentences.iter().find(|s| &s.id == sentence_id)
    }

    /// All blanks in document order.
    pub fn blanks(&self) -> impl Iterator<Item = &BlankItem> {
        self.sentences.iter().flat_map(|s| blank_items(&s.content))
    }

    /// Commit-time check: one error per blank without a part of speech.
    pub fn validate(&self) -> Vec<ValidationError> {
        self.sentences
            .iter()
            .flat_map(|sentence| {
                blank_items(&sentence.content)
                    .filter(|item| item.blank.validate().is_err())
                    .map(|item| ValidationError::EmptyBlankInTemplate {
                        sentence: sentence.id.clone(),
                        item: item.id.clone(),
                    })
            })
            .collect()
    }
}

// Stored templates predate sentences: older records carry a flat `content`
// list, and some carry neither field.

#[derive(Debug, Deserialize)]
struct StoredTemplate {
    id: TemplateId,
    #[serde(default)]
    title: String,
    #[serde(default)]
    sentences: Option<Vec<Sentence>>,
    #[serde(default)]
    content: Option<Vec<ContentItem>>,
}

impl From<StoredTemplate> for Template {
    fn from(stored: StoredTemplate) -> Self {
        let sentences = match (stored.sentences, stored.content) {
            (Some(sentences), _) => sentences,
            (None, Some(content)) if !content.is_empty() => vec![Sentence {
                id: SentenceId(format!("sentence-{}-migrated", stored.id)),
                content,
            }],
            (None, _) => Vec::new(),
        };
        Template {
            id: stored.id,
            title: stored.title,
            sentences,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ids::SequentialIds;
    use crate::schema::blank::Blank;

    fn sample(ids: &mut SequentialIds) -> Template {
        let template = Template::create("Zoo trip", ids).add_sentence(ids);
        let sentence_id = template.sentences[0].id.clone();
        template.edit_sentence_text(&sentence_id, "A [adjective] [animal] waved.", ids)
    }

    #[test]
    fn fresh_template_has_no_sentences() {
        let mut ids = SequentialIds::default();
        let template = Template::create("Untitled", &mut ids);
        assert!(template.sentences.is_empty());
        assert_eq!(template.id, TemplateId::from("template-0"));
    }

    #[test]
    fn add_sentence_appends_empty_sentence() {
        let mut ids = SequentialIds::default();
        let template = Template::create("Untitled", &mut ids);
        let next = template.add_sentence(&mut ids);
        assert_eq!(next.sentences.len(), 1);
        assert!(next.sentences[0].content.is_empty());
        // the original is untouched
        assert!(template.sentences.is_empty());
    }

    #[test]
    fn add_sentence_skips_ids_already_in_the_template() {
        let template = Template::create("Untitled", &mut SequentialIds::default())
            .add_sentence(&mut SequentialIds::default());
        let next = template.add_sentence(&mut SequentialIds::default());
        assert_eq!(next.sentences[0].id, SentenceId::from("sentence-0"));
        assert_eq!(next.sentences[1].id, SentenceId::from("sentence-1"));
    }

    #[test]
    fn remove_sentence_unknown_id_is_noop() {
        let mut ids = SequentialIds::default();
        let template = sample(&mut ids);
        let same = template.remove_sentence(&SentenceId::from("no-such-sentence"));
        assert_eq!(same, template);
    }

    #[test]
    fn remove_sentence_drops_only_that_sentence() {
        let mut ids = SequentialIds::default();
        let template = sample(&mut ids).add_sentence(&mut ids);
        let first = template.sentences[0].id.clone();
        let next = template.remove_sentence(&first);
        assert_eq!(next.sentences.len(), 1);
        assert_ne!(next.sentences[0].id, first);
    }

    #[test]
    fn replace_sentence_content_unknown_id_is_noop() {
        let mut ids = SequentialIds::default();
        let template = sample(&mut ids);
        let same = template.replace_sentence_content(
            &SentenceId::from("missing"),
            vec![ContentItem::text("x", "replaced")],
        );
        assert_eq!(same, template);
    }

    #[test]
    fn replace_sentence_content_swaps_content() {
        let mut ids = SequentialIds::default();
        let template = sample(&mut ids);
        let sentence_id = template.sentences[0].id.clone();
        let next =
            template.replace_sentence_content(&sentence_id, vec![ContentItem::text("x", "Hi.")]);
        assert_eq!(next.sentences[0].content, vec![ContentItem::text("x", "Hi.")]);
    }

    #[test]
    fn blanks_in_document_order() {
        let mut ids = SequentialIds::default();
        let template = sample(&mut ids);
        let parts: Vec<&str> = template
            .blanks()
            .map(|b| b.blank.part_of_speech.as_str())
            .collect();
        assert_eq!(parts, vec!["adjective", "animal"]);
    }

    #[test]
    fn validate_reports_empty_blanks() {
        let mut ids = SequentialIds::default();
        let template = sample(&mut ids);
        let sentence_id = template.sentences[0].id.clone();
        let template = template.replace_sentence_content(
            &sentence_id,
            vec![
                ContentItem::blank("ok", Blank::draft("noun", None)),
                ContentItem::blank("bad", Blank::draft(" ", None)),
            ],
        );
        assert_eq!(
            template.validate(),
            vec![ValidationError::EmptyBlankInTemplate {
                sentence: sentence_id,
                item: "bad".into(),
            }]
        );
    }

    #[test]
    fn missing_sentences_default_to_empty() {
        let template: Template = serde_json::from_str(r#"{"id":"1","title":"Old"}"#).unwrap();
        assert!(template.sentences.is_empty());
    }

    #[test]
    fn legacy_content_migrates_into_one_sentence() {
        let template: Template = serde_json::from_str(
            r#"{"id":"42","title":"Old","content":[{"id":"t","type":"text","textContent":"Hello "},{"id":"b","type":"blank","blank":{"partOfSpeech":"name"}}]}"#,
        )
        .unwrap();
        assert_eq!(template.sentences.len(), 1);
        assert_eq!(template.sentences[0].id, SentenceId::from("sentence-42-migrated"));
        assert_eq!(template.sentences[0].content.len(), 2);
    }

    #[test]
    fn empty_legacy_content_yields_no_sentence() {
        let template: Template =
            serde_json::from_str(r#"{"id":"7","title":"Old","content":[]}"#).unwrap();
        assert!(template.sentences.is_empty());
    }

    #[test]
    fn serialized_template_has_no_legacy_field() {
        let mut ids = SequentialIds::default();
        let json = serde_json::to_value(sample(&mut ids)).unwrap();
        assert!(json.get("content").is_none());
        assert!(json.get("sentences").is_some());
    }
}
