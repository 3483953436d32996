/// Story rendering: template + blank values → display tokens and plain text.

use tracing::warn;

use crate::schema::content::{BlankItem, ContentItem, ItemId};
use crate::schema::story::{BlankValues, StoryInstance};
use crate::schema::template::Template;

/// Shown in place of a blank that has no value.
pub const MISSING_MARKER: &str = "[missing]";
/// Display title for a story whose template is gone and which has no custom title.
pub const UNKNOWN_STORY: &str = "Unknown Story";
/// Template title shown for an orphaned story.
pub const UNKNOWN_TEMPLATE: &str = "Unknown Template";

/// One piece of a rendered sentence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayToken {
    /// Literal template text.
    Text(String),
    /// A blank with a non-blank value.
    Filled { item_id: ItemId, value: String },
    /// A blank with no value, or only whitespace.
    Missing { item_id: ItemId },
}

impl DisplayToken {
    pub fn as_str(&self) -> &str {
        match self {
            DisplayToken::Text(text) => text,
            DisplayToken::Filled { value, .. } => value,
            DisplayToken::Missing { .. } => MISSING_MARKER,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, DisplayToken::Missing { .. })
    }
}

fn filled_value<'v>(values: &'v BlankValues, item: &BlankItem) -> Option<&'v str> {
    values
        .get(&item.id)
        .map(String::as_str)
        .filter(|v| !v.trim().is_empty())
}

/// Render every sentence of `template`, one token list per sentence.
/// Values for ids that are not blanks of this template are ignored.
pub fn render(template: &Template, values: &BlankValues) -> Vec<Vec<DisplayToken>> {
    template
        .sentences
        .iter()
        .map(|sentence| {
            sentence
                .content
                .iter()
                .map(|item| match item {
                    ContentItem::Text(text) => DisplayToken::Text(text.text.clone()),
                    ContentItem::Blank(blank) => match filled_value(values, blank) {
                        Some(value) => DisplayToken::Filled {
                            item_id: blank.id.clone(),
                            value: value.to_string(),
                        },
                        None => DisplayToken::Missing {
                            item_id: blank.id.clone(),
                        },
                    },
                })
                .collect()
        })
        .collect()
}

/// Blanks without a usable value, in document order.
pub fn find_missing_blanks<'t>(template: &'t Template, values: &BlankValues) -> Vec<&'t BlankItem> {
    template
        .blanks()
        .filter(|item| filled_value(values, item).is_none())
        .collect()
}

/// Join rendered sentences into plain text, with a space between sentences.
pub fn plain_text(rendered: &[Vec<DisplayToken>]) -> String {
    rendered
        .iter()
        .map(|sentence| sentence.iter().map(DisplayToken::as_str).collect::<String>())
        .collect::<Vec<_>>()
        .join(" ")
}

/// A saved story resolved against the current templates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedStory {
    pub title: String,
    pub template_title: String,
    pub sentences: Vec<Vec<DisplayToken>>,
    pub missing: usize,
    /// The story's template no longer exists; `sentences` is empty.
    pub orphaned: bool,
}

impl RenderedStory {
    pub fn text(&self) -> String {
        plain_text(&self.sentences)
    }
}

pub fn render_story(templates: &[Template], story: &StoryInstance) -> RenderedStory {
    match templates.iter().find(|t| t.id == story.template_id) {
        Some(template) => {
            let sentences = render(template, &story.blank_values);
            let missing = sentences.iter().flatten().filter(|t| t.is_missing()).count();
            RenderedStory {
                title: story.display_title(&template.title).to_string(),
                template_title: template.title.clone(),
                sentences,
                missing,
                orphaned: false,
            }
        }
        None => {
            warn!(story = %story.id, template = %story.template_id, "story references a missing template");
            RenderedStory {
                title: story.display_title(UNKNOWN_STORY).to_string(),
                template_title: UNKNOWN_TEMPLATE.to_string(),
                sentences: Vec::new(),
                missing: 0,
                orphaned: true,
            }
        }
    }
}

/// Text handed to share/clipboard: the quoted title, a blank line, then the story.
pub fn share_text(template: &Template, story: &StoryInstance) -> String {
    let body = plain_text(&render(template, &story.blank_values));
    format!("\"{}\"\n\n{}", story.display_title(&template.title), body)
}
