/// Play sessions: collecting a word for every blank of a template.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::core::ids::IdSource;
use crate::core::render::{self, DisplayToken};
use crate::schema::content::{BlankItem, ItemId};
use crate::schema::story::{BlankValues, StoryId, StoryInstance};
use crate::schema::template::Template;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlayError {
    #[error("{missing} blank(s) still need a word")]
    Incomplete { missing: usize },
}

/// An in-progress playthrough. Holds one value per blank of the template,
/// in document order, starting empty.
#[derive(Debug, Clone)]
pub struct PlaySession {
    template: Template,
    values: Vec<(ItemId, String)>,
}

impl PlaySession {
    pub fn start(template: &Template) -> PlaySession {
        PlaySession {
            template: template.clone(),
            values: template
                .blanks()
                .map(|item| (item.id.clone(), String::new()))
                .collect(),
        }
    }

    pub fn template(&self) -> &Template {
        &self.template
    }

    /// The blanks to fill, numbered from 1 in document order.
    pub fn prompts(&self) -> impl Iterator<Item = (usize, &BlankItem)> {
        self.template.blanks().enumerate().map(|(i, b)| (i + 1, b))
    }

    /// Set the word for a blank. Ids that are not blanks of this template
    /// are ignored.
    pub fn set_value(&mut self, item_id: &ItemId, value: impl Into<String>) {
        if let Some((_, slot)) = self.values.iter_mut().find(|(id, _)| id == item_id) {
            *slot = value.into();
        }
    }

    pub fn value(&self, item_id: &ItemId) -> &str {
        self.values
            .iter()
            .find(|(id, _)| id == item_id)
            .map(|(_, v)| v.as_str())
            .unwrap_or("")
    }

    pub fn blank_values(&self) -> BlankValues {
        self.values.iter().cloned().collect()
    }

    pub fn missing(&self) -> Vec<&BlankItem> {
        render::find_missing_blanks(&self.template, &self.blank_values())
    }

    /// True when every blank has a non-whitespace value.
    pub fn is_complete(&self) -> bool {
        self.values.iter().all(|(_, v)| !v.trim().is_empty())
    }

    /// Clear every value and start over.
    pub fn reset(&mut self) {
        for (_, value) in &mut self.values {
            value.clear();
        }
    }

    pub fn preview(&self) -> Vec<Vec<DisplayToken>> {
        render::render(&self.template, &self.blank_values())
    }

    /// Turn a completed session into a saved story.
    pub fn finish(
        &self,
        ids: &mut dyn IdSource,
        saved_at: DateTime<Utc>,
        custom_title: Option<String>,
    ) -> Result<StoryInstance, PlayError> {
        if !self.is_complete() {
            return Err(PlayError::Incomplete {
                missing: self.missing().len(),
            });
        }
        Ok(self.finish_forced(ids, saved_at, custom_title))
    }

    /// Save the session whether or not every blank is filled. Empty values
    /// are left out of the story so they render as missing.
    pub fn finish_forced(
        &self,
        ids: &mut dyn IdSource,
        saved_at: DateTime<Utc>,
        custom_title: Option<String>,
    ) -> StoryInstance {
        StoryInstance {
            id: StoryId(ids.next_id("story")),
            template_id: self.template.id.clone(),
            saved_at,
            blank_values: self
                .values
                .iter()
                .filter(|(_, v)| !v.trim().is_empty())
                .cloned()
                .collect(),
            custom_title: custom_title
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty()),
            author_name: None,
        }
    }
}
