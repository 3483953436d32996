use chrono::{DateTime, Utc};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use super::content::ItemId;
use super::string_id;
use super::template::TemplateId;

string_id!(
    /// Saved story id.
    StoryId
);

/// Words supplied for blanks, keyed by the blank item's id.
pub type BlankValues = FxHashMap<ItemId, String>;

/// A saved, filled-in playthrough of a template.
///
/// `template_id` may no longer resolve if the template was deleted, and
/// `blank_values` may lack entries for blanks added after the save.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryInstance {
    pub id: StoryId,
    #[serde(alias = "storyId")]
    pub template_id: TemplateId,
    pub saved_at: DateTime<Utc>,
    #[serde(default)]
    pub blank_values: BlankValues,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_name: Option<String>,
}

impl StoryInstance {
    /// Title shown for this story: the custom title, or else `template_title`.
    pub fn display_title<'a>(&'a self, template_title: &'a str) -> &'a str {
        match self.custom_title.as_deref() {
            Some(title) if !title.trim().is_empty() => title,
            _ => template_title,
        }
    }

    /// Apply edits made on the read screen.
    ///
    /// An edited title equal to the template title leaves any existing custom
    /// title in place; anything else becomes the new custom title.
    pub fn with_edits(
        &self,
        blank_values: BlankValues,
        edited_title: &str,
        template_title: &str,
    ) -> StoryInstance {
        let edited_title = edited_title.trim();
        let custom_title = if edited_title != template_title {
            Some(edited_title.to_string())
        } else {
            self.custom_title.clone()
        };
        StoryInstance {
            blank_values,
            custom_title,
            ..self.clone()
        }
    }
}
