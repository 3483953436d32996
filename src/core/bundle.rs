/// Template bundles: a template plus its saved stories, as one JSON file.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::ids::IdSource;
use crate::schema::story::{StoryId, StoryInstance};
use crate::schema::template::{Template, TemplateId};

pub const BUNDLE_VERSION: &str = "1.0";
const IMPORTED_SUFFIX: &str = " (Imported)";

#[derive(Debug, Error)]
pub enum BundleError {
    #[error("not a template export: {0}")]
    Malformed(String),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateBundle {
    pub template: Template,
    pub saved_stories: Vec<StoryInstance>,
    pub exported_at: DateTime<Utc>,
    pub version: String,
}

/// An imported bundle, renumbered so it cannot collide with existing data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportedBundle {
    pub template: Template,
    pub stories: Vec<StoryInstance>,
}

impl TemplateBundle {
    /// Bundle `template` with those of `stories` that belong to it.
    pub fn export(
        template: &Template,
        stories: &[StoryInstance],
        exported_at: DateTime<Utc>,
    ) -> TemplateBundle {
        TemplateBundle {
            template: template.clone(),
            saved_stories: stories
                .iter()
                .filter(|s| s.template_id == template.id)
                .cloned()
                .collect(),
            exported_at,
            version: BUNDLE_VERSION.to_string(),
        }
    }

    pub fn to_json(&self) -> Result<String, BundleError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// `<title>-export.json` with path separators replaced by `-`, or
    /// `template-export.json` for an untitled template.
    pub fn suggested_file_name(&self) -> String {
        let title = self.template.title.trim();
        let stem = if title.is_empty() {
            "template".to_string()
        } else {
            title.replace(['/', '\\'], "-")
        };
        format!("{}-export.json", stem)
    }

    /// Read a bundle and give the template and every story fresh ids.
    ///
    /// The input is checked for `template` and `savedStories` before anything
    /// is decoded. Stories are re-pointed at the new template id whatever
    /// they referenced before.
    pub fn import(json: &str, ids: &mut dyn IdSource) -> Result<ImportedBundle, BundleError> {
        let value: serde_json::Value = serde_json::from_str(json)
            .map_err(|e| BundleError::Malformed(e.to_string()))?;
        for field in ["template", "savedStories"] {
            if value.get(field).map_or(true, serde_json::Value::is_null) {
                return Err(BundleError::Malformed(format!("missing '{}'", field)));
            }
        }

        let template: Template = serde_json::from_value(value["template"].clone())?;
        let stories: Vec<StoryInstance> = serde_json::from_value(value["savedStories"].clone())?;

        let template_id = TemplateId(ids.next_id("template"));
        let template = Template {
            id: template_id.clone(),
            title: format!("{}{}", template.title, IMPORTED_SUFFIX),
            ..template
        };
        let stories = stories
            .into_iter()
            .map(|story| StoryInstance {
                id: StoryId(ids.next_id("story")),
                template_id: template_id.clone(),
                ..story
            })
            .collect();

        Ok(ImportedBundle { template, stories })
    }
}
