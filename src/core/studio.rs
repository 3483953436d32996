/// The studio: templates and saved stories, kept in memory and persisted
/// through a [`Repository`].
///
/// Mutations build the new collections, write them, and only then replace
/// the in-memory copies. After a failed write the in-memory copies still
/// match what is stored.

use chrono::{DateTime, Utc};
use rustc_hash::FxHashSet;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::builtin_templates::{builtin_stories, builtin_templates};
use crate::core::bundle::{BundleError, TemplateBundle};
use crate::core::ids::{IdSource, SeededIds};
use crate::core::play::{PlayError, PlaySession};
use crate::core::render::{self, RenderedStory};
use crate::core::repository::{Repository, RepositoryError};
use crate::schema::story::{StoryId, StoryInstance};
use crate::schema::template::{Template, TemplateId};

#[derive(Debug, Error)]
pub enum StudioError {
    #[error("repository error: {0}")]
    Repository(#[from] RepositoryError),
    #[error("bundle error: {0}")]
    Bundle(#[from] BundleError),
    #[error("play error: {0}")]
    Play(#[from] PlayError),
    #[error("template not found: {0}")]
    UnknownTemplate(TemplateId),
}

pub struct Studio<R> {
    repository: R,
    ids: Box<dyn IdSource>,
    templates: Vec<Template>,
    stories: Vec<StoryInstance>,
}

/// Builder for constructing a `Studio`.
///
/// ```no_run
/// use madlibs_engine::core::repository::{DirectoryStore, JsonRepository};
/// use madlibs_engine::core::studio::StudioBuilder;
///
/// let store = DirectoryStore::new("madlibs-data")?;
/// let studio = StudioBuilder::new().build(JsonRepository::new(store))?;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct StudioBuilder {
    seed: Option<u64>,
    builtin_templates: bool,
    ids: Option<Box<dyn IdSource>>,
}

impl<R: Repository> Studio<R> {
    pub fn templates(&self) -> &[Template] {
        &self.templates
    }

    pub fn stories(&self) -> &[StoryInstance] {
        &self.stories
    }

    pub fn template(&self, id: &TemplateId) -> Option<&Template> {
        self.templates.iter().find(|t| &t.id == id)
    }

    pub fn story(&self, id: &StoryId) -> Option<&StoryInstance> {
        self.stories.iter().find(|s| &s.id == id)
    }

    pub fn stories_for<'a>(
        &'a self,
        template_id: &'a TemplateId,
    ) -> impl Iterator<Item = &'a StoryInstance> + 'a {
        self.stories.iter().filter(move |s| &s.template_id == template_id)
    }

    /// Templates with at least one saved story, for filtering the story list.
    pub fn templates_with_stories(&self) -> Vec<&Template> {
        let used: FxHashSet<&TemplateId> = self.stories.iter().map(|s| &s.template_id).collect();
        self.templates.iter().filter(|t| used.contains(&t.id)).collect()
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    /// Fresh template with an unused id. Not stored until `save_template`.
    pub fn create_template(&mut self, title: impl Into<String>) -> Template {
        Template {
            id: self.fresh_template_id(),
            title: title.into(),
            sentences: Vec::new(),
        }
    }

    /// Id source for editing templates outside the studio.
    pub fn ids(&mut self) -> &mut dyn IdSource {
        self.ids.as_mut()
    }

    /// Insert or replace a template, keeping its position when it exists.
    pub fn save_template(&mut self, template: Template) -> Result<(), StudioError> {
        for problem in template.validate() {
            warn!(template = %template.id, %problem, "saving template with an invalid blank");
        }
        let mut templates = self.templates.clone();
        match templates.iter_mut().find(|t| t.id == template.id) {
            Some(existing) => *existing = template.clone(),
            None => templates.push(template.clone()),
        }
        self.repository.save_templates(&templates)?;
        self.templates = templates;
        info!(template = %template.id, title = %template.title, "template saved");
        Ok(())
    }

    /// Delete a template and every story saved from it. Returns the number
    /// of stories removed; an unknown id removes nothing.
    ///
    /// Stories are written first, so a failed second write leaves a template
    /// without stories rather than stories without a template.
    pub fn delete_template(&mut self, id: &TemplateId) -> Result<usize, StudioError> {
        if self.template(id).is_none() {
            return Ok(0);
        }
        let templates: Vec<Template> =
            self.templates.iter().filter(|t| &t.id != id).cloned().collect();
        let stories: Vec<StoryInstance> = self
            .stories
            .iter()
            .filter(|s| &s.template_id != id)
            .cloned()
            .collect();
        let removed = self.stories.len() - stories.len();

        self.repository.save_stories(&stories)?;
        self.stories = stories;
        self.repository.save_templates(&templates)?;
        self.templates = templates;
        info!(template = %id, stories = removed, "template deleted");
        Ok(removed)
    }

    pub fn start_play(&self, template_id: &TemplateId) -> Option<PlaySession> {
        self.template(template_id).map(PlaySession::start)
    }

    /// Save a finished play session. Unless `force` is set, every blank
    /// must have a value.
    pub fn save_story(
        &mut self,
        session: &PlaySession,
        custom_title: Option<String>,
        force: bool,
    ) -> Result<StoryInstance, StudioError> {
        let template_id = &session.template().id;
        if self.template(template_id).is_none() {
            return Err(StudioError::UnknownTemplate(template_id.clone()));
        }
        let now = Utc::now();
        let mut story = if force {
            session.finish_forced(self.ids.as_mut(), now, custom_title)
        } else {
            session.finish(self.ids.as_mut(), now, custom_title)?
        };
        story.id = self.fresh_story_id(story.id);

        let mut stories = self.stories.clone();
        stories.push(story.clone());
        self.repository.save_stories(&stories)?;
        self.stories = stories;
        info!(story = %story.id, template = %story.template_id, "story saved");
        Ok(story)
    }

    /// Replace a saved story. Returns `false` when no story has that id.
    pub fn update_story(&mut self, story: StoryInstance) -> Result<bool, StudioError> {
        let Some(index) = self.stories.iter().position(|s| s.id == story.id) else {
            return Ok(false);
        };
        let mut stories = self.stories.clone();
        stories[index] = story;
        self.repository.save_stories(&stories)?;
        self.stories = stories;
        Ok(true)
    }

    pub fn delete_story(&mut self, id: &StoryId) -> Result<bool, StudioError> {
        if self.story(id).is_none() {
            return Ok(false);
        }
        let stories: Vec<StoryInstance> =
            self.stories.iter().filter(|s| &s.id != id).cloned().collect();
        self.repository.save_stories(&stories)?;
        self.stories = stories;
        info!(story = %id, "story deleted");
        Ok(true)
    }

    pub fn render_story(&self, id: &StoryId) -> Option<RenderedStory> {
        self.story(id)
            .map(|story| render::render_story(&self.templates, story))
    }

    /// Share payload for a story; `None` if the story or its template is gone.
    pub fn share_text(&self, id: &StoryId) -> Option<String> {
        let story = self.story(id)?;
        let template = self.template(&story.template_id)?;
        Some(render::share_text(template, story))
    }

    pub fn export_bundle(
        &self,
        template_id: &TemplateId,
        exported_at: DateTime<Utc>,
    ) -> Option<TemplateBundle> {
        self.template(template_id)
            .map(|template| TemplateBundle::export(template, &self.stories, exported_at))
    }

    /// Import a bundle as a new template with its stories. Nothing is
    /// written when the bundle is malformed.
    pub fn import_bundle(&mut self, json: &str) -> Result<TemplateId, StudioError> {
        let mut imported = TemplateBundle::import(json, self.ids.as_mut())?;
        imported.template.id = self.fresh_template_id_from(imported.template.id);
        for story in &mut imported.stories {
            story.template_id = imported.template.id.clone();
        }
        let mut taken: FxHashSet<StoryId> = self.stories.iter().map(|s| s.id.clone()).collect();
        for story in &mut imported.stories {
            while taken.contains(&story.id) {
                story.id = StoryId(self.ids.next_id("story"));
            }
            taken.insert(story.id.clone());
        }

        let mut templates = self.templates.clone();
        templates.push(imported.template.clone());
        let mut stories = self.stories.clone();
        stories.extend(imported.stories.iter().cloned());

        self.repository.save_templates(&templates)?;
        if let Err(e) = self.repository.save_stories(&stories) {
            if let Err(rollback) = self.repository.save_templates(&self.templates) {
                error!(error = %rollback, "could not restore templates after a failed import");
            }
            return Err(e.into());
        }
        self.templates = templates;
        self.stories = stories;
        info!(
            template = %imported.template.id,
            stories = imported.stories.len(),
            "bundle imported"
        );
        Ok(imported.template.id)
    }

    fn fresh_template_id(&mut self) -> TemplateId {
        let id = TemplateId(self.ids.next_id("template"));
        self.fresh_template_id_from(id)
    }

    fn fresh_template_id_from(&mut self, mut id: TemplateId) -> TemplateId {
        while self.template(&id).is_some() {
            id = TemplateId(self.ids.next_id("template"));
        }
        id
    }

    fn fresh_story_id(&mut self, mut id: StoryId) -> StoryId {
        while self.story(&id).is_some() {
            id = StoryId(self.ids.next_id("story"));
        }
        id
    }
}

impl Default for StudioBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl StudioBuilder {
    pub fn new() -> Self {
        StudioBuilder {
            seed: None,
            builtin_templates: true,
            ids: None,
        }
    }

    /// Seed for id minting. Without a seed, ids come from OS entropy.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Whether the bundled templates and example stories are merged in. On
    /// by default.
    pub fn with_builtin_templates(mut self, enabled: bool) -> Self {
        self.builtin_templates = enabled;
        self
    }

    /// Use a specific id source; takes precedence over `seed`.
    pub fn with_id_source(mut self, ids: Box<dyn IdSource>) -> Self {
        self.ids = Some(ids);
        self
    }

    /// Load both collections from `repository` and merge in the built-in
    /// templates and their example stories. Stored records win over built-ins
    /// with the same id; a collection is written back only if the merge
    /// added to it.
    pub fn build<R: Repository>(self, mut repository: R) -> Result<Studio<R>, StudioError> {
        let mut templates = repository.load_templates()?;
        let mut stories = repository.load_stories()?;

        if self.builtin_templates {
            let builtins = builtin_templates();

            let before = templates.len();
            let known: FxHashSet<TemplateId> = templates.iter().map(|t| t.id.clone()).collect();
            templates.extend(builtins.iter().filter(|t| !known.contains(&t.id)).cloned());
            if templates.len() > before {
                repository.save_templates(&templates)?;
            }

            let before = stories.len();
            let known: FxHashSet<StoryId> = stories.iter().map(|s| s.id.clone()).collect();
            stories.extend(
                builtin_stories(&builtins)
                    .into_iter()
                    .filter(|s| !known.contains(&s.id)),
            );
            if stories.len() > before {
                repository.save_stories(&stories)?;
            }
        }

        let orphaned = stories
            .iter()
            .filter(|s| !templates.iter().any(|t| t.id == s.template_id))
            .count();
        if orphaned > 0 {
            warn!(orphaned, "stories reference templates that no longer exist");
        }
        info!(
            templates = templates.len(),
            stories = stories.len(),
            "studio loaded"
        );

        let ids = match (self.ids, self.seed) {
            (Some(ids), _) => ids,
            (None, Some(seed)) => Box::new(SeededIds::new(seed)) as Box<dyn IdSource>,
            (None, None) => Box::new(SeededIds::from_entropy()),
        };

        Ok(Studio {
            repository,
            ids,
            templates,
            stories,
        })
    }
}
