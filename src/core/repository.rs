/// Persistence of templates and saved stories over a key-value store.

use rustc_hash::FxHashMap;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

use crate::schema::story::StoryInstance;
use crate::schema::template::Template;

/// Key under which the template collection is stored.
pub const TEMPLATES_KEY: &str = "madlibs-stories";
/// Key under which saved stories are stored.
pub const STORIES_KEY: &str = "madlibs-saved-instances";

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid storage key '{0}'")]
    InvalidKey(String),
}

/// String values under string keys, the shape of browser local storage.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, RepositoryError>;
    fn set(&mut self, key: &str, value: String) -> Result<(), RepositoryError>;
}

/// The template and story collections, loaded and saved whole.
pub trait Repository {
    fn load_templates(&self) -> Result<Vec<Template>, RepositoryError>;
    fn save_templates(&mut self, templates: &[Template]) -> Result<(), RepositoryError>;
    fn load_stories(&self) -> Result<Vec<StoryInstance>, RepositoryError>;
    fn save_stories(&mut self, stories: &[StoryInstance]) -> Result<(), RepositoryError>;
}

/// In-memory store, for tests and for sessions that should not persist.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: FxHashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, RepositoryError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: String) -> Result<(), RepositoryError> {
        self.entries.insert(key.to_string(), value);
        Ok(())
    }
}

/// One `<key>.json` file per key inside a directory.
#[derive(Debug, Clone)]
pub struct DirectoryStore {
    dir: PathBuf,
}

impl DirectoryStore {
    /// Open a store rooted at `dir`, creating the directory if needed.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, RepositoryError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, RepositoryError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(RepositoryError::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(format!("{}.json", key)))
    }
}

impl KeyValueStore for DirectoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, RepositoryError> {
        let path = self.path_for(key)?;
        match std::fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&mut self, key: &str, value: String) -> Result<(), RepositoryError> {
        let path = self.path_for(key)?;
        // write-then-rename so a failed write never truncates the old value
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, value)?;
        std::fs::rename(&tmp, &path)?;
        Ok(())
    }
}

/// Repository storing each collection as a JSON array under its key.
#[derive(Debug, Clone, Default)]
pub struct JsonRepository<S> {
    store: S,
}

impl<S: KeyValueStore> JsonRepository<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    fn load<T: DeserializeOwned>(&self, key: &str) -> Result<Vec<T>, RepositoryError> {
        match self.store.get(key)? {
            Some(json) => {
                let items: Vec<T> = serde_json::from_str(&json)?;
                debug!(key, count = items.len(), "loaded collection");
                Ok(items)
            }
            None => Ok(Vec::new()),
        }
    }

    fn save<T: Serialize>(&mut self, key: &str, items: &[T]) -> Result<(), RepositoryError> {
        let json = serde_json::to_string(items)?;
        self.store.set(key, json)?;
        debug!(key, count = items.len(), "saved collection");
        Ok(())
    }
}

impl<S: KeyValueStore> Repository for JsonRepository<S> {
    fn load_templates(&self) -> Result<Vec<Template>, RepositoryError> {
        self.load(TEMPLATES_KEY)
    }

    fn save_templates(&mut self, templates: &[Template]) -> Result<(), RepositoryError> {
        self.save(TEMPLATES_KEY, templates)
    }

    fn load_stories(&self) -> Result<Vec<StoryInstance>, RepositoryError> {
        self.load(STORIES_KEY)
    }

    fn save_stories(&mut self, stories: &[StoryInstance]) -> Result<(), RepositoryError> {
        self.save(STORIES_KEY, stories)
    }
}
