//! Scene stores: where stages are opened from and saved to.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use super::Stage;
use crate::usda;
use crate::util::{Error, Result};

/// Backing store for scene documents, addressed by identifier.
pub trait SceneStore: Send + Sync {
    /// Check if a document exists at `identifier`.
    fn exists(&self, identifier: &str) -> bool;

    /// Open an existing document.
    fn open(&self, identifier: &str) -> Result<Stage>;

    /// Create a new, empty stage bound to `identifier`.
    ///
    /// Nothing is persisted until [`SceneStore::save`]; an existing
    /// document at the same identifier is replaced on save.
    fn create_new(&self, identifier: &str) -> Result<Stage>;

    /// Persist a stage at its identifier.
    fn save(&self, stage: &Stage) -> Result<()>;
}

fn not_found(identifier: &str) -> Error {
    Error::Io(io::Error::new(io::ErrorKind::NotFound, format!("{identifier}: no such document")))
}

/// In-memory store, mainly for tests and embedding.
#[derive(Default)]
pub struct MemoryStore {
    docs: Mutex<HashMap<String, Stage>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a stage under its identifier, replacing any existing one.
    pub fn insert(&self, stage: Stage) {
        self.docs.lock().insert(stage.identifier().to_string(), stage);
    }

    /// Copy of a stored stage.
    pub fn get(&self, identifier: &str) -> Option<Stage> {
        self.docs.lock().get(identifier).cloned()
    }

    /// Number of stored documents.
    pub fn len(&self) -> usize {
        self.docs.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.lock().is_empty()
    }
}

impl SceneStore for MemoryStore {
    fn exists(&self, identifier: &str) -> bool {
        self.docs.lock().contains_key(identifier)
    }

    fn open(&self, identifier: &str) -> Result<Stage> {
        self.get(identifier).ok_or_else(|| not_found(identifier))
    }

    fn create_new(&self, identifier: &str) -> Result<Stage> {
        Ok(Stage::new(identifier))
    }

    fn save(&self, stage: &Stage) -> Result<()> {
        let mut stored = stage.clone();
        stored.thaw();
        self.insert(stored);
        Ok(())
    }
}

/// Store backed by USDA files on disk. Identifiers are file paths,
/// relative ones resolved against `root` when set.
#[derive(Clone, Debug, Default)]
pub struct FileStore {
    root: Option<PathBuf>,
}

impl FileStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve relative identifiers against `root`.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self { root: Some(root.into()) }
    }

    fn resolve(&self, identifier: &str) -> PathBuf {
        let path = Path::new(identifier);
        match &self.root {
            Some(root) if path.is_relative() => root.join(path),
            _ => path.to_path_buf(),
        }
    }
}

impl SceneStore for FileStore {
    fn exists(&self, identifier: &str) -> bool {
        self.resolve(identifier).is_file()
    }

    fn open(&self, identifier: &str) -> Result<Stage> {
        let path = self.resolve(identifier);
        tracing::debug!("opening {}", path.display());
        let text = fs::read_to_string(&path)?;
        usda::read(&text, identifier)
    }

    fn create_new(&self, identifier: &str) -> Result<Stage> {
        let path = self.resolve(identifier);
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            if !parent.is_dir() {
                return Err(Error::Io(io::Error::new(
                    io::ErrorKind::NotFound,
                    format!("directory {} does not exist", parent.display()),
                )));
            }
        }
        Ok(Stage::new(identifier))
    }

    fn save(&self, stage: &Stage) -> Result<()> {
        let path = self.resolve(stage.identifier());
        let text = usda::write(stage);
        let mut tmp = path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        fs::write(&tmp, text)?;
        if let Err(e) = fs::rename(&tmp, &path) {
            let _ = fs::remove_file(&tmp);
            return Err(e.into());
        }
        tracing::debug!("saved {}", path.display());
        Ok(())
    }
}
