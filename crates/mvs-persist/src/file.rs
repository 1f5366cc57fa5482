//! File-backed local store: one `<key>.json` per root store.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::PersistResult;
use crate::traits::{validate_key, LocalStore};

/// Stores each blob in `<dir>/<key>.json`. Writes go to a temporary file in
/// the same directory which is then renamed over the target, so readers
/// never observe a partial snapshot.
#[derive(Clone, Debug)]
pub struct FileLocalStore {
    dir: PathBuf,
}

impl FileLocalStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PersistResult<PathBuf> {
        validate_key(key)?;
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl LocalStore for FileLocalStore {
    fn read(&self, key: &str) -> PersistResult<Option<String>> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, key: &str, blob: &str) -> PersistResult<()> {
        let path = self.path_for(key)?;
        fs::create_dir_all(&self.dir)?;
        let mut tmp = tempfile::NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(blob.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(&path).map_err(|e| e.error)?;
        debug!(key = %key, path = %path.display(), bytes = blob.len(), "wrote snapshot");
        Ok(())
    }

    fn remove(&self, key: &str) -> PersistResult<bool> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}
