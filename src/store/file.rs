use super::{KeyValueStore, StoreKey};
use crate::error::{AtomError, Result};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Stores each key as `<dir>/<key>.json`
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Open a store rooted at `dir`, creating the directory if needed
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|source| AtomError::DirectoryAccess {
            path: dir.clone(),
            source,
        })?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: StoreKey) -> PathBuf {
        self.dir.join(format!("{}.json", key.as_str()))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: StoreKey) -> Result<Option<String>> {
        let path = self.path_for(key);
        match fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(AtomError::FileRead { path, source }),
        }
    }

    fn set(&self, key: StoreKey, value: &str) -> Result<()> {
        let path = self.path_for(key);
        // Atomic replace via a sibling temp file
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value).map_err(|source| AtomError::FileWrite {
            path: tmp.clone(),
            source,
        })?;
        fs::rename(&tmp, &path).map_err(|source| AtomError::FileWrite {
            path: path.clone(),
            source,
        })?;
        debug!(key = %key, bytes = value.len(), "stored value");
        Ok(())
    }

    fn remove(&self, key: StoreKey) -> Result<()> {
        let path = self.path_for(key);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(source) => Err(AtomError::FileWrite { path, source }),
        }
    }
}
