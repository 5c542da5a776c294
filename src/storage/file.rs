//! File-per-key storage backend
//!
//! Stores each value as one file in an XDG-compliant cache directory
//! (`~/.cache/freshslot/` on Linux), named after the storage key. Entries
//! survive process restarts, which is what lets a cache slot adopt a value
//! produced by an earlier run.

use std::fs;
use std::io;
use std::path::PathBuf;

use directories::ProjectDirs;

use super::{Storage, StorageError};

/// Durable store keeping one file per storage key
#[derive(Debug, Clone)]
pub struct FileStore {
    /// Directory where entry files are stored
    dir: PathBuf,
}

impl FileStore {
    /// Creates a store rooted at the XDG cache directory.
    ///
    /// Uses `~/.cache/freshslot/` on Linux, or the equivalent path on other
    /// platforms. Returns `None` if no cache directory can be determined
    /// (e.g. no home directory).
    pub fn new() -> Option<Self> {
        let project_dirs = ProjectDirs::from("", "", "freshslot")?;
        Some(Self {
            dir: project_dirs.cache_dir().to_path_buf(),
        })
    }

    /// Creates a store rooted at a custom directory.
    ///
    /// Useful for testing or when a specific location is needed.
    pub fn with_dir(dir: PathBuf) -> Self {
        Self { dir }
    }

    /// Returns the path of the file holding the given storage key.
    fn entry_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }

    /// Ensures the store directory exists.
    fn ensure_dir(&self) -> io::Result<()> {
        fs::create_dir_all(&self.dir)
    }
}

impl Storage for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        match fs::read_to_string(self.entry_path(key)) {
            Ok(content) => Ok(Some(content)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(StorageError::Io(err)),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.ensure_dir()?;
        fs::write(self.entry_path(key), value)?;
        Ok(())
    }
}
