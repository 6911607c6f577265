//! File-backed key-value store
//!
//! Each key is stored as its own file inside a data directory, which plays
//! the role browser-local storage plays for a web client: it survives
//! restarts and belongs to a single profile.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::domain::storage::KeyValueStore;
use crate::domain::DomainError;

/// Extension of the files holding stored values
const VALUE_EXTENSION: &str = "json";

/// Key-value store keeping one file per key in a directory
#[derive(Debug, Clone)]
pub struct FileKeyValueStore {
    root: PathBuf,
}

impl FileKeyValueStore {
    /// Creates a store rooted at a directory, creating it if needed
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, DomainError> {
        let root = root.into();

        fs::create_dir_all(&root).map_err(|e| {
            DomainError::storage(format!(
                "Failed to create storage directory '{}': {}",
                root.display(),
                e
            ))
        })?;

        Ok(Self { root })
    }

    /// Directory holding the stored values
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the file holding a key
    pub fn path_for(&self, key: &str) -> PathBuf {
        let file_name: String = key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.' {
                    c
                } else {
                    '_'
                }
            })
            .collect();

        self.root.join(format!("{}.{}", file_name, VALUE_EXTENSION))
    }
}

impl KeyValueStore for FileKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, DomainError> {
        let path = self.path_for(key);

        match fs::read_to_string(&path) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(DomainError::storage(format!(
                "Failed to read '{}': {}",
                path.display(),
                e
            ))),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), DomainError> {
        let path = self.path_for(key);
        let staging = path.with_extension("tmp");

        fs::write(&staging, value).map_err(|e| {
            DomainError::storage(format!("Failed to write '{}': {}", staging.display(), e))
        })?;

        fs::rename(&staging, &path).map_err(|e| {
            DomainError::storage(format!("Failed to replace '{}': {}", path.display(), e))
        })?;

        debug!(key = %key, path = %path.display(), "Stored value");
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<bool, DomainError> {
        let path = self.path_for(key);

        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(DomainError::storage(format!(
                "Failed to remove '{}': {}",
                path.display(),
                e
            ))),
        }
    }
}
