//! JSON-lines file sink

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::domain::telemetry::{Event, EventSink};
use crate::domain::DomainError;

/// Appends each event as one JSON document per line
#[derive(Debug)]
pub struct JsonLinesEventSink {
    path: PathBuf,
    file: Mutex<File>,
}

impl JsonLinesEventSink {
    /// Opens (or creates) the file at `path` for appending
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, DomainError> {
        let path = path.into();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| {
                DomainError::telemetry(format!(
                    "Failed to create directory '{}': {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| {
                DomainError::telemetry(format!("Failed to open '{}': {}", path.display(), e))
            })?;

        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    /// Path of the events file
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl EventSink for JsonLinesEventSink {
    fn emit(&self, event: &Event) -> Result<(), DomainError> {
        let mut line = serde_json::to_string(event)?;
        line.push('\n');

        let mut file = self.file.lock().map_err(|e| {
            DomainError::telemetry(format!("Failed to acquire file lock: {}", e))
        })?;

        file.write_all(line.as_bytes()).map_err(|e| {
            DomainError::telemetry(format!("Failed to write '{}': {}", self.path.display(), e))
        })
    }
}
