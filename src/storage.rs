//! Named recording files in a directory

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{Error, Result};
use crate::timeline::{EventRegistry, Recording};

/// Extension appended to recording names that carry none.
pub const RECORDING_EXTENSION: &str = "json";

/// Reads and writes recordings by name under a base directory.
#[derive(Debug, Clone)]
pub struct RecordingStore {
    dir: PathBuf,
}

impl RecordingStore {
    /// Create a store rooted at `dir`.
    ///
    /// A relative `dir` is resolved against the current working directory
    /// once, here, so later `chdir`s do not move the store.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        let dir = if dir.is_relative() {
            std::env::current_dir()
                .map(|cwd| cwd.join(&dir))
                .unwrap_or(dir)
        } else {
            dir
        };
        Self { dir }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File path for a recording name.
    ///
    /// `.json` is appended when the name has no extension. Names may contain
    /// subdirectories.
    pub fn path_for(&self, name: &str) -> PathBuf {
        let mut path = self.dir.join(name);
        if path.extension().is_none() {
            path.set_extension(RECORDING_EXTENSION);
        }
        path
    }

    pub fn exists(&self, name: &str) -> bool {
        self.path_for(name).exists()
    }

    /// Write `recording` as pretty JSON, creating parent directories.
    ///
    /// # Errors
    ///
    /// [`Error::AlreadyExists`] if the file exists and `force` is false;
    /// [`Error::Io`] or [`Error::Encode`] if writing fails.
    pub fn save(&self, name: &str, recording: &Recording, force: bool) -> Result<PathBuf> {
        let path = self.path_for(name);
        if !force && path.exists() {
            return Err(Error::AlreadyExists { path });
        }

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                Error::io(format!("creating directory {}", parent.display()), e)
            })?;
        }

        let json = recording.to_json_pretty()?;
        fs::write(&path, json)
            .map_err(|e| Error::io(format!("writing {}", path.display()), e))?;

        debug!(path = %path.display(), entries = recording.timeline.len(), "Saved recording");
        Ok(path)
    }

    /// Load the recording stored under `name`.
    pub fn load(&self, name: &str, registry: &EventRegistry) -> Result<Recording> {
        let path = self.path_for(name);
        debug!(path = %path.display(), "Loading recording");
        Recording::from_path(&path, registry)
    }
}
