//! Configuration type definitions and defaults

use serde::{Deserialize, Serialize};

use crate::replayer::Pacing;

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub record: RecordConfig,
    #[serde(default)]
    pub replay: ReplayConfig,
}

/// Where recordings are read from and written to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Base directory; relative paths resolve against the working directory
    #[serde(default = "default_directory")]
    pub directory: String,
}

pub fn default_directory() -> String {
    "./".to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            directory: default_directory(),
        }
    }
}

/// Recording behaviour
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordConfig {
    /// Echo the child's output to the terminal while recording
    #[serde(default = "default_passthrough")]
    pub passthrough: bool,
}

pub fn default_passthrough() -> bool {
    true
}

impl Default for RecordConfig {
    fn default() -> Self {
        Self {
            passthrough: default_passthrough(),
        }
    }
}

/// Replay behaviour
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplayConfig {
    #[serde(default)]
    pub pacing: Pacing,
}
