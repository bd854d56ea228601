//! Command handlers for the cmdmock CLI.
//!
//! Each submodule handles one subcommand. Dispatch stays in main.rs.

pub mod record;
pub mod replay;

use cmdmock::{Config, RecordingStore};

/// Store for this invocation: `--output-dir` wins over the configured directory.
pub fn open_store(output_dir: Option<&str>, config: &Config) -> RecordingStore {
    match output_dir {
        Some(dir) => RecordingStore::new(dir),
        None => RecordingStore::new(config.storage_directory()),
    }
}
