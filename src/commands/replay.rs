//! Replay command handler

use anyhow::{Context, Result};

use cmdmock::{replay_with, EventRegistry, Pacing, ProcessGuard, RecordingStore};

/// Replay the recording stored under `name`.
///
/// Exits the process with the recorded exit code once the exit entry is
/// reached; returns only for recordings without one.
#[cfg(not(tarpaulin_include))]
pub fn handle(store: &RecordingStore, guard: &ProcessGuard, name: &str, pacing: Pacing) -> Result<()> {
    let path = store.path_for(name);
    let recording = store
        .load(name, &EventRegistry::builtin())
        .with_context(|| format!("Failed to load recording {}", path.display()))?;

    replay_with(&recording, pacing, guard.token().clone())?;
    Ok(())
}
