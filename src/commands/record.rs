//! Record command handler

use anyhow::{Context, Result};

use cmdmock::{Config, Error, ProcessGuard, Recorder, RecordingStore, SharedSink, StdinSource};

/// Run `command` and save what it did under `name`.
///
/// The existing-file check happens before the command runs so a refused
/// overwrite never executes anything.
#[cfg(not(tarpaulin_include))]
pub fn handle(
    store: &RecordingStore,
    config: &Config,
    guard: &ProcessGuard,
    name: &str,
    quiet: bool,
    force: bool,
    command: &[String],
) -> Result<()> {
    if !force && store.exists(name) {
        let path = store.path_for(name);
        anyhow::bail!("{} (use --force to overwrite)", Error::AlreadyExists { path });
    }

    let (program, args) = command
        .split_first()
        .context("No command given to record")?;

    let mut recorder = Recorder::new(program.as_str(), args.iter().cloned())
        .stdin(StdinSource::Inherit)
        .cancel_token(guard.token().clone());
    if config.record.passthrough && !quiet {
        recorder = recorder
            .stdout(SharedSink::stdout())
            .stderr(SharedSink::stderr());
    }

    let recording = recorder.run()?;
    tracing::info!(
        program = %recording.path,
        exit_code = ?recording.exit_code(),
        entries = recording.timeline.len(),
        "Recorded command"
    );

    let path = store.save(name, &recording, force)?;
    eprintln!("Saved recording to {}", path.display());
    Ok(())
}
