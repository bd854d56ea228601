//! Time-faithful replay of recordings.
//!
//! The replayer walks a timeline in order, waits until each entry is due and
//! performs the entry's action: stream writes go to the replay's stdout or
//! stderr, and a process-exit entry ends the replay with its exit code.

use std::io::{self, Write};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::timeline::{Recording, Stream, TimelineEvent};
use crate::utils::CancelToken;

/// How waits between entries are computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Pacing {
    /// Sleep for the gap to the previous entry. Scheduling delays add up
    /// over long timelines.
    #[default]
    Relative,
    /// Sleep until replay start plus the entry's offset, absorbing
    /// scheduling delays from earlier entries.
    Absolute,
}

/// What executing a single event asks the replayer to do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Continue,
    Exit(i32),
}

/// How a replay ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplayOutcome {
    /// A process-exit entry was reached; nothing after it was replayed.
    Exited(i32),
    /// The timeline ran out without a process-exit entry.
    Completed,
}

impl ReplayOutcome {
    /// Exit code the replaying process should terminate with.
    pub fn exit_code(&self) -> i32 {
        match self {
            ReplayOutcome::Exited(code) => *code,
            ReplayOutcome::Completed => 0,
        }
    }
}

impl TimelineEvent {
    /// Perform this event against the replay's output streams.
    ///
    /// Stream writes are flushed immediately so output appears at the
    /// recorded moment. Writes recorded for stdin are ignored.
    pub fn apply<O: Write, E: Write>(&self, stdout: &mut O, stderr: &mut E) -> io::Result<Action> {
        match self {
            TimelineEvent::StreamWrite(write) => {
                match write.stream {
                    Stream::Stdout => {
                        stdout.write_all(&write.data)?;
                        stdout.flush()?;
                    }
                    Stream::Stderr => {
                        stderr.write_all(&write.data)?;
                        stderr.flush()?;
                    }
                    Stream::Stdin => {}
                }
                Ok(Action::Continue)
            }
            TimelineEvent::StreamClose(_) => Ok(Action::Continue),
            TimelineEvent::ProcessExit(exit) => Ok(Action::Exit(exit.exit_code)),
        }
    }
}

/// Replays recordings onto a pair of writers.
#[derive(Debug)]
pub struct Replayer<O: Write, E: Write> {
    stdout: O,
    stderr: E,
    pacing: Pacing,
    cancel: CancelToken,
}

impl Replayer<io::Stdout, io::Stderr> {
    /// Replayer writing to this process's real stdout and stderr.
    pub fn stdio() -> Self {
        Self::new(io::stdout(), io::stderr())
    }
}

impl<O: Write, E: Write> Replayer<O, E> {
    pub fn new(stdout: O, stderr: E) -> Self {
        Self {
            stdout,
            stderr,
            pacing: Pacing::default(),
            cancel: CancelToken::new(),
        }
    }

    pub fn pacing(mut self, pacing: Pacing) -> Self {
        self.pacing = pacing;
        self
    }

    /// Token that aborts the replay between entries when cancelled.
    pub fn cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = token;
        self
    }

    /// Replay `recording`, returning once an exit entry is reached or the
    /// timeline ends.
    ///
    /// # Errors
    ///
    /// - [`Error::Io`] if writing to either stream fails; replay stops there
    /// - [`Error::Cancelled`] if the cancel token fired during a wait
    pub fn run(&mut self, recording: &Recording) -> Result<ReplayOutcome> {
        let start = Instant::now();
        let mut previous = Duration::ZERO;

        debug!(
            path = %recording.path,
            entries = recording.timeline.len(),
            pacing = ?self.pacing,
            "Replaying recording"
        );

        for (index, entry) in recording.timeline.iter().enumerate() {
            let on_time = match self.pacing {
                // Offsets only decrease in hand-edited files; those entries run at once.
                Pacing::Relative => self
                    .cancel
                    .sleep(entry.time_offset.saturating_sub(previous)),
                Pacing::Absolute => self.cancel.sleep_until(start + entry.time_offset),
            };
            if !on_time {
                debug!(index, "Replay cancelled");
                return Err(Error::Cancelled);
            }
            previous = entry.time_offset;

            trace!(index, event_type = %entry.event_type, offset = ?entry.time_offset, "Replaying entry");
            let action = entry
                .event
                .apply(&mut self.stdout, &mut self.stderr)
                .map_err(|e| Error::io(format!("replaying entry {}", index), e))?;

            if let Action::Exit(code) = action {
                return Ok(ReplayOutcome::Exited(code));
            }
        }

        Ok(ReplayOutcome::Completed)
    }

    /// Give back the writers, e.g. to inspect captured output in tests.
    pub fn into_inner(self) -> (O, E) {
        (self.stdout, self.stderr)
    }
}

/// Replay `recording` on the real stdio with default pacing.
///
/// Terminates the process with the recorded exit code when the timeline
/// reaches its exit entry. Returns normally only if there is no exit entry,
/// and with an error if output could not be written.
pub fn replay(recording: &Recording) -> Result<()> {
    replay_with(recording, Pacing::default(), CancelToken::new())
}

/// [`replay`] with explicit pacing and cancellation.
pub fn replay_with(recording: &Recording, pacing: Pacing, cancel: CancelToken) -> Result<()> {
    let mut replayer = Replayer::stdio().pacing(pacing).cancel_token(cancel);
    match replayer.run(recording)? {
        ReplayOutcome::Exited(code) => {
            debug!(exit_code = code, "Replay reached exit entry");
            std::process::exit(code)
        }
        ReplayOutcome::Completed => Ok(()),
    }
}
