//! Recording of a child process's output and exit code.
//!
//! A [`Recorder`] spawns the command with piped stdout and stderr. One copier
//! thread per stream drains its pipe through a [`StreamMonitor`], whose
//! observer stamps each chunk and appends it to a shared [`LiveTimeline`].
//! Once the child has exited and both pipes are drained, a
//! [`ProcessExitEvent`] is appended as the final entry.

use std::io::{self, IsTerminal, Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{debug, trace, warn};

use crate::error::{Error, Result};
use crate::monitor::{Observer, SharedSink, StreamMonitor};
use crate::timeline::{
    ProcessExitEvent, Recording, Stream, StreamWriteEvent, TimelineEntry, TimelineEvent,
};
use crate::utils::cancel::POLL_INTERVAL;
use crate::utils::{kill_tree, CancelToken, ProcessGuard, WaitOutcome};

// ============================================================================
// LiveTimeline
// ============================================================================

/// Append-only timeline shared by the stream observers of one run.
///
/// Offsets are measured from construction on a monotonic clock. The clock is
/// read while the entry lock is held, so the order of entries always matches
/// the order of their offsets even with several writers.
#[derive(Debug)]
pub struct LiveTimeline {
    start: Instant,
    open: AtomicBool,
    entries: Mutex<Vec<TimelineEntry>>,
}

impl Default for LiveTimeline {
    fn default() -> Self {
        Self::new()
    }
}

impl LiveTimeline {
    /// Start a timeline now. Stream observations are dropped until
    /// [`open_gate`](Self::open_gate) is called.
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            open: AtomicBool::new(false),
            entries: Mutex::new(Vec::new()),
        }
    }

    /// Begin accepting stream observations.
    pub fn open_gate(&self) {
        self.open.store(true, Ordering::SeqCst);
    }

    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }

    /// Time elapsed since the timeline started.
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Append `event` stamped with the current offset.
    pub fn record(&self, event: impl Into<TimelineEvent>) {
        let event = event.into();
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let offset = self.start.elapsed();
        entries.push(TimelineEntry::new(offset, event));
    }

    /// Record bytes seen on `stream`, unless the gate is still closed.
    pub fn observe(&self, stream: Stream, data: Vec<u8>) {
        if !self.is_open() {
            trace!(stream = %stream, bytes = data.len(), "Dropping output observed before start");
            return;
        }
        trace!(stream = %stream, bytes = data.len(), "Captured chunk");
        self.record(StreamWriteEvent::new(stream, data));
    }

    /// Observer that feeds `stream` chunks into this timeline.
    pub fn observer(self: &Arc<Self>, stream: Stream) -> Observer {
        let timeline = Arc::clone(self);
        Arc::new(move |data| timeline.observe(stream, data))
    }

    /// Monitor for `stream`, optionally passing bytes through to `destination`.
    pub fn monitor(
        self: &Arc<Self>,
        stream: Stream,
        destination: Option<Box<dyn Write + Send>>,
    ) -> StreamMonitor {
        StreamMonitor::new(destination, self.observer(stream))
    }

    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy of the entries recorded so far.
    pub fn snapshot(&self) -> Vec<TimelineEntry> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Remove and return every recorded entry.
    pub fn take_entries(&self) -> Vec<TimelineEntry> {
        std::mem::take(&mut *self.entries.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

// ============================================================================
// Recorder
// ============================================================================

/// Where the recorded child's stdin comes from. Never captured.
#[derive(Default)]
pub enum StdinSource {
    /// The child reads end-of-file immediately.
    #[default]
    Null,
    /// The child shares this process's stdin.
    Inherit,
    /// Bytes are copied from the reader by a background thread. A reader is
    /// consumed by the first run; later runs fall back to [`StdinSource::Null`].
    ///
    /// The copy thread is detached and `run` never waits for it. A reader
    /// that blocks keeps that thread alive until the reader returns; the
    /// thread ends at its next write once the child has exited.
    Reader(Box<dyn Read + Send>),
}

impl std::fmt::Debug for StdinSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StdinSource::Null => f.write_str("Null"),
            StdinSource::Inherit => f.write_str("Inherit"),
            StdinSource::Reader(_) => f.write_str("Reader(..)"),
        }
    }
}

/// Records one command invocation into a [`Recording`].
///
/// # Example
///
/// ```no_run
/// use cmdmock::{Recorder, SharedSink};
///
/// let recording = Recorder::new("git", ["status", "--short"])
///     .stdout(SharedSink::stdout())
///     .run()?;
/// println!("exit code {:?}", recording.exit_code());
/// # Ok::<(), cmdmock::Error>(())
/// ```
#[derive(Debug)]
pub struct Recorder {
    program: String,
    args: Vec<String>,
    current_dir: Option<PathBuf>,
    stdout: Option<SharedSink>,
    stderr: Option<SharedSink>,
    stdin: StdinSource,
    cancel: CancelToken,
}

impl Recorder {
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
            current_dir: None,
            stdout: None,
            stderr: None,
            stdin: StdinSource::Null,
            cancel: CancelToken::new(),
        }
    }

    /// Pass the child's stdout through to `sink` while recording.
    pub fn stdout(mut self, sink: SharedSink) -> Self {
        self.stdout = Some(sink);
        self
    }

    /// Pass the child's stderr through to `sink` while recording.
    pub fn stderr(mut self, sink: SharedSink) -> Self {
        self.stderr = Some(sink);
        self
    }

    pub fn stdin(mut self, source: StdinSource) -> Self {
        self.stdin = source;
        self
    }

    pub fn current_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.current_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    /// Token that aborts [`run`](Self::run) and kills the child when cancelled.
    pub fn cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Run the command to completion and return what it did.
    ///
    /// Every run starts a fresh timeline. A non-zero exit code is recorded,
    /// not reported as an error.
    ///
    /// # Errors
    ///
    /// - [`Error::Launch`] if the command cannot be started
    /// - [`Error::Io`] if passthrough output or the wait fails
    /// - [`Error::Cancelled`] if the cancel token fired; the child is killed
    pub fn run(&mut self) -> Result<Recording> {
        let timeline = Arc::new(LiveTimeline::new());

        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = &self.current_dir {
            command.current_dir(dir);
        }

        let mut reads_terminal = false;
        let stdin_reader = match std::mem::take(&mut self.stdin) {
            StdinSource::Null => {
                command.stdin(Stdio::null());
                None
            }
            StdinSource::Inherit => {
                command.stdin(Stdio::inherit());
                self.stdin = StdinSource::Inherit;
                reads_terminal = io::stdin().is_terminal();
                None
            }
            StdinSource::Reader(reader) => {
                command.stdin(Stdio::piped());
                Some(reader)
            }
        };

        // A private process group lets cancellation reach grandchildren that
        // hold the output pipes. A child reading the terminal must stay in the
        // foreground group or it is stopped by SIGTTIN; there the terminal
        // delivers Ctrl-C to the whole group instead.
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            if !reads_terminal {
                command.process_group(0);
            }
        }
        #[cfg(not(unix))]
        let _ = reads_terminal;

        debug!(program = %self.program, args = ?self.args, "Spawning recorded command");
        let mut child = command.spawn().map_err(|source| Error::Launch {
            program: self.program.clone(),
            source,
        })?;
        timeline.open_gate();

        if let (Some(mut reader), Some(mut child_stdin)) = (stdin_reader, child.stdin.take()) {
            // Detached: the source may block forever and the child may never read.
            thread::spawn(move || {
                if let Err(e) = io::copy(&mut reader, &mut child_stdin) {
                    debug!(error = %e, "Stdin passthrough stopped");
                }
            });
        }

        let stdout_copier = child.stdout.take().map(|pipe| {
            let monitor = timeline.monitor(Stream::Stdout, boxed(self.stdout.clone()));
            spawn_copier(Stream::Stdout, pipe, monitor)
        });
        let stderr_copier = child.stderr.take().map(|pipe| {
            let monitor = timeline.monitor(Stream::Stderr, boxed(self.stderr.clone()));
            spawn_copier(Stream::Stderr, pipe, monitor)
        });

        let guard = ProcessGuard::new(self.cancel.clone());
        let waited = guard.wait_or_kill(&mut child);
        if waited.is_err() {
            kill_tree(&mut child);
            let _ = child.wait();
        }

        // After an abort, a process outside the killed group may still hold a
        // pipe open; its copier is detached once the grace period runs out.
        let deadline = match waited {
            Ok(WaitOutcome::Exited(_)) => None,
            _ => Some(Instant::now() + ABORT_GRACE),
        };
        let stdout_result = join_copier(Stream::Stdout, stdout_copier, deadline);
        let stderr_result = join_copier(Stream::Stderr, stderr_copier, deadline);

        let status = match waited {
            Ok(WaitOutcome::Exited(status)) => status,
            Ok(WaitOutcome::Killed(status)) => {
                debug!(program = %self.program, ?status, "Recording cancelled, child killed");
                return Err(Error::Cancelled);
            }
            Err(e) => return Err(Error::io("waiting for the recorded command", e)),
        };
        stdout_result?;
        stderr_result?;

        let exit_code = exit_code(status);
        timeline.record(ProcessExitEvent { exit_code });
        debug!(
            program = %self.program,
            exit_code,
            entries = timeline.len(),
            elapsed_ms = timeline.elapsed().as_millis() as u64,
            "Recorded command finished"
        );

        Ok(Recording::new(
            resolve_program(&self.program),
            self.args.clone(),
            timeline.take_entries(),
        ))
    }
}

/// Record `program` with `args` without passthrough. Shorthand for
/// `Recorder::new(program, args).run()`.
pub fn record<I, S>(program: &str, args: I) -> Result<Recording>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    Recorder::new(program, args).run()
}

fn boxed(sink: Option<SharedSink>) -> Option<Box<dyn Write + Send>> {
    sink.map(|sink| Box::new(sink) as Box<dyn Write + Send>)
}

type Copier = JoinHandle<io::Result<u64>>;

fn spawn_copier<R>(stream: Stream, mut pipe: R, mut monitor: StreamMonitor) -> Copier
where
    R: Read + Send + 'static,
{
    thread::spawn(move || match io::copy(&mut pipe, &mut monitor) {
        Ok(copied) => Ok(copied),
        Err(e) => {
            // Keep draining so the child never blocks on a full pipe.
            warn!(stream = %stream, error = %e, "Passthrough failed, draining remaining output");
            let _ = io::copy(&mut pipe, &mut io::sink());
            Err(e)
        }
    })
}

/// How long copiers may keep draining after the child was killed.
const ABORT_GRACE: Duration = Duration::from_millis(500);

fn join_copier(stream: Stream, copier: Option<Copier>, deadline: Option<Instant>) -> Result<()> {
    let Some(copier) = copier else {
        return Ok(());
    };
    if let Some(deadline) = deadline {
        while !copier.is_finished() {
            if Instant::now() >= deadline {
                warn!(stream = %stream, "Output pipe still open after abort, detaching copier");
                return Ok(());
            }
            thread::sleep(POLL_INTERVAL);
        }
    }
    let operation = format!("forwarding {}", stream);
    match copier.join() {
        Ok(Ok(copied)) => {
            trace!(stream = %stream, copied, "Copier finished");
            Ok(())
        }
        Ok(Err(e)) => Err(Error::io(operation, e)),
        Err(_) => Err(Error::io(
            operation,
            io::Error::new(io::ErrorKind::Other, "copier thread panicked"),
        )),
    }
}

/// Exit code to record for `status`.
///
/// A child killed by a signal records `128 + signal` on Unix, as shells report
/// it. Without either piece of information the code is `-1`.
pub fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }
    -1
}

/// Resolve `program` the way the OS will when spawning it.
///
/// Names containing a path separator are returned as given; bare names are
/// looked up on `PATH`. If nothing matches, the name itself is returned.
pub fn resolve_program(program: &str) -> String {
    if Path::new(program).components().count() > 1 {
        return program.to_string();
    }
    std::env::var_os("PATH")
        .and_then(|paths| {
            std::env::split_paths(&paths)
                .map(|dir| dir.join(program))
                .find(|candidate| is_executable(candidate))
        })
        .map(|found| found.to_string_lossy().into_owned())
        .unwrap_or_else(|| program.to_string())
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file() || path.with_extension("exe").is_file()
}
