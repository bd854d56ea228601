//! Process lifecycle guard for recorded child processes.
//!
//! Detects termination conditions and ensures clean shutdown:
//! - Cancellation of the guard's [`CancelToken`] (by the caller or a signal)
//! - SIGINT (Ctrl+C) via ctrlc handler, once registered
//! - SIGHUP (terminal hangup) via signal_hook, once registered
//! - Parent process death (terminal force-closed, reparented to init/subreaper)
//!
//! The orphan detection uses parent PID comparison rather than checking for PID 1,
//! which works correctly on Linux with systemd subreapers and on macOS with launchd.

use std::io;
use std::process::{Child, ExitStatus};

use super::cancel::{CancelToken, POLL_INTERVAL};

/// How a guarded wait ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    /// The child exited on its own.
    Exited(ExitStatus),
    /// The guard killed the child; the status is the one reaped afterwards.
    Killed(ExitStatus),
}

/// Guards a child process against outliving a cancelled operation.
///
/// Create before spawning, optionally register signals, then use `wait_or_kill`
/// instead of `.wait()`.
#[derive(Debug, Clone)]
pub struct ProcessGuard {
    token: CancelToken,
    #[cfg(unix)]
    initial_ppid: u32,
}

impl Default for ProcessGuard {
    fn default() -> Self {
        Self::new(CancelToken::new())
    }
}

impl ProcessGuard {
    /// Snapshot the current parent PID for later orphan detection.
    pub fn new(token: CancelToken) -> Self {
        Self {
            token,
            #[cfg(unix)]
            initial_ppid: unsafe { libc::getppid() as u32 },
        }
    }

    pub fn token(&self) -> &CancelToken {
        &self.token
    }

    /// Register SIGINT (Ctrl+C) and SIGHUP (terminal hangup) handlers.
    ///
    /// Both cancel the guard's token. Safe to call multiple times; duplicate
    /// registrations are ignored.
    pub fn register_signal_handlers(&self) {
        let token = self.token.clone();
        ctrlc::set_handler(move || {
            token.cancel();
        })
        .ok(); // Ignore if handler already set

        #[cfg(unix)]
        {
            use signal_hook::flag::register;
            let _ = register(libc::SIGHUP, self.token.flag());
        }
    }

    /// Whether the token was cancelled (by the caller, SIGINT or SIGHUP).
    pub fn is_interrupted(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Wait for a child process, killing it on cancellation or orphan detection.
    ///
    /// Polls every [`POLL_INTERVAL`]. A killed child is always reaped before
    /// returning so no zombie is left behind. When the child leads its own
    /// process group, the whole group is killed with it.
    pub fn wait_or_kill(&self, child: &mut Child) -> io::Result<WaitOutcome> {
        loop {
            if let Some(status) = child.try_wait()? {
                return Ok(WaitOutcome::Exited(status));
            }
            if self.should_terminate() {
                kill_tree(child);
                return child.wait().map(WaitOutcome::Killed);
            }
            std::thread::sleep(POLL_INTERVAL);
        }
    }

    /// Check all termination conditions: cancellation or parent death.
    fn should_terminate(&self) -> bool {
        self.token.is_cancelled() || self.is_orphaned()
    }

    /// Detect parent death by comparing current ppid against the initial snapshot.
    #[cfg(unix)]
    fn is_orphaned(&self) -> bool {
        let current_ppid = unsafe { libc::getppid() as u32 };
        current_ppid != self.initial_ppid
    }

    #[cfg(not(unix))]
    fn is_orphaned(&self) -> bool {
        false
    }
}

/// Kill `child` and, if it leads a process group, every process in that group.
///
/// A group id equal to the child's pid can only belong to the child's own
/// group while the child is unreaped, so `killpg` never reaches strangers.
/// It fails with `ESRCH` when the child shares its parent's group.
pub fn kill_tree(child: &mut Child) {
    #[cfg(unix)]
    {
        let pgid = child.id() as libc::pid_t;
        // SAFETY: killpg has no memory-safety preconditions.
        let _ = unsafe { libc::killpg(pgid, libc::SIGKILL) };
    }
    let _ = child.kill();
}
