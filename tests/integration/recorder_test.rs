//! Integration tests for recording real child processes

use std::io::{self, Cursor, Read};
use std::thread;
use std::time::{Duration, Instant};

use cmdmock::{record, CancelToken, Error, Recorder, SharedSink, StdinSource, Stream};
use tempfile::TempDir;

use crate::helpers::{sh, BrokenPipe, Collector};

fn assert_well_formed(recording: &cmdmock::Recording) {
    let timeline = &recording.timeline;
    assert!(!timeline.is_empty());
    assert!(timeline
        .windows(2)
        .all(|pair| pair[0].time_offset <= pair[1].time_offset));
    assert_eq!(
        timeline.iter().filter(|entry| entry.event.is_exit()).count(),
        1
    );
    assert!(timeline.last().unwrap().event.is_exit());
}

// ============================================================================
// Capture
// ============================================================================

#[test]
fn captures_both_streams_and_exit_code() {
    let recording = sh("printf out; printf err >&2; exit 3").run().unwrap();

    assert_eq!(recording.output(Stream::Stdout), b"out");
    assert_eq!(recording.output(Stream::Stderr), b"err");
    assert_eq!(recording.exit_code(), Some(3));
    assert_well_formed(&recording);
}

#[test]
fn silent_command_records_only_exit() {
    let recording = record("true", Vec::<String>::new()).unwrap();
    assert_eq!(recording.timeline.len(), 1);
    assert_eq!(recording.exit_code(), Some(0));
}

#[test]
fn failing_command_is_not_an_error() {
    let recording = record("false", Vec::<String>::new()).unwrap();
    assert_eq!(recording.exit_code(), Some(1));
}

#[test]
fn path_is_resolved_and_args_exclude_program() {
    let recording = record("sh", ["-c", "exit 0"]).unwrap();
    assert!(recording.path.ends_with("/sh"), "path was {}", recording.path);
    assert!(std::path::Path::new(&recording.path).is_absolute());
    assert_eq!(recording.args, vec!["-c", "exit 0"]);
}

#[test]
fn gaps_between_writes_are_preserved() {
    let recording = sh("printf a; sleep 0.2; printf b").run().unwrap();

    let writes: Vec<_> = recording
        .timeline
        .iter()
        .filter(|entry| !entry.event.is_exit())
        .collect();
    assert_eq!(writes.len(), 2);
    let gap = writes[1].time_offset - writes[0].time_offset;
    assert!(gap >= Duration::from_millis(150), "gap was {:?}", gap);
    assert!(recording.duration() >= Duration::from_millis(200));
}

#[test]
fn killed_by_signal_records_shell_style_code() {
    let recording = sh("kill -9 $$").run().unwrap();
    assert_eq!(recording.exit_code(), Some(128 + 9));
}

// ============================================================================
// Launch failures
// ============================================================================

#[test]
fn missing_program_fails_to_launch() {
    let err = record("/nonexistent/cmdmock-missing-program", Vec::<String>::new()).unwrap_err();
    match err {
        Error::Launch { program, .. } => {
            assert_eq!(program, "/nonexistent/cmdmock-missing-program")
        }
        other => panic!("expected launch error, got {:?}", other),
    }
}

// ============================================================================
// Passthrough, stdin and working directory
// ============================================================================

#[test]
fn passthrough_forwards_output_while_recording() {
    let out = Collector::default();
    let err = Collector::default();
    let recording = sh("echo visible; echo warning >&2")
        .stdout(SharedSink::new(out.clone()))
        .stderr(SharedSink::new(err.clone()))
        .run()
        .unwrap();

    assert_eq!(out.contents(), b"visible\n");
    assert_eq!(err.contents(), b"warning\n");
    assert_eq!(recording.output(Stream::Stdout), out.contents());
}

#[test]
fn failing_passthrough_is_io_error() {
    let result = sh("echo hi").stdout(SharedSink::new(BrokenPipe)).run();
    match result {
        Err(Error::Io { operation, .. }) => assert!(operation.contains("stdout"), "{}", operation),
        other => panic!("expected I/O error, got {:?}", other),
    }
}

#[test]
fn stdin_reader_is_fed_but_not_recorded() {
    let recording = Recorder::new("cat", Vec::<String>::new())
        .stdin(StdinSource::Reader(Box::new(Cursor::new(b"piped\n".to_vec()))))
        .run()
        .unwrap();

    assert_eq!(recording.output(Stream::Stdout), b"piped\n");
    assert!(recording.output(Stream::Stdin).is_empty());
}

/// Reader that never produces data.
struct Stalled;

impl Read for Stalled {
    fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
        loop {
            thread::sleep(Duration::from_secs(60));
        }
    }
}

#[test]
fn blocked_stdin_reader_does_not_hold_up_run() {
    let start = Instant::now();
    let recording = Recorder::new("true", Vec::<String>::new())
        .stdin(StdinSource::Reader(Box::new(Stalled)))
        .run()
        .unwrap();

    assert_eq!(recording.exit_code(), Some(0));
    assert!(start.elapsed() < Duration::from_secs(5));
}

#[test]
fn current_dir_is_applied() {
    let temp_dir = TempDir::new().unwrap();
    let expected = std::fs::canonicalize(temp_dir.path()).unwrap();

    let recording = Recorder::new("pwd", ["-P"])
        .current_dir(temp_dir.path())
        .run()
        .unwrap();

    let printed = String::from_utf8(recording.output(Stream::Stdout)).unwrap();
    assert_eq!(printed.trim_end(), expected.to_string_lossy());
}

// ============================================================================
// Lifecycle
// ============================================================================

#[test]
fn each_run_starts_a_fresh_timeline() {
    let mut recorder = sh("echo again");
    let first = recorder.run().unwrap();
    let second = recorder.run().unwrap();

    assert_eq!(first.timeline.len(), second.timeline.len());
    assert_eq!(second.output(Stream::Stdout), b"again\n");
    assert_eq!(second.exit_code(), Some(0));
}

#[test]
fn cancellation_kills_the_child() {
    let token = CancelToken::new();
    let remote = token.clone();
    let canceller = thread::spawn(move || {
        thread::sleep(Duration::from_millis(100));
        remote.cancel();
    });

    let start = Instant::now();
    let result = Recorder::new("sleep", ["5"]).cancel_token(token).run();
    canceller.join().unwrap();

    assert!(matches!(result, Err(Error::Cancelled)));
    assert!(start.elapsed() < Duration::from_secs(4));
}

/// Whether `pid` is a live, non-zombie process.
#[cfg(target_os = "linux")]
fn is_running(pid: &str) -> bool {
    match std::fs::read_to_string(format!("/proc/{}/stat", pid)) {
        // The state follows the parenthesised command name.
        Ok(stat) => stat
            .rsplit(')')
            .next()
            .map(|rest| !rest.trim_start().starts_with('Z'))
            .unwrap_or(false),
        Err(_) => false,
    }
}

#[test]
fn cancellation_reaches_background_grandchildren() {
    let temp_dir = TempDir::new().unwrap();
    let pid_file = temp_dir.path().join("grandchild.pid");
    let script = format!("sleep 30 & echo $! > '{}'; wait", pid_file.display());

    let token = CancelToken::new();
    let remote = token.clone();
    let canceller = thread::spawn(move || {
        thread::sleep(Duration::from_millis(200));
        remote.cancel();
    });

    let start = Instant::now();
    let result = sh(&script).cancel_token(token).run();
    canceller.join().unwrap();

    assert!(matches!(result, Err(Error::Cancelled)));
    assert!(start.elapsed() < Duration::from_secs(3), "took {:?}", start.elapsed());

    #[cfg(target_os = "linux")]
    {
        let pid = std::fs::read_to_string(&pid_file).unwrap();
        let pid = pid.trim();
        let deadline = Instant::now() + Duration::from_secs(2);
        while is_running(pid) && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(20));
        }
        assert!(!is_running(pid), "background sleep {} survived cancellation", pid);
    }
}
