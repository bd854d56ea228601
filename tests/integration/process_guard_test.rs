//! Integration tests for ProcessGuard

use std::process::Command;
use std::time::{Duration, Instant};

use cmdmock::{CancelToken, ProcessGuard, WaitOutcome};

#[test]
fn new_guard_is_not_interrupted() {
    let guard = ProcessGuard::default();
    assert!(!guard.is_interrupted());
}

#[test]
fn wait_or_kill_returns_when_child_exits() {
    let guard = ProcessGuard::default();
    let mut child = Command::new("true").spawn().expect("failed to spawn `true`");
    match guard.wait_or_kill(&mut child).unwrap() {
        WaitOutcome::Exited(status) => assert!(status.success()),
        other => panic!("unexpected outcome: {:?}", other),
    }
}

#[test]
fn wait_or_kill_returns_failure_status() {
    let guard = ProcessGuard::default();
    let mut child = Command::new("false").spawn().expect("failed to spawn `false`");
    match guard.wait_or_kill(&mut child).unwrap() {
        WaitOutcome::Exited(status) => assert!(!status.success()),
        other => panic!("unexpected outcome: {:?}", other),
    }
}

#[test]
fn cancelled_token_kills_child() {
    let token = CancelToken::new();
    let guard = ProcessGuard::new(token.clone());
    let mut child = Command::new("sleep").arg("5").spawn().expect("failed to spawn `sleep`");

    token.cancel();
    assert!(guard.is_interrupted());

    let start = Instant::now();
    let outcome = guard.wait_or_kill(&mut child).unwrap();
    assert!(matches!(outcome, WaitOutcome::Killed(_)));
    assert!(start.elapsed() < Duration::from_secs(4));
}
