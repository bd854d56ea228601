//! cmdmock: record a command's output and exit code, replay it later.
//!
//! A [`Recorder`] runs a command, capturing every chunk written to stdout
//! and stderr with its offset from launch, plus the exit code. The result is
//! a [`Recording`], stored as JSON by a [`RecordingStore`]. A [`Replayer`]
//! reproduces the output with the original timing and reports the exit code,
//! which lets a recording stand in for the real command in tests.

pub mod cli;
pub mod config;
pub mod error;
pub mod monitor;
pub mod recorder;
pub mod replayer;
pub mod storage;
pub mod timeline;
pub mod utils;

pub use config::Config;
pub use error::{Error, Result};
pub use monitor::{Observer, SharedSink, StreamMonitor};
pub use recorder::{record, LiveTimeline, Recorder, StdinSource};
pub use replayer::{replay, replay_with, Action, Pacing, ReplayOutcome, Replayer};
pub use storage::RecordingStore;
pub use timeline::{
    decode_as, DecodeFn, EventRegistry, ProcessExitEvent, Recording, Stream, StreamCloseEvent,
    StreamWriteEvent, TimelineEntry, TimelineEvent,
};
pub use utils::{CancelToken, ProcessGuard, WaitOutcome};
