//! Type definitions for recordings and their timelines.
//!
//! A [`Recording`] names the command that was captured and holds the ordered
//! [`TimelineEntry`] list observed while it ran. Every entry pairs an offset
//! from the start of the capture with one [`TimelineEvent`].
//!
//! # Format
//!
//! ```text
//! {
//!  "Path": "/usr/bin/printf",
//!  "Args": ["hi"],
//!  "Timeline": [
//!   {"Type": "stream-write", "TimeOffset": 1250000, "Event": {"Stream": 1, "Data": "aGk="}},
//!   {"Type": "process-exit", "TimeOffset": 1830000, "Event": {"ExitCode": 0}}
//!  ]
//! }
//! ```
//!
//! `TimeOffset` is an integer count of nanoseconds and `Data` is standard
//! (padded) base64.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

// ============================================================================
// Streams
// ============================================================================

/// Standard stream identity, serialized as its file descriptor number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Stream {
    Stdin,
    Stdout,
    Stderr,
}

impl Stream {
    /// Name used in log output.
    pub fn as_str(&self) -> &'static str {
        match self {
            Stream::Stdin => "stdin",
            Stream::Stdout => "stdout",
            Stream::Stderr => "stderr",
        }
    }
}

impl fmt::Display for Stream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Stream> for u8 {
    fn from(stream: Stream) -> Self {
        match stream {
            Stream::Stdin => 0,
            Stream::Stdout => 1,
            Stream::Stderr => 2,
        }
    }
}

impl TryFrom<u8> for Stream {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Stream::Stdin),
            1 => Ok(Stream::Stdout),
            2 => Ok(Stream::Stderr),
            other => Err(format!("invalid stream number {}", other)),
        }
    }
}

// ============================================================================
// Event payloads
// ============================================================================

/// Bytes observed in a single write to a captured stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamWriteEvent {
    #[serde(rename = "Stream")]
    pub stream: Stream,

    #[serde(rename = "Data", with = "base64_bytes")]
    pub data: Vec<u8>,
}

impl StreamWriteEvent {
    pub const TYPE: &'static str = "stream-write";

    pub fn new(stream: Stream, data: impl Into<Vec<u8>>) -> Self {
        Self {
            stream,
            data: data.into(),
        }
    }
}

/// A captured stream reached end of output. Replaying it does nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamCloseEvent {}

impl StreamCloseEvent {
    pub const TYPE: &'static str = "stream-close";
}

/// The recorded process terminated with `exit_code`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessExitEvent {
    #[serde(rename = "ExitCode")]
    pub exit_code: i32,
}

impl ProcessExitEvent {
    pub const TYPE: &'static str = "process-exit";
}

/// One observed occurrence in a timeline.
///
/// Serialized without a tag: the discriminator lives on the owning
/// [`TimelineEntry`], and decoding goes through
/// [`EventRegistry`](super::EventRegistry).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum TimelineEvent {
    StreamWrite(StreamWriteEvent),
    StreamClose(StreamCloseEvent),
    ProcessExit(ProcessExitEvent),
}

impl TimelineEvent {
    /// Stable discriminator written next to the payload.
    pub fn event_type(&self) -> &'static str {
        match self {
            TimelineEvent::StreamWrite(_) => StreamWriteEvent::TYPE,
            TimelineEvent::StreamClose(_) => StreamCloseEvent::TYPE,
            TimelineEvent::ProcessExit(_) => ProcessExitEvent::TYPE,
        }
    }

    pub fn is_exit(&self) -> bool {
        matches!(self, TimelineEvent::ProcessExit(_))
    }
}

impl From<StreamWriteEvent> for TimelineEvent {
    fn from(event: StreamWriteEvent) -> Self {
        TimelineEvent::StreamWrite(event)
    }
}

impl From<StreamCloseEvent> for TimelineEvent {
    fn from(event: StreamCloseEvent) -> Self {
        TimelineEvent::StreamClose(event)
    }
}

impl From<ProcessExitEvent> for TimelineEvent {
    fn from(event: ProcessExitEvent) -> Self {
        TimelineEvent::ProcessExit(event)
    }
}

// ============================================================================
// Entries and recordings
// ============================================================================

/// An event stamped with its offset from the start of the capture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimelineEntry {
    #[serde(rename = "Type")]
    pub event_type: String,

    #[serde(rename = "TimeOffset", with = "duration_nanos")]
    pub time_offset: Duration,

    #[serde(rename = "Event")]
    pub event: TimelineEvent,
}

impl TimelineEntry {
    /// Build an entry whose discriminator matches `event`.
    pub fn new(time_offset: Duration, event: impl Into<TimelineEvent>) -> Self {
        let event = event.into();
        Self {
            event_type: event.event_type().to_string(),
            time_offset,
            event,
        }
    }
}

/// A captured command invocation.
///
/// Built once when recording finishes and never mutated afterwards. The
/// timeline is ordered by observation time and, for recordings produced by
/// [`Recorder`](crate::Recorder), always ends with a [`ProcessExitEvent`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Recording {
    /// Resolved executable path of the original command. Informational only.
    #[serde(rename = "Path")]
    pub path: String,

    /// Arguments passed to the original command, without the program name.
    #[serde(rename = "Args")]
    pub args: Vec<String>,

    #[serde(rename = "Timeline")]
    pub timeline: Vec<TimelineEntry>,
}

impl Recording {
    pub fn new(path: impl Into<String>, args: Vec<String>, timeline: Vec<TimelineEntry>) -> Self {
        Self {
            path: path.into(),
            args,
            timeline,
        }
    }

    /// Exit code carried by the final entry, if the timeline ends with one.
    pub fn exit_code(&self) -> Option<i32> {
        match self.timeline.last().map(|entry| &entry.event) {
            Some(TimelineEvent::ProcessExit(exit)) => Some(exit.exit_code),
            _ => None,
        }
    }

    /// Offset of the last entry, i.e. how long the capture ran.
    pub fn duration(&self) -> Duration {
        self.timeline
            .last()
            .map(|entry| entry.time_offset)
            .unwrap_or_default()
    }

    /// All bytes written to `stream`, concatenated in timeline order.
    pub fn output(&self, stream: Stream) -> Vec<u8> {
        self.timeline
            .iter()
            .filter_map(|entry| match &entry.event {
                TimelineEvent::StreamWrite(write) if write.stream == stream => {
                    Some(write.data.as_slice())
                }
                _ => None,
            })
            .flatten()
            .copied()
            .collect()
    }
}

// ============================================================================
// Serde helpers
// ============================================================================

mod base64_bytes {
    use base64::{engine::general_purpose, Engine as _};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&general_purpose::STANDARD.encode(bytes))
    }

    // A `null` payload is what an empty byte slice looked like in older files.
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = Option::<String>::deserialize(deserializer)?;
        match encoded {
            Some(text) => general_purpose::STANDARD
                .decode(text.as_bytes())
                .map_err(serde::de::Error::custom),
            None => Ok(Vec::new()),
        }
    }
}

mod duration_nanos {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        let nanos = u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX);
        serializer.serialize_u64(nanos)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_nanos)
    }
}
