//! Recording parser.
//!
//! Decoding happens in two phases: the document and each entry envelope are
//! decoded with the payload left as raw JSON, then each payload is handed to
//! the [`EventRegistry`] under the entry's discriminator. Any failure rejects
//! the whole document.

use std::fs;
use std::io::{BufReader, Read};
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;

use super::registry::EventRegistry;
use super::types::{Recording, TimelineEntry};
use crate::error::{Error, Result};

#[derive(Debug, Deserialize)]
struct RawRecording {
    #[serde(rename = "Path", default)]
    path: String,
    #[serde(rename = "Args", default)]
    args: Option<Vec<String>>,
    #[serde(rename = "Timeline", default)]
    timeline: Option<Vec<RawTimelineEntry>>,
}

#[derive(Debug, Deserialize)]
struct RawTimelineEntry {
    #[serde(rename = "Type")]
    event_type: String,
    #[serde(rename = "TimeOffset")]
    time_offset: u64,
    #[serde(rename = "Event", default)]
    event: Value,
}

impl RawTimelineEntry {
    fn decode(self, registry: &EventRegistry) -> Result<TimelineEntry> {
        let event = registry.decode(&self.event_type, self.event)?;
        Ok(TimelineEntry {
            event_type: self.event_type,
            time_offset: Duration::from_nanos(self.time_offset),
            event,
        })
    }
}

impl RawRecording {
    fn decode(self, registry: &EventRegistry) -> Result<Recording> {
        let timeline = self
            .timeline
            .unwrap_or_default()
            .into_iter()
            .map(|entry| entry.decode(registry))
            .collect::<Result<Vec<_>>>()?;

        Ok(Recording {
            path: self.path,
            args: self.args.unwrap_or_default(),
            timeline,
        })
    }
}

impl Recording {
    /// Parse a recording from a JSON string.
    ///
    /// # Errors
    ///
    /// - [`Error::Decode`] if the JSON is malformed or a payload does not match
    ///   its discriminator
    /// - [`Error::UnknownEventType`] if an entry names an unregistered type
    pub fn from_json_str(content: &str, registry: &EventRegistry) -> Result<Self> {
        let raw: RawRecording = serde_json::from_str(content)?;
        raw.decode(registry)
    }

    /// Parse a recording from any reader.
    pub fn from_reader<R: Read>(reader: R, registry: &EventRegistry) -> Result<Self> {
        let raw: RawRecording = serde_json::from_reader(reader)
            .map_err(|e| Error::from_json("reading recording", e, true))?;
        raw.decode(registry)
    }

    /// Parse a recording file.
    pub fn from_path<P: AsRef<Path>>(path: P, registry: &EventRegistry) -> Result<Self> {
        let path = path.as_ref();
        let file = fs::File::open(path)
            .map_err(|e| Error::io(format!("opening {}", path.display()), e))?;
        Self::from_reader(BufReader::new(file), registry)
    }
}
