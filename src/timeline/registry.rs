//! Discriminator registry used to decode timeline event payloads.
//!
//! The payload shape of a timeline entry depends on its `Type` field, so an
//! entry cannot be decoded in a single pass. The reader first decodes the
//! envelope, then asks an [`EventRegistry`] to turn the raw payload into the
//! concrete event named by the discriminator.
//!
//! The registry is an ordinary value built by the caller and passed to the
//! decoder; there is no process-wide table.

use std::collections::HashMap;
use std::fmt;

use serde::de::DeserializeOwned;
use serde_json::Value;

use super::types::{ProcessExitEvent, StreamCloseEvent, StreamWriteEvent, TimelineEvent};
use crate::error::{Error, Result};

/// Turns a raw JSON payload into a concrete event.
pub type DecodeFn = fn(Value) -> Result<TimelineEvent>;

/// Mapping from discriminator string to payload decoder.
#[derive(Clone)]
pub struct EventRegistry {
    decoders: HashMap<String, DecodeFn>,
}

impl EventRegistry {
    /// A registry that knows no event types.
    pub fn empty() -> Self {
        Self {
            decoders: HashMap::new(),
        }
    }

    /// Registry for every event type this crate produces.
    pub fn builtin() -> Self {
        let builtin: [(&str, DecodeFn); 3] = [
            (StreamWriteEvent::TYPE, decode_as::<StreamWriteEvent>),
            (StreamCloseEvent::TYPE, decode_as::<StreamCloseEvent>),
            (ProcessExitEvent::TYPE, decode_as::<ProcessExitEvent>),
        ];

        let decoders = builtin
            .into_iter()
            .map(|(event_type, decode)| (event_type.to_string(), decode))
            .collect();
        Self { decoders }
    }

    /// Add a decoder for `event_type`.
    ///
    /// Fails if the discriminator is already taken.
    pub fn register(&mut self, event_type: &str, decode: DecodeFn) -> Result<()> {
        if self.decoders.contains_key(event_type) {
            return Err(Error::DuplicateEventType(event_type.to_string()));
        }
        self.decoders.insert(event_type.to_string(), decode);
        Ok(())
    }

    pub fn contains(&self, event_type: &str) -> bool {
        self.decoders.contains_key(event_type)
    }

    /// Registered discriminators, sorted.
    pub fn event_types(&self) -> Vec<&str> {
        let mut types: Vec<&str> = self.decoders.keys().map(String::as_str).collect();
        types.sort_unstable();
        types
    }

    /// Decode `payload` as the event named by `event_type`.
    pub fn decode(&self, event_type: &str, payload: Value) -> Result<TimelineEvent> {
        let decode = self
            .decoders
            .get(event_type)
            .ok_or_else(|| Error::UnknownEventType(event_type.to_string()))?;
        decode(payload)
    }
}

impl Default for EventRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl fmt::Debug for EventRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventRegistry")
            .field("event_types", &self.event_types())
            .finish()
    }
}

/// Decode a payload into `T` and wrap it as a timeline event.
pub fn decode_as<T>(payload: Value) -> Result<TimelineEvent>
where
    T: DeserializeOwned + Into<TimelineEvent>,
{
    let event: T = serde_json::from_value(payload)?;
    Ok(event.into())
}
