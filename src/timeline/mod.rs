//! Timeline data model and its JSON form.
//!
//! # Structure
//!
//! - `types` - recordings, entries and the event variants
//! - `registry` - discriminator to decoder mapping used when parsing
//! - `reader` - two-phase parsing of recording documents
//! - `writer` - compact and pretty JSON rendering

mod reader;
pub mod registry;
mod types;
mod writer;

pub use registry::{decode_as, DecodeFn, EventRegistry};
pub use types::{
    ProcessExitEvent, Recording, Stream, StreamCloseEvent, StreamWriteEvent, TimelineEntry,
    TimelineEvent,
};
