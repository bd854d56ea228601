//! Recording writer
//!
//! Renders recordings as JSON. The pretty form indents with a single space,
//! which is the layout recording files have always been stored in.

use std::io::Write;

use serde::Serialize;
use serde_json::ser::PrettyFormatter;

use super::types::Recording;
use crate::error::{Error, Result};

impl Recording {
    /// Compact single-line JSON.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(Error::Encode)
    }

    /// Indented JSON, as stored on disk.
    pub fn to_json_pretty(&self) -> Result<String> {
        let mut buffer = Vec::new();
        self.write_pretty(&mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }

    /// Write indented JSON to `writer`.
    pub fn write_pretty<W: Write>(&self, writer: W) -> Result<()> {
        let mut serializer =
            serde_json::Serializer::with_formatter(writer, PrettyFormatter::with_indent(b" "));
        self.serialize(&mut serializer)
            .map_err(|e| Error::from_json("writing recording", e, false))
    }
}
