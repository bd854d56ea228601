//! Error type shared by the recording, replay and storage layers.

use std::io;
use std::path::PathBuf;

/// Convenience alias used throughout the library.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors surfaced by the library.
///
/// A non-zero exit code from a recorded command is never an error; it is
/// captured as a `ProcessExitEvent`.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The command could not be started at all (not found, not executable, ...).
    #[error("Failed to launch '{program}': {source}")]
    Launch {
        program: String,
        #[source]
        source: io::Error,
    },

    /// Reading or writing a stream or file failed.
    #[error("I/O error while {operation}: {source}")]
    Io {
        operation: String,
        #[source]
        source: io::Error,
    },

    /// The recording document is not valid JSON or does not match the schema.
    #[error("Failed to decode recording: {0}")]
    Decode(#[from] serde_json::Error),

    /// The recording could not be rendered as JSON.
    #[error("Failed to encode recording: {0}")]
    Encode(#[source] serde_json::Error),

    /// A timeline entry carries a discriminator missing from the registry.
    #[error("Unexpected event type '{0}'")]
    UnknownEventType(String),

    /// A discriminator was registered twice.
    #[error("Event type '{0}' is already registered")]
    DuplicateEventType(String),

    /// A recording already exists and overwriting was not requested.
    #[error("A recording already exists at {}", path.display())]
    AlreadyExists { path: PathBuf },

    /// The operation was aborted through its cancel token.
    #[error("Operation cancelled")]
    Cancelled,
}

impl Error {
    /// Wrap an I/O error with a short description of what was being done.
    pub fn io(operation: impl Into<String>, source: io::Error) -> Self {
        Error::Io {
            operation: operation.into(),
            source,
        }
    }

    /// Split a serde_json failure into the I/O part and the format part.
    pub(crate) fn from_json(operation: &str, err: serde_json::Error, decoding: bool) -> Self {
        if err.is_io() {
            Error::io(operation, err.into())
        } else if decoding {
            Error::Decode(err)
        } else {
            Error::Encode(err)
        }
    }
}
