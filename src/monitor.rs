//! Pass-through writers that report every write to an observer.

use std::fmt;
use std::io::{self, Write};
use std::sync::{Arc, Mutex, PoisonError};

/// Callback receiving a private copy of each chunk written to a monitor.
pub type Observer = Arc<dyn Fn(Vec<u8>) + Send + Sync>;

/// A byte sink that forwards writes to an optional destination and hands a
/// copy of every chunk to an observer.
///
/// Each call to `write` invokes the observer exactly once, before forwarding.
/// Without a destination the monitor is a silent sink that accepts everything.
pub struct StreamMonitor {
    destination: Option<Box<dyn Write + Send>>,
    observer: Observer,
}

impl StreamMonitor {
    /// Monitor with no destination.
    pub fn silent(observer: Observer) -> Self {
        Self {
            destination: None,
            observer,
        }
    }

    /// Monitor forwarding to `destination`.
    pub fn forwarding(destination: impl Write + Send + 'static, observer: Observer) -> Self {
        Self {
            destination: Some(Box::new(destination)),
            observer,
        }
    }

    pub fn new(destination: Option<Box<dyn Write + Send>>, observer: Observer) -> Self {
        Self {
            destination,
            observer,
        }
    }

    pub fn has_destination(&self) -> bool {
        self.destination.is_some()
    }
}

impl Write for StreamMonitor {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        (self.observer)(buf.to_vec());

        // A short write would make the caller retry the tail and the observer
        // would see those bytes twice, so the destination gets all or nothing.
        if let Some(destination) = self.destination.as_mut() {
            destination.write_all(buf)?;
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.destination.as_mut() {
            Some(destination) => destination.flush(),
            None => Ok(()),
        }
    }
}

impl fmt::Debug for StreamMonitor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamMonitor")
            .field("has_destination", &self.has_destination())
            .finish()
    }
}

/// Cloneable handle to a writer shared between threads and runs.
///
/// Writes lock the inner writer for the duration of one call, so chunks from
/// different clones never interleave.
#[derive(Clone)]
pub struct SharedSink {
    inner: Arc<Mutex<Box<dyn Write + Send>>>,
}

impl SharedSink {
    pub fn new(writer: impl Write + Send + 'static) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Box::new(writer))),
        }
    }

    /// Sink writing to this process's stdout.
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }

    /// Sink writing to this process's stderr.
    pub fn stderr() -> Self {
        Self::new(io::stderr())
    }
}

impl Write for SharedSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut writer = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        writer.write(buf)
    }

    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        let mut writer = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        writer.write_all(buf)?;
        writer.flush()
    }

    fn flush(&mut self) -> io::Result<()> {
        let mut writer = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        writer.flush()
    }
}

impl fmt::Debug for SharedSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedSink").finish_non_exhaustive()
    }
}
