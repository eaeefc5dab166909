//! Stream handles carried by a [`Context`](crate::Context).
//!
//! Handles are cheap to clone and share one underlying stream, so every layer
//! of a dispatch writes to the same output even though each layer receives
//! its own `Context` value.
//!
//! [`Capture`] is an in-memory writer for tests:
//!
//! ```
//! use cmdtree::{Capture, Context};
//!
//! let out = Capture::new();
//! let ctx = Context::builder().out(out.clone()).build();
//! ctx.println("hello");
//! assert_eq!(out.contents(), "hello\n");
//! ```

use std::fmt;
use std::io::{self, Read, Write};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Shared handle to an output or error stream.
#[derive(Clone)]
pub struct Writer {
    inner: Arc<Mutex<dyn Write + Send>>,
}

impl Writer {
    /// Wraps any writer.
    pub fn new<W>(writer: W) -> Self
    where
        W: Write + Send + 'static,
    {
        Self {
            inner: Arc::new(Mutex::new(writer)),
        }
    }

    /// Handle to the process standard output.
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }

    /// Handle to the process standard error.
    pub fn stderr() -> Self {
        Self::new(io::stderr())
    }

    /// A writer that discards everything.
    pub fn sink() -> Self {
        Self::new(io::sink())
    }

    /// Writes `line` followed by a newline.
    pub fn write_line(&self, line: impl fmt::Display) -> io::Result<()> {
        let mut guard = self.lock();
        writeln!(guard, "{line}")?;
        guard.flush()
    }

    /// Writes `text` as-is.
    pub fn write_str(&self, text: &str) -> io::Result<()> {
        let mut guard = self.lock();
        guard.write_all(text.as_bytes())?;
        guard.flush()
    }

    fn lock(&self) -> MutexGuard<'_, dyn Write + Send + 'static> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Write for Writer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.lock().write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.lock().flush()
    }
}

impl fmt::Debug for Writer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Writer").finish_non_exhaustive()
    }
}

impl From<Capture> for Writer {
    fn from(capture: Capture) -> Self {
        Writer::new(capture)
    }
}

/// Shared handle to an input stream.
#[derive(Clone)]
pub struct Reader {
    inner: Arc<Mutex<dyn Read + Send>>,
}

impl Reader {
    /// Wraps any reader.
    pub fn new<R>(reader: R) -> Self
    where
        R: Read + Send + 'static,
    {
        Self {
            inner: Arc::new(Mutex::new(reader)),
        }
    }

    /// Handle to the process standard input.
    pub fn stdin() -> Self {
        Self::new(io::stdin())
    }

    /// A reader that is always at end of input.
    pub fn empty() -> Self {
        Self::new(io::empty())
    }

    /// A reader over fixed content.
    pub fn from_bytes(content: impl Into<Vec<u8>>) -> Self {
        Self::new(io::Cursor::new(content.into()))
    }

    /// Reads everything that is left into a string.
    pub fn read_to_string(&self) -> io::Result<String> {
        let mut buffer = String::new();
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .read_to_string(&mut buffer)?;
        Ok(buffer)
    }
}

impl Read for Reader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .read(buf)
    }
}

impl fmt::Debug for Reader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reader").finish_non_exhaustive()
    }
}

/// In-memory writer that records everything written through any clone.
#[derive(Debug, Clone, Default)]
pub struct Capture {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl Capture {
    /// Creates an empty capture buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns everything written so far, lossily decoded as UTF-8.
    pub fn contents(&self) -> String {
        let buffer = self.buffer.lock().unwrap_or_else(PoisonError::into_inner);
        String::from_utf8_lossy(&buffer).into_owned()
    }

    /// Discards everything written so far.
    pub fn clear(&self) {
        self.buffer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl Write for Capture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
