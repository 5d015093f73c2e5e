//! Line-buffered adapter from a raw output stream to log records.
//!
//! Subprocess output arrives in chunks that have no relation to line
//! boundaries. [`LiveStream`] keeps the unterminated tail of the previous
//! chunk and emits one record per complete `\n`-terminated line.
//!
//! A trailing partial line is never flushed implicitly: if the stream is
//! dropped while holding one, that content is discarded.

use super::Severity;
use std::{fmt, io};

/// Destination for complete lines produced by a [`LiveStream`].
pub trait LineSink {
    /// Receive one complete line, without its terminator.
    fn emit_line(&mut self, severity: Severity, line: &str);
}

impl<S: LineSink + ?Sized> LineSink for &mut S {
    fn emit_line(&mut self, severity: Severity, line: &str) {
        (**self).emit_line(severity, line);
    }
}

/// Converts arbitrary chunks into discrete log lines at a fixed severity.
///
/// Bytes are buffered rather than `str` so a multi-byte character split
/// across two chunks is reassembled before decoding. Complete lines are
/// decoded lossily.
pub struct LiveStream<S: LineSink> {
    sink: S,
    severity: Severity,
    /// Never contains `b'\n'` between calls.
    buffer: Vec<u8>,
}

impl<S: LineSink> LiveStream<S> {
    /// Create a stream emitting into `sink` at `severity`.
    pub fn new(sink: S, severity: Severity) -> Self {
        Self {
            sink,
            severity,
            buffer: Vec::new(),
        }
    }

    /// Severity every emitted line is tagged with.
    pub fn severity(&self) -> Severity {
        self.severity
    }

    /// The buffered, unterminated tail.
    pub fn pending(&self) -> &[u8] {
        &self.buffer
    }

    /// Feed a chunk and emit every line it completes.
    ///
    /// Returns the number of lines emitted.
    pub fn push(&mut self, chunk: &[u8]) -> usize {
        // The old tail holds no terminator, so scanning starts at the new bytes.
        let mut scan_from = self.buffer.len();
        self.buffer.extend_from_slice(chunk);

        let mut line_start = 0;
        let mut emitted = 0;
        while let Some(offset) = self.buffer[scan_from..].iter().position(|b| *b == b'\n') {
            let terminator = scan_from + offset;
            let line = String::from_utf8_lossy(&self.buffer[line_start..terminator]);
            self.sink.emit_line(self.severity, &line);
            emitted += 1;
            line_start = terminator + 1;
            scan_from = line_start;
        }

        self.buffer.drain(..line_start);
        emitted
    }

    /// Feed a string chunk. See [`LiveStream::push`].
    pub fn push_str(&mut self, chunk: &str) -> usize {
        self.push(chunk.as_bytes())
    }

    /// Consume the stream, returning its sink. Any pending tail is dropped.
    pub fn into_sink(self) -> S {
        self.sink
    }
}

impl<S: LineSink> io::Write for LiveStream<S> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.push(buf);
        Ok(buf.len())
    }

    /// Does not emit the pending tail; only a terminator completes a line.
    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<S: LineSink> fmt::Debug for LiveStream<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LiveStream")
            .field("level", &self.severity)
            .field("pending_bytes", &self.buffer.len())
            .finish()
    }
}
