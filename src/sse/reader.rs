//! Turns a response body into published [`StreamEvent`]s.
//!
//! [`LineReader`] splits the byte stream into lines, holding at most one
//! partial line. [`StreamReader`] decodes each line and publishes events in
//! arrival order until `done`, end of body, an I/O error, cancellation, or
//! the consumer going away.

use futures::StreamExt;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::decoder::{decode_line, DecodedLine};
use super::events::StreamEvent;
use crate::error::SkaldError;
use crate::traits::{BodyStream, HttpError};

/// Upper bound on a single buffered line.
pub const MAX_LINE_BYTES: usize = 1024 * 1024;

/// Splits a body stream on `\n`, dropping a trailing `\r`.
pub struct LineReader {
    body: BodyStream,
    buffer: Vec<u8>,
    /// Prefix of `buffer` already known to hold no `\n`
    scanned: usize,
    exhausted: bool,
}

impl LineReader {
    pub fn new(body: BodyStream) -> Self {
        Self {
            body,
            buffer: Vec::new(),
            scanned: 0,
            exhausted: false,
        }
    }

    /// Next complete line, or `None` once the body is exhausted.
    ///
    /// A final line without a terminator is still returned. Cancel safe:
    /// dropping the future never loses buffered bytes.
    pub async fn next_line(&mut self) -> Result<Option<String>, HttpError> {
        loop {
            let unscanned = &self.buffer[self.scanned..];
            if let Some(offset) = unscanned.iter().position(|b| *b == b'\n') {
                let pos = self.scanned + offset;
                self.scanned = 0;
                let mut line: Vec<u8> = self.buffer.drain(..=pos).collect();
                line.pop();
                return Ok(Some(into_line(line)));
            }

            if self.exhausted {
                if self.buffer.is_empty() {
                    return Ok(None);
                }
                self.scanned = 0;
                let line = std::mem::take(&mut self.buffer);
                return Ok(Some(into_line(line)));
            }

            if self.buffer.len() > MAX_LINE_BYTES {
                return Err(HttpError::Io(format!(
                    "SSE line exceeds {} bytes",
                    MAX_LINE_BYTES
                )));
            }

            self.scanned = self.buffer.len();
            match self.body.next().await {
                Some(Ok(chunk)) => self.buffer.extend_from_slice(&chunk),
                Some(Err(e)) => return Err(e),
                None => self.exhausted = true,
            }
        }
    }
}

fn into_line(mut bytes: Vec<u8>) -> String {
    if bytes.last() == Some(&b'\r') {
        bytes.pop();
    }
    match String::from_utf8(bytes) {
        Ok(line) => line,
        Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
    }
}

/// How a stream that did not fail came to an end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamEnd {
    /// A `done` event was published
    Done,
    /// Body ended without `done`
    Eof,
    /// The event receiver was closed or dropped
    ConsumerGone,
}

/// Reads one response body to completion. Owns the body; it is released when
/// [`run`](Self::run) returns.
pub struct StreamReader {
    lines: LineReader,
    published: usize,
}

impl StreamReader {
    pub fn new(body: BodyStream) -> Self {
        Self {
            lines: LineReader::new(body),
            published: 0,
        }
    }

    /// Publish events to `events` until the stream terminates.
    ///
    /// Every wait (next body chunk, channel send) also watches `cancel`, which
    /// yields [`SkaldError::Cancelled`].
    pub async fn run(
        mut self,
        events: &mpsc::Sender<StreamEvent>,
        cancel: &CancellationToken,
    ) -> Result<StreamEnd, SkaldError> {
        loop {
            let line = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(SkaldError::Cancelled),
                _ = events.closed() => return Ok(self.finish(StreamEnd::ConsumerGone)),
                line = self.lines.next_line() => line?,
            };

            let Some(line) = line else {
                return Ok(self.finish(StreamEnd::Eof));
            };

            let event = match decode_line(&line) {
                DecodedLine::Ignore => continue,
                DecodedLine::Data(payload) => match StreamEvent::from_payload(payload) {
                    Ok(event) => event,
                    Err(e) => {
                        tracing::debug!(error = %e, "Skipping SSE payload that is not a stream event");
                        continue;
                    }
                },
            };

            let done = event.is_done();
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(SkaldError::Cancelled),
                sent = events.send(event) => {
                    if sent.is_err() {
                        return Ok(self.finish(StreamEnd::ConsumerGone));
                    }
                }
            }
            self.published += 1;

            if done {
                return Ok(self.finish(StreamEnd::Done));
            }
        }
    }

    fn finish(&self, end: StreamEnd) -> StreamEnd {
        match end {
            StreamEnd::Eof => {
                tracing::warn!(events = self.published, "SSE stream ended without a done event")
            }
            _ => tracing::debug!(events = self.published, ?end, "SSE stream finished"),
        }
        end
    }
}
