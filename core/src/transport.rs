//! Line framing over the serial link
//!
//! [`LineReader`] turns a blocking byte stream into lines. [`Outbox`] is the
//! write side: anything that can deliver an [`Outbound`] token to the reader.

use std::io::{BufRead, ErrorKind, Read, Write};
use std::sync::mpsc::Sender;
use std::thread::{self, JoinHandle};

use crate::controller::Event;
use crate::error::TransportError;
use crate::protocol::Outbound;

/// Longest accepted line, terminator excluded.
pub const MAX_LINE_LEN: usize = 4096;

/// Blocking line reader.
///
/// Read timeouts are not errors: serial ports report them when no byte
/// arrives within the port timeout, and the partial line stays buffered
/// until the terminator shows up. A line over [`MAX_LINE_LEN`] is reported
/// as [`TransportError::LineTooLong`] and its remainder skipped.
pub struct LineReader<R> {
    inner: R,
    buf: Vec<u8>,
    closed: bool,
    discarding: bool,
}

impl<R: BufRead> LineReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            buf: Vec::with_capacity(128),
            closed: false,
            discarding: false,
        }
    }

    /// Block until a full line is available.
    ///
    /// The returned string keeps its terminator. A final unterminated line is
    /// returned as-is at end of stream; the call after that reports
    /// [`TransportError::Closed`]. Invalid UTF-8 is replaced, not rejected.
    pub fn next_line(&mut self) -> Result<String, TransportError> {
        if self.closed {
            return Err(TransportError::Closed);
        }

        loop {
            // buf never holds more than MAX_LINE_LEN bytes here, so limit >= 1
            let limit = (MAX_LINE_LEN + 1 - self.buf.len()) as u64;
            match (&mut self.inner).take(limit).read_until(b'\n', &mut self.buf) {
                Ok(0) => {
                    self.closed = true;
                    if self.buf.is_empty() || self.discarding {
                        return Err(TransportError::Closed);
                    }
                    return Ok(self.take_line());
                }
                Ok(_) => {
                    let terminated = self.buf.last() == Some(&b'\n');
                    if self.discarding {
                        self.buf.clear();
                        self.discarding = !terminated;
                        continue;
                    }
                    if terminated {
                        return Ok(self.take_line());
                    }
                    if self.buf.len() > MAX_LINE_LEN {
                        self.buf.clear();
                        self.discarding = true;
                        return Err(TransportError::LineTooLong {
                            limit: MAX_LINE_LEN,
                        });
                    }
                    // EOF in the middle of a line
                    self.closed = true;
                    return Ok(self.take_line());
                }
                Err(e)
                    if matches!(
                        e.kind(),
                        ErrorKind::TimedOut | ErrorKind::Interrupted | ErrorKind::WouldBlock
                    ) =>
                {
                    continue;
                }
                Err(e) => return Err(TransportError::Io(e)),
            }
        }
    }

    fn take_line(&mut self) -> String {
        let line = String::from_utf8_lossy(&self.buf).into_owned();
        self.buf.clear();
        line
    }
}

/// Run a [`LineReader`] on its own thread, forwarding lines as events.
///
/// The thread ends after forwarding the first fatal transport failure, or
/// when the event queue is dropped.
pub fn spawn_reader<R>(mut reader: LineReader<R>, events: Sender<Event>) -> JoinHandle<()>
where
    R: BufRead + Send + 'static,
{
    thread::spawn(move || {
        loop {
            let event = match reader.next_line() {
                Ok(line) => Event::Line(line),
                Err(TransportError::LineTooLong { limit }) => Event::LineTooLong(limit),
                Err(e) => {
                    let _ = events.send(Event::LinkFailed(e));
                    return;
                }
            };
            if events.send(event).is_err() {
                tracing::debug!("Event queue closed, stopping link reader");
                return;
            }
        }
    })
}

/// Write side of the link.
pub trait Outbox {
    fn send(&mut self, message: &Outbound) -> Result<(), TransportError>;
}

/// [`Outbox`] over any byte sink. Tokens are written bare, without a
/// terminator, and flushed immediately.
pub struct LinkWriter<W> {
    inner: W,
}

impl<W: Write> LinkWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }
}

impl<W: Write> Outbox for LinkWriter<W> {
    fn send(&mut self, message: &Outbound) -> Result<(), TransportError> {
        tracing::debug!(message = message.as_wire(), "link write");
        self.inner.write_all(message.as_wire().as_bytes())?;
        self.inner.flush()?;
        Ok(())
    }
}
