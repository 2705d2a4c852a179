// SPDX-License-Identifier: Apache-2.0

use std::io::{self, Write};
use std::ops::{Deref, DerefMut};
use std::sync::{Mutex, PoisonError};
use std::thread;

use crossbeam_channel::Receiver;
use log::{debug, warn};

use crate::cancel::Cancellation;
use crate::encoder::Encoder;
use crate::error::{Error, Result};
use crate::pool::Pool;

/// Bytes written after each value of an encoded stream.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Delimiter {
    #[default]
    None,
    /// `\n`, for newline-delimited JSON.
    Newline,
    /// `,`
    Comma,
}

impl Delimiter {
    fn as_bytes(self) -> &'static [u8] {
        match self {
            Delimiter::None => b"",
            Delimiter::Newline => b"\n",
            Delimiter::Comma => b",",
        }
    }
}

/// Produces the values of an encoded stream.
///
/// Each call writes one value through the writer with the add-style
/// [`Encoder`] calls; the worker then appends the delimiter and flushes. A
/// source signals the end of the stream with [`StreamWriter::cancel`]`(None)`.
/// Sources are called concurrently from every worker.
pub trait ValueSource: Sync {
    fn next(&self, out: &mut StreamWriter<'_, '_>) -> Result<()>;
}

impl<F> ValueSource for F
where
    F: Fn(&mut StreamWriter<'_, '_>) -> Result<()> + Sync,
{
    fn next(&self, out: &mut StreamWriter<'_, '_>) -> Result<()> {
        self(out)
    }
}

/// A worker's encoder together with the stream's cancellation signal.
pub struct StreamWriter<'a, 'w> {
    enc: &'a mut Encoder<'w>,
    cancel: &'a Cancellation,
}

impl StreamWriter<'_, '_> {
    /// Stop every worker. `None` ends the stream cleanly.
    pub fn cancel(&self, cause: Option<Error>) -> bool {
        self.cancel.cancel(cause)
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn done(&self) -> Receiver<()> {
        self.cancel.done()
    }
}

impl<'w> Deref for StreamWriter<'_, 'w> {
    type Target = Encoder<'w>;

    fn deref(&self) -> &Self::Target {
        &*self.enc
    }
}

impl DerefMut for StreamWriter<'_, '_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut *self.enc
    }
}

/// Each flush of a worker is a single `write_all` under the lock, so values
/// from different workers never interleave.
struct SharedSink<'a, W>(&'a Mutex<W>);

impl<W: Write> Write for SharedSink<'_, W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).write(buf)
    }

    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .write_all(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).flush()
    }
}

/// Encodes values from a [`ValueSource`] with a fixed number of worker
/// threads, all writing to one sink.
///
/// With one worker the output keeps the order in which the source produced
/// values; with more there is no ordering guarantee. Any error (from the
/// source or the sink) cancels the whole stream.
///
/// # Example
/// ```
/// use std::sync::atomic::{AtomicU32, Ordering};
/// use jaycodec::{Error, StreamEncoder, StreamWriter};
///
/// let next = AtomicU32::new(0);
/// let stream = StreamEncoder::new(Vec::new()).line_delimited();
/// stream
///     .encode_stream(&|w: &mut StreamWriter<'_, '_>| -> Result<(), Error> {
///         match next.fetch_add(1, Ordering::SeqCst) {
///             n if n < 3 => w.add(&n),
///             _ => {
///                 w.cancel(None);
///             }
///         }
///         Ok(())
///     })
///     .unwrap();
/// assert_eq!(stream.into_inner(), b"0\n1\n2\n");
/// ```
pub struct StreamEncoder<W> {
    sink: Mutex<W>,
    workers: usize,
    delimiter: Delimiter,
    cancel: Cancellation,
}

impl<W: Write + Send> StreamEncoder<W> {
    /// Single-worker encoder with no delimiter.
    pub fn new(sink: W) -> Self {
        Self {
            sink: Mutex::new(sink),
            workers: 1,
            delimiter: Delimiter::None,
            cancel: Cancellation::new(),
        }
    }

    /// Number of worker threads, at least one.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn with_delimiter(mut self, delimiter: Delimiter) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn line_delimited(self) -> Self {
        self.with_delimiter(Delimiter::Newline)
    }

    pub fn comma_delimited(self) -> Self {
        self.with_delimiter(Delimiter::Comma)
    }

    /// Run the workers until the stream is cancelled. Returns the
    /// cancellation cause, if any.
    pub fn encode_stream<S: ValueSource + ?Sized>(&self, source: &S) -> Result<()> {
        thread::scope(|scope| {
            for id in 0..self.workers {
                scope.spawn(move || self.run_worker(id, source));
            }
        });
        match self.cancel.err() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn run_worker<S: ValueSource + ?Sized>(&self, id: usize, source: &S) {
        debug!("stream encode worker {} started", id);
        let mut enc = Pool::global().borrow_encoder(SharedSink(&self.sink));
        let mut count = 0usize;
        while !self.cancel.is_cancelled() {
            if let Err(err) = self.step(&mut enc, source) {
                if self.cancel.cancel(Some(err.clone())) {
                    warn!("stream encode cancelled by worker {}: {}", id, err);
                }
                break;
            }
            count += 1;
        }
        enc.release();
        debug!("stream encode worker {} stopped after {} values", id, count);
    }

    fn step<S: ValueSource + ?Sized>(&self, enc: &mut Encoder<'_>, source: &S) -> Result<()> {
        source.next(&mut StreamWriter {
            enc: &mut *enc,
            cancel: &self.cancel,
        })?;
        if enc.is_empty() {
            return Ok(());
        }
        enc.write_raw(self.delimiter.as_bytes());
        enc.flush()?;
        Ok(())
    }

    /// Stop every worker. The first cause wins.
    pub fn cancel(&self, cause: Option<Error>) -> bool {
        self.cancel.cancel(cause)
    }

    pub fn done(&self) -> Receiver<()> {
        self.cancel.done()
    }

    /// The error that ended the stream, if any.
    pub fn err(&self) -> Option<Error> {
        self.cancel.err()
    }

    pub fn cancellation(&self) -> Cancellation {
        self.cancel.clone()
    }

    /// Take the sink back.
    pub fn into_inner(self) -> W {
        self.sink.into_inner().unwrap_or_else(PoisonError::into_inner)
    }
}
