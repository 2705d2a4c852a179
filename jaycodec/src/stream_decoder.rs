// SPDX-License-Identifier: Apache-2.0

use std::io::Read;
use std::time::Instant;

use crossbeam_channel::Receiver;
use log::{debug, warn};

use crate::cancel::Cancellation;
use crate::decoder::Decoder;
use crate::error::{Error, Result};
use crate::pool::Pool;
use crate::visitor::Decode;

/// Destination for values produced by [`StreamDecoder::decode_stream`].
pub trait ValueSink<T> {
    fn accept(&mut self, value: T) -> Result<()>;
}

impl<T, F> ValueSink<T> for F
where
    F: FnMut(T) -> Result<()>,
{
    fn accept(&mut self, value: T) -> Result<()> {
        self(value)
    }
}

/// Decodes an open-ended sequence of top-level values (for example
/// newline-delimited JSON) from one reader, in order.
///
/// The stream stops at end of input, on the first error, on cancellation or
/// when the optional deadline passes. Consumed input is released between
/// values, so memory stays bounded by the largest single value.
///
/// # Example
/// ```
/// use jaycodec::{ChunkReader, Error, StreamDecoder};
///
/// let input = b"1\n2\n3\n";
/// let mut stream = StreamDecoder::new(ChunkReader::new(input, 2));
/// let mut seen = Vec::new();
/// stream
///     .decode_stream(|v: u32| -> Result<(), Error> {
///         seen.push(v);
///         Ok(())
///     })
///     .unwrap();
/// assert_eq!(seen, [1, 2, 3]);
/// assert!(stream.err().is_none());
/// ```
pub struct StreamDecoder<'r> {
    decoder: Decoder<'r>,
    cancel: Cancellation,
    deadline: Option<Instant>,
}

impl<'r> StreamDecoder<'r> {
    pub fn new<R: Read + 'r>(source: R) -> Self {
        Self::from_decoder(Decoder::new(source))
    }

    /// Stream decoder backed by storage borrowed from `pool`.
    pub fn borrow<R: Read + 'r>(pool: &'r Pool, source: R) -> Self {
        Self::from_decoder(pool.borrow_decoder(source))
    }

    fn from_decoder(decoder: Decoder<'r>) -> Self {
        Self {
            decoder,
            cancel: Cancellation::new(),
            deadline: None,
        }
    }

    /// Stop with [`Error::Timeout`] once `deadline` has passed. Checked
    /// between values only.
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Decode the next value into `value`. `Ok(false)` at end of input.
    /// Unlike [`Decoder::decode_next`], a soft error fails the call.
    pub fn decode_next<T: Decode + ?Sized>(&mut self, value: &mut T) -> Result<bool> {
        if !self.decoder.decode_next(value)? {
            return Ok(false);
        }
        self.decoder.finish()?;
        Ok(true)
    }

    /// Decode values until the input is exhausted, handing each to `sink`.
    ///
    /// Any error cancels the stream with that error as its cause and is
    /// returned. A clean end of input cancels with no cause.
    pub fn decode_stream<T, S>(&mut self, mut sink: S) -> Result<()>
    where
        T: Decode + Default,
        S: ValueSink<T>,
    {
        let result = self.pump(&mut sink);
        match &result {
            Ok(()) => {
                self.cancel.cancel(None);
            }
            Err(err) => {
                if self.cancel.cancel(Some(err.clone())) {
                    warn!("stream decode cancelled: {}", err);
                }
            }
        }
        result
    }

    fn pump<T, S>(&mut self, sink: &mut S) -> Result<()>
    where
        T: Decode + Default,
        S: ValueSink<T>,
    {
        let mut count = 0usize;
        loop {
            if self.cancel.is_cancelled() {
                debug!("stream decode stopped by cancellation after {} values", count);
                return match self.cancel.err() {
                    Some(err) => Err(err),
                    None => Ok(()),
                };
            }
            if self.deadline.is_some_and(|d| Instant::now() >= d) {
                return Err(Error::Timeout);
            }
            let mut value = T::default();
            if !self.decode_next(&mut value)? {
                debug!("stream decode reached end of input after {} values", count);
                return Ok(());
            }
            sink.accept(value)?;
            count += 1;
        }
    }

    /// Stop the stream. The first cause wins; see [`Cancellation::cancel`].
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

    /// A handle other threads can use to stop this stream.
    pub fn cancellation(&self) -> Cancellation {
        self.cancel.clone()
    }

    pub fn decoder(&mut self) -> &mut Decoder<'r> {
        &mut self.decoder
    }

    /// Return the decoder storage to the pool it was borrowed from
    /// ([`Pool::global`] for [`StreamDecoder::new`]).
    pub fn release(&mut self) {
        self.decoder.release();
    }
}
