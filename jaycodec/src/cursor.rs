// SPDX-License-Identifier: Apache-2.0

use std::fmt;
use std::io::{self, Read};

use log::trace;

use crate::error::{Error, Result};

/// Kind of JSON value, as classified from its first significant byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Object,
    Array,
    String,
    True,
    False,
    Null,
    Number,
    /// A byte that cannot start a JSON value.
    Invalid,
}

impl ValueKind {
    /// Classify the first byte of a value.
    pub fn classify(byte: u8) -> Self {
        match byte {
            b'{' => ValueKind::Object,
            b'[' => ValueKind::Array,
            b'"' => ValueKind::String,
            b't' => ValueKind::True,
            b'f' => ValueKind::False,
            b'n' => ValueKind::Null,
            b'-' | b'0'..=b'9' => ValueKind::Number,
            _ => ValueKind::Invalid,
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueKind::Object => "object",
            ValueKind::Array => "array",
            ValueKind::String => "string",
            ValueKind::True | ValueKind::False => "boolean",
            ValueKind::Null => "null",
            ValueKind::Number => "number",
            ValueKind::Invalid => "invalid token",
        };
        f.write_str(name)
    }
}

/// Bytes that may legally follow a scalar token.
#[inline]
pub(crate) fn is_delimiter(byte: u8) -> bool {
    matches!(byte, b' ' | b'\t' | b'\n' | b'\r' | b',' | b']' | b'}')
}

/// Growable input buffer with a read cursor and an optional pull source.
///
/// `buf.len()` is the capacity available for input; `buf[..filled]` holds
/// valid bytes and `pos` is the next unread byte, so `pos <= filled <= buf.len()`
/// always holds. Buffer positions stay stable while a value is being
/// decoded: the buffer only grows, and consumed bytes are dropped by
/// [`release_consumed`] at points where no positions are held. `base`
/// counts the dropped bytes, so `base + pos` is the offset in the whole
/// input and error offsets do not depend on how the input was chunked.
///
/// [`release_consumed`]: InputBuffer::release_consumed
pub(crate) struct InputBuffer<'r> {
    pub buf: Vec<u8>,
    pub pos: usize,
    pub filled: usize,
    /// Input bytes dropped from the front of `buf` so far.
    base: usize,
    source: Option<Box<dyn Read + 'r>>,
    /// Minimum growth step when the source needs more room.
    chunk: usize,
}

impl<'r> InputBuffer<'r> {
    /// Wrap recycled storage, discarding any previous contents.
    pub fn with_storage(buf: Vec<u8>, chunk: usize) -> Self {
        Self {
            buf,
            pos: 0,
            filled: 0,
            base: 0,
            source: None,
            chunk: chunk.max(1),
        }
    }

    /// Replace the contents with a complete in-memory document.
    pub fn load_slice(&mut self, data: &[u8]) {
        self.buf.clear();
        self.buf.extend_from_slice(data);
        self.pos = 0;
        self.filled = data.len();
        self.base = 0;
        self.source = None;
    }

    pub fn attach_source(&mut self, source: Box<dyn Read + 'r>) {
        self.pos = 0;
        self.filled = 0;
        self.base = 0;
        self.source = Some(source);
    }

    pub fn has_source(&self) -> bool {
        self.source.is_some()
    }

    /// Input offset of the byte under the cursor.
    #[inline]
    pub fn offset(&self) -> usize {
        self.base + self.pos
    }

    /// Input offset of buffer position `pos`.
    #[inline]
    pub fn offset_at(&self, pos: usize) -> usize {
        self.base + pos
    }

    /// Give the storage back, dropping the source.
    pub fn into_storage(self) -> Vec<u8> {
        self.buf
    }

    /// Pull more bytes from the source, appending at `filled`.
    ///
    /// Returns `Ok(false)` at end of input: no source attached, or the
    /// source returned a zero-length read (after which it is detached).
    pub fn fill(&mut self) -> Result<bool> {
        let Some(source) = self.source.as_mut() else {
            return Ok(false);
        };
        if self.filled == self.buf.len() {
            let grow = self.buf.len().max(self.chunk);
            self.buf.resize(self.buf.len() + grow, 0);
            trace!("input buffer grown to {} bytes", self.buf.len());
        }
        loop {
            match source.read(&mut self.buf[self.filled..]) {
                Ok(0) => {
                    self.source = None;
                    return Ok(false);
                }
                Ok(n) => {
                    trace!("read {} bytes from source", n);
                    self.filled += n;
                    return Ok(true);
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// The byte under the cursor, refilling if needed. `None` at end of input.
    #[inline]
    pub fn peek(&mut self) -> Result<Option<u8>> {
        loop {
            if self.pos < self.filled {
                return Ok(Some(self.buf[self.pos]));
            }
            if !self.fill()? {
                return Ok(None);
            }
        }
    }

    /// Consume and return the next byte, failing at end of input.
    #[inline]
    pub fn next_required(&mut self) -> Result<u8> {
        match self.peek()? {
            Some(byte) => {
                self.pos += 1;
                Ok(byte)
            }
            None => Err(Error::UnexpectedEnd {
                offset: self.offset(),
            }),
        }
    }

    #[inline]
    pub fn advance(&mut self) {
        debug_assert!(self.pos < self.filled);
        self.pos += 1;
    }

    /// Skip whitespace and commas, returning the next significant byte
    /// without consuming it.
    pub fn skip_insignificant(&mut self) -> Result<Option<u8>> {
        loop {
            match self.peek()? {
                Some(b' ' | b'\t' | b'\n' | b'\r' | b',') => self.pos += 1,
                other => return Ok(other),
            }
        }
    }

    /// Skip whitespace only (commas are significant here).
    pub fn skip_whitespace(&mut self) -> Result<Option<u8>> {
        loop {
            match self.peek()? {
                Some(b' ' | b'\t' | b'\n' | b'\r') => self.pos += 1,
                other => return Ok(other),
            }
        }
    }

    /// Consume the buffered run of string bytes up to the next quote or
    /// backslash, without refilling.
    pub fn take_plain_run(&mut self) -> &[u8] {
        let start = self.pos;
        let avail = &self.buf[start..self.filled];
        let len = avail
            .iter()
            .position(|&b| b == b'"' || b == b'\\')
            .unwrap_or(avail.len());
        self.pos += len;
        &self.buf[start..start + len]
    }

    /// Drop bytes before the cursor. Only applies to source-backed input,
    /// where it keeps memory bounded across long streams.
    pub fn release_consumed(&mut self) {
        if self.source.is_none() || self.pos == 0 {
            return;
        }
        self.buf.copy_within(self.pos..self.filled, 0);
        self.filled -= self.pos;
        self.base += self.pos;
        self.pos = 0;
    }
}
