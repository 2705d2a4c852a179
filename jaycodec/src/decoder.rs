// SPDX-License-Identifier: Apache-2.0

use std::fmt;
use std::io::Read;
use std::mem;

use crate::config::Config;
use crate::copy_on_escape::{read_string, StringBytes};
use crate::cursor::{is_delimiter, InputBuffer, ValueKind};
use crate::error::{Error, Result, SoftError};
use crate::int_parser;
use crate::number_parser::{self, NumberShape};
use crate::pool::Pool;
use crate::visitor::{ArrayVisitor, Decode, ObjectVisitor};

/// Reusable backing storage of a [`Decoder`], recycled through a [`Pool`].
#[derive(Debug, Default)]
pub(crate) struct DecoderStorage {
    pub buf: Vec<u8>,
    pub scratch: Vec<u8>,
    /// Free list of key strings, one per nesting level in use.
    pub keys: Vec<String>,
}

impl DecoderStorage {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
            scratch: Vec::new(),
            keys: Vec::new(),
        }
    }
}

/// Pull decoder over a byte buffer or an [`io::Read`](std::io::Read) source.
///
/// The decoder never builds a tree. Callers describe where values go with
/// [`ObjectVisitor`] / [`ArrayVisitor`] implementations (or the closure
/// adapters [`ObjectFn`](crate::ObjectFn) / [`ArrayFn`](crate::ArrayFn)) and
/// the typed primitives such as [`Decoder::i64`] and [`Decoder::string`].
///
/// Members and elements a visitor does not consume are skipped. Soft errors
/// (type mismatch, overflow, invalid UTF-8) leave the destination at its zero
/// value, skip the token and are reported once, by [`Decoder::finish`].
///
/// # Example
/// ```
/// use jaycodec::{Decoder, ObjectFn};
///
/// let mut id = 0u64;
/// let mut tags: Vec<String> = Vec::new();
/// let mut dec = Decoder::from_slice(br#"{"id": 7, "skip": {"x": [1]}, "tags": ["a", "b"]}"#);
/// dec.object(&mut ObjectFn::new(|d, key| match key {
///     "id" => d.decode(&mut id),
///     "tags" => d.decode(&mut tags),
///     _ => Ok(()),
/// }))
/// .unwrap();
/// dec.finish().unwrap();
/// assert_eq!((id, tags.len()), (7, 2));
/// ```
pub struct Decoder<'r> {
    pub(crate) input: InputBuffer<'r>,
    scratch: Vec<u8>,
    keys: Vec<String>,
    /// Bumped by every value-level read; a visitor that leaves it unchanged
    /// did not consume the current value.
    reads: u64,
    soft: SoftError,
    released: bool,
    /// Pool the storage came from; [`Decoder::release`] returns it there.
    pub(crate) home: Option<&'r Pool>,
}

macro_rules! decode_integers {
    ($($name:ident => $ty:ty, $parse:path;)*) => {
        $(
            #[doc = concat!("Decode the next value as `", stringify!($ty), "`.")]
            ///
            /// `null` yields zero. Overflow, fractions and non-numeric values
            /// record a soft error and yield zero.
            pub fn $name(&mut self) -> Result<$ty> {
                self.integer(stringify!($ty), $parse)
            }
        )*
    };
}

impl<'r> Decoder<'r> {
    /// Decoder pulling from `source` with the default [`Config`].
    pub fn new<R: Read + 'r>(source: R) -> Self {
        Self::with_config(source, &Config::default())
    }

    pub fn with_config<R: Read + 'r>(source: R, config: &Config) -> Self {
        let mut dec = Self::from_storage(
            DecoderStorage::with_capacity(config.buffer_size),
            config.buffer_size,
        );
        dec.input.attach_source(Box::new(source));
        dec
    }

    /// Decoder over a complete in-memory document.
    pub fn from_slice(data: &[u8]) -> Self {
        let mut dec = Self::from_storage(DecoderStorage::default(), Config::DEFAULT_BUFFER_SIZE);
        dec.input.load_slice(data);
        dec
    }

    pub(crate) fn from_storage(storage: DecoderStorage, chunk: usize) -> Self {
        Self {
            input: InputBuffer::with_storage(storage.buf, chunk),
            scratch: storage.scratch,
            keys: storage.keys,
            reads: 0,
            soft: SoftError::default(),
            released: false,
            home: None,
        }
    }

    /// Hand the storage back and poison this decoder.
    pub(crate) fn take_storage(&mut self) -> DecoderStorage {
        self.live();
        self.released = true;
        let input = mem::replace(&mut self.input, InputBuffer::with_storage(Vec::new(), 1));
        let mut keys = mem::take(&mut self.keys);
        keys.iter_mut().for_each(String::clear);
        DecoderStorage {
            buf: input.into_storage(),
            scratch: mem::take(&mut self.scratch),
            keys,
        }
    }

    #[inline]
    fn live(&self) {
        assert!(!self.released, "decoder used after release to pool");
    }

    /// Return this decoder's storage to the pool it was borrowed from, or
    /// to [`Pool::global`] for a decoder built directly. Any later call on
    /// the decoder panics.
    pub fn release(&mut self) {
        let pool = self.home.unwrap_or(Pool::global());
        pool.release_decoder(self);
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    /// Buffer position of the next unread byte.
    pub fn cursor(&self) -> usize {
        self.live();
        self.input.pos
    }

    /// Number of valid bytes in the buffer.
    pub fn filled(&self) -> usize {
        self.live();
        self.input.filled
    }

    /// Current buffer capacity.
    pub fn capacity(&self) -> usize {
        self.live();
        self.input.buf.capacity()
    }

    /// The first soft error recorded so far, if any.
    pub fn soft_error(&self) -> Option<&Error> {
        self.live();
        self.soft.get()
    }

    pub fn take_soft_error(&mut self) -> Option<Error> {
        self.live();
        self.soft.take()
    }

    /// Complete a top-level decode: returns the recorded soft error, if any.
    /// Bytes after the decoded value are left unread.
    pub fn finish(&mut self) -> Result<()> {
        self.live();
        match self.soft.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Classify the next value without consuming it. `None` at end of input.
    pub fn peek_kind(&mut self) -> Result<Option<ValueKind>> {
        self.live();
        Ok(self.input.skip_insignificant()?.map(ValueKind::classify))
    }

    /// Decode one value into `value`.
    pub fn decode<T: Decode + ?Sized>(&mut self, value: &mut T) -> Result<()> {
        self.live();
        value.decode(self)
    }

    /// Decode the next top-level value of a sequence. Returns `Ok(false)`
    /// once the input holds only whitespace. Consumed input is released
    /// first, so long streams run in bounded memory.
    pub fn decode_next<T: Decode + ?Sized>(&mut self, value: &mut T) -> Result<bool> {
        self.live();
        self.input.release_consumed();
        if self.input.skip_insignificant()?.is_none() {
            return Ok(false);
        }
        value.decode(self)?;
        Ok(true)
    }

    /// Position on the first byte of the next value and count the read.
    fn begin_value(&mut self) -> Result<u8> {
        self.live();
        self.reads += 1;
        match self.input.skip_insignificant()? {
            Some(byte) => Ok(byte),
            None => Err(Error::UnexpectedEnd {
                offset: self.input.offset(),
            }),
        }
    }

    /// Handle a value of the wrong kind at the cursor: soft error and skip,
    /// or a fatal error when the byte cannot start any value.
    fn mismatch(&mut self, expected: &'static str, byte: u8) -> Result<()> {
        let offset = self.input.offset();
        let found = ValueKind::classify(byte);
        if found == ValueKind::Invalid {
            return Err(Error::invalid_byte(byte, offset));
        }
        self.soft.record(Error::TypeMismatch {
            expected,
            found,
            offset,
        });
        self.skip_value()
    }

    /// If the next value is `null`, consume it and return `true`.
    pub fn consume_null(&mut self) -> Result<bool> {
        self.live();
        if self.input.skip_insignificant()? != Some(b'n') {
            return Ok(false);
        }
        self.reads += 1;
        self.expect_literal(b"null")?;
        Ok(true)
    }

    /// Match `literal` byte by byte, then require a delimiter or end of input.
    fn expect_literal(&mut self, literal: &[u8]) -> Result<()> {
        for &expected in literal {
            let at = self.input.offset();
            let byte = self.input.next_required()?;
            if byte != expected {
                return Err(Error::invalid_byte(byte, at));
            }
        }
        match self.input.peek()? {
            Some(byte) if !is_delimiter(byte) => Err(Error::invalid_byte(byte, self.input.offset())),
            _ => Ok(()),
        }
    }

    /// Consume a number token and validate its syntax.
    fn number_token(&mut self) -> Result<(usize, usize, NumberShape)> {
        let start = self.input.pos;
        while let Some(byte) = self.input.peek()? {
            match byte {
                b'0'..=b'9' | b'-' | b'+' | b'.' | b'e' | b'E' => self.input.advance(),
                _ if is_delimiter(byte) => break,
                _ => return Err(Error::invalid_byte(byte, self.input.offset())),
            }
        }
        let end = self.input.pos;
        match NumberShape::scan(&self.input.buf[start..end]) {
            Ok(shape) => Ok((start, end, shape)),
            Err(i) if start + i < end => Err(Error::invalid_byte(
                self.input.buf[start + i],
                self.input.offset_at(start + i),
            )),
            Err(_) => Err(match self.input.peek()? {
                Some(byte) => Error::invalid_byte(byte, self.input.offset_at(end)),
                None => Error::UnexpectedEnd {
                    offset: self.input.offset_at(end),
                },
            }),
        }
    }

    fn integer<T: Default>(
        &mut self,
        target: &'static str,
        parse: fn(bool, &[u8]) -> Option<T>,
    ) -> Result<T> {
        let byte = self.begin_value()?;
        match byte {
            b'-' | b'0'..=b'9' => {
                let (start, end, shape) = self.number_token()?;
                if !shape.is_integer() {
                    self.soft.record(Error::TypeMismatch {
                        expected: target,
                        found: ValueKind::Number,
                        offset: self.input.offset_at(start),
                    });
                    return Ok(T::default());
                }
                let token = &self.input.buf[start..end];
                match parse(shape.negative, shape.int_digits(token)) {
                    Some(value) => Ok(value),
                    None => {
                        self.soft.record(Error::Overflow {
                            target,
                            offset: self.input.offset_at(start),
                        });
                        Ok(T::default())
                    }
                }
            }
            b'n' => {
                self.expect_literal(b"null")?;
                Ok(T::default())
            }
            other => {
                self.mismatch(target, other)?;
                Ok(T::default())
            }
        }
    }

    fn float<T: Default>(
        &mut self,
        target: &'static str,
        parse: fn(&[u8], &NumberShape) -> Option<T>,
    ) -> Result<T> {
        let byte = self.begin_value()?;
        match byte {
            b'-' | b'0'..=b'9' => {
                let (start, end, shape) = self.number_token()?;
                match parse(&self.input.buf[start..end], &shape) {
                    Some(value) => Ok(value),
                    None => {
                        self.soft.record(Error::Overflow {
                            target,
                            offset: self.input.offset_at(start),
                        });
                        Ok(T::default())
                    }
                }
            }
            b'n' => {
                self.expect_literal(b"null")?;
                Ok(T::default())
            }
            other => {
                self.mismatch(target, other)?;
                Ok(T::default())
            }
        }
    }

    decode_integers! {
        i8 => i8, int_parser::parse_i8;
        i16 => i16, int_parser::parse_i16;
        i32 => i32, int_parser::parse_i32;
        i64 => i64, int_parser::parse_i64;
        u8 => u8, int_parser::parse_u8;
        u16 => u16, int_parser::parse_u16;
        u32 => u32, int_parser::parse_u32;
        u64 => u64, int_parser::parse_u64;
    }

    pub fn f32(&mut self) -> Result<f32> {
        self.float("f32", number_parser::parse_f32)
    }

    pub fn f64(&mut self) -> Result<f64> {
        self.float("f64", number_parser::parse_f64)
    }

    /// Decode `true` or `false`. `null` yields `false`.
    pub fn bool(&mut self) -> Result<bool> {
        let byte = self.begin_value()?;
        match byte {
            b't' => {
                self.expect_literal(b"true")?;
                Ok(true)
            }
            b'f' => {
                self.expect_literal(b"false")?;
                Ok(false)
            }
            b'n' => {
                self.expect_literal(b"null")?;
                Ok(false)
            }
            other => {
                self.mismatch("bool", other)?;
                Ok(false)
            }
        }
    }

    /// Decode a string and borrow it from the decoder's buffers.
    ///
    /// Strings without escapes are returned straight from the input buffer;
    /// the view is only valid until the next call on the decoder. `null`
    /// yields `""`.
    pub fn str_view(&mut self) -> Result<&str> {
        let byte = self.begin_value()?;
        match byte {
            b'"' => {
                let offset = self.input.offset();
                self.input.advance();
                let bytes = match read_string(&mut self.input, &mut self.scratch)? {
                    StringBytes::Input { start, end } => &self.input.buf[start..end],
                    StringBytes::Scratch => &self.scratch[..],
                };
                match std::str::from_utf8(bytes) {
                    Ok(s) => Ok(s),
                    Err(_) => {
                        self.soft.record(Error::InvalidUtf8 { offset });
                        Ok("")
                    }
                }
            }
            b'n' => {
                self.expect_literal(b"null")?;
                Ok("")
            }
            other => {
                self.mismatch("string", other)?;
                Ok("")
            }
        }
    }

    /// Decode a string into `out`, replacing its contents.
    pub fn string(&mut self, out: &mut String) -> Result<()> {
        out.clear();
        let s = self.str_view()?;
        out.push_str(s);
        Ok(())
    }

    /// Read an object key; the opening quote has been consumed.
    fn read_key(&mut self, key: &mut String) -> Result<()> {
        let offset = self.input.offset() - 1;
        key.clear();
        let bytes = match read_string(&mut self.input, &mut self.scratch)? {
            StringBytes::Input { start, end } => &self.input.buf[start..end],
            StringBytes::Scratch => &self.scratch[..],
        };
        match std::str::from_utf8(bytes) {
            Ok(s) => key.push_str(s),
            Err(_) => {
                self.soft.record(Error::InvalidUtf8 { offset });
                key.push_str(&String::from_utf8_lossy(bytes));
            }
        }
        Ok(())
    }

    /// Decode an object, calling `visitor` once per member.
    ///
    /// `null` is accepted without visitor calls. When the visitor reports a
    /// non-zero [`expected_members`](ObjectVisitor::expected_members), the
    /// remaining members are skipped once that many have been consumed.
    pub fn object<V: ObjectVisitor + ?Sized>(&mut self, visitor: &mut V) -> Result<()> {
        let byte = self.begin_value()?;
        match byte {
            b'{' => {
                self.input.advance();
                let mut key = self.keys.pop().unwrap_or_default();
                let result = self.members(visitor, &mut key);
                key.clear();
                self.keys.push(key);
                result
            }
            b'n' => self.expect_literal(b"null"),
            other => self.mismatch("object", other),
        }
    }

    fn members<V: ObjectVisitor + ?Sized>(&mut self, visitor: &mut V, key: &mut String) -> Result<()> {
        let budget = visitor.expected_members();
        let mut consumed = 0;
        loop {
            let found = self.input.skip_insignificant()?;
            let at = self.input.offset();
            match found {
                Some(b'}') => {
                    self.input.advance();
                    return Ok(());
                }
                Some(b'"') => {
                    self.input.advance();
                    self.read_key(key)?;
                    match self.input.skip_whitespace()? {
                        Some(b':') => self.input.advance(),
                        Some(byte) => return Err(Error::invalid_byte(byte, self.input.offset())),
                        None => {
                            return Err(Error::UnexpectedEnd {
                                offset: self.input.offset(),
                            })
                        }
                    }
                    let before = self.reads;
                    visitor.visit_member(self, key.as_str())?;
                    if self.reads == before {
                        self.skip_value()?;
                    } else {
                        consumed += 1;
                    }
                    if budget > 0 && consumed >= budget {
                        return self.skip_nested();
                    }
                }
                Some(byte) => return Err(Error::invalid_byte(byte, at)),
                None => return Err(Error::UnexpectedEnd { offset: at }),
            }
        }
    }

    /// Decode an array, calling `visitor` once per element. `null` is
    /// accepted without visitor calls.
    pub fn array<V: ArrayVisitor + ?Sized>(&mut self, visitor: &mut V) -> Result<()> {
        let byte = self.begin_value()?;
        match byte {
            b'[' => {
                self.input.advance();
                loop {
                    match self.input.skip_insignificant()? {
                        Some(b']') => {
                            self.input.advance();
                            return Ok(());
                        }
                        Some(_) => {
                            let before = self.reads;
                            visitor.visit_element(self)?;
                            if self.reads == before {
                                self.skip_value()?;
                            }
                        }
                        None => {
                            return Err(Error::UnexpectedEnd {
                                offset: self.input.offset(),
                            })
                        }
                    }
                }
            }
            b'n' => self.expect_literal(b"null"),
            other => self.mismatch("array", other),
        }
    }

    /// Like [`Decoder::object`], but creates the visitor only for a
    /// non-null object. `null` sets `slot` to `None`.
    pub fn object_or_null<V: ObjectVisitor + Default>(&mut self, slot: &mut Option<V>) -> Result<()> {
        let byte = self.begin_value()?;
        match byte {
            b'{' => self.object(slot.get_or_insert_with(V::default)),
            b'n' => {
                *slot = None;
                self.expect_literal(b"null")
            }
            other => self.mismatch("object", other),
        }
    }

    /// Like [`Decoder::array`], but creates the visitor only for a non-null
    /// array. `null` sets `slot` to `None`.
    pub fn array_or_null<V: ArrayVisitor + Default>(&mut self, slot: &mut Option<V>) -> Result<()> {
        let byte = self.begin_value()?;
        match byte {
            b'[' => self.array(slot.get_or_insert_with(V::default)),
            b'n' => {
                *slot = None;
                self.expect_literal(b"null")
            }
            other => self.mismatch("array", other),
        }
    }

    /// Copy the raw bytes of the next value, whatever its kind, into `out`.
    pub fn embedded_json(&mut self, out: &mut Vec<u8>) -> Result<()> {
        self.begin_value()?;
        let start = self.input.pos;
        self.skip_value()?;
        out.clear();
        out.extend_from_slice(&self.input.buf[start..self.input.pos]);
        Ok(())
    }

    /// Skip the next value without decoding it.
    pub fn skip(&mut self) -> Result<()> {
        self.live();
        self.reads += 1;
        self.skip_value()
    }

    fn skip_value(&mut self) -> Result<()> {
        let Some(byte) = self.input.skip_insignificant()? else {
            return Err(Error::UnexpectedEnd {
                offset: self.input.offset(),
            });
        };
        match byte {
            b'"' => {
                self.input.advance();
                self.skip_string_body()
            }
            b'{' | b'[' => {
                self.input.advance();
                self.skip_nested()
            }
            b't' => self.expect_literal(b"true"),
            b'f' => self.expect_literal(b"false"),
            b'n' => self.expect_literal(b"null"),
            b'-' | b'0'..=b'9' => self.number_token().map(|_| ()),
            other => Err(Error::invalid_byte(other, self.input.offset())),
        }
    }

    /// Skip to just past the bracket closing the innermost open composite.
    fn skip_nested(&mut self) -> Result<()> {
        let mut depth = 1usize;
        loop {
            let byte = self.input.next_required()?;
            match byte {
                b'"' => self.skip_string_body()?,
                b'{' | b'[' => depth += 1,
                b'}' | b']' => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(());
                    }
                }
                _ => {}
            }
        }
    }

    /// Skip to just past the closing quote. A quote closes the string when
    /// it follows an even run of backslashes.
    fn skip_string_body(&mut self) -> Result<()> {
        let mut backslashes = 0usize;
        loop {
            match self.input.next_required()? {
                b'"' if backslashes % 2 == 0 => return Ok(()),
                b'\\' => backslashes += 1,
                _ => backslashes = 0,
            }
        }
    }

    /// Position on the next value for a [`StringReader`](crate::StringReader).
    pub(crate) fn begin_string_reader(&mut self) -> Result<bool> {
        let byte = self.begin_value()?;
        match byte {
            b'"' => {
                self.input.advance();
                Ok(true)
            }
            b'n' => self.expect_literal(b"null").map(|_| false),
            other => self.mismatch("string", other).map(|_| false),
        }
    }
}

impl fmt::Debug for Decoder<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Decoder")
            .field("cursor", &self.input.pos)
            .field("filled", &self.input.filled)
            .field("streaming", &self.input.has_source())
            .field("soft_error", &self.soft.get())
            .field("released", &self.released)
            .finish()
    }
}
