// SPDX-License-Identifier: Apache-2.0

use std::fmt;
use std::io::Write;
use std::mem;

use log::trace;

use crate::config::Config;
use crate::emitter::{ArrayEmitter, Encode, ObjectEmitter};
use crate::error::{Error, Result};
use crate::escape_processor::EscapeProcessor;
use crate::pool::Pool;

/// Buffer-growing JSON encoder, optionally bound to an [`io::Write`](std::io::Write) sink.
///
/// The `add*` family appends one value, inserting a `,` unless the buffer
/// is empty or the last byte written opened an object or array. The
/// `encode*` family writes a complete top-level value and, when a sink is
/// attached, flushes it.
///
/// # Example
/// ```
/// use jaycodec::{Encoder, ObjectEmitFn};
///
/// let mut enc = Encoder::new();
/// enc.encode_object(&ObjectEmitFn::new(|e| {
///     e.add_key("id", &7u32);
///     e.add_key_omit_empty("note", "");
///     e.add_key("tags", &["a", "b"][..]);
/// }))
/// .unwrap();
/// assert_eq!(enc.buffer(), br#"{"id":7,"tags":["a","b"]}"#);
/// ```
pub struct Encoder<'w> {
    buf: Vec<u8>,
    sink: Option<Box<dyn Write + 'w>>,
    /// First sink error; later flushes fail with it too.
    error: Option<Error>,
    released: bool,
    /// Pool the buffer came from; [`Encoder::release`] returns it there.
    pub(crate) home: Option<&'w Pool>,
}

impl Encoder<'static> {
    /// Encoder writing into its own buffer.
    pub fn new() -> Self {
        Self::with_capacity(Config::DEFAULT_ENCODER_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self::from_storage(Vec::with_capacity(capacity), None)
    }
}

impl Default for Encoder<'static> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'w> Encoder<'w> {
    /// Encoder that flushes completed values to `sink`.
    pub fn with_writer<W: Write + 'w>(sink: W) -> Self {
        Self::from_storage(
            Vec::with_capacity(Config::DEFAULT_ENCODER_CAPACITY),
            Some(Box::new(sink)),
        )
    }

    pub(crate) fn from_storage(mut buf: Vec<u8>, sink: Option<Box<dyn Write + 'w>>) -> Self {
        buf.clear();
        Self {
            buf,
            sink,
            error: None,
            released: false,
            home: None,
        }
    }

    /// Hand the buffer back and poison this encoder.
    pub(crate) fn take_storage(&mut self) -> Vec<u8> {
        self.live();
        self.released = true;
        self.sink = None;
        self.error = None;
        let mut buf = mem::take(&mut self.buf);
        buf.clear();
        buf
    }

    #[inline]
    fn live(&self) {
        assert!(!self.released, "encoder used after release to pool");
    }

    /// Return this encoder's buffer to the pool it was borrowed from, or to
    /// [`Pool::global`] for an encoder built directly. Any later call on the
    /// encoder panics.
    pub fn release(&mut self) {
        let pool = self.home.unwrap_or(Pool::global());
        pool.release_encoder(self);
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    /// Grow to `2 * capacity + additional` when `additional` bytes do not fit.
    #[inline]
    fn grow(&mut self, additional: usize) {
        let cap = self.buf.capacity();
        if self.buf.len() + additional > cap {
            self.buf.reserve_exact(2 * cap + additional - self.buf.len());
        }
    }

    #[inline]
    pub(crate) fn put(&mut self, bytes: &[u8]) {
        self.grow(bytes.len());
        self.buf.extend_from_slice(bytes);
    }

    #[inline]
    fn put_byte(&mut self, byte: u8) {
        self.grow(1);
        self.buf.push(byte);
    }

    /// Write a `,` unless this value is the first in its container.
    #[inline]
    pub(crate) fn separate(&mut self) {
        match self.buf.last() {
            None | Some(b'[') | Some(b'{') => {}
            Some(_) => self.put_byte(b','),
        }
    }

    fn write_key(&mut self, key: &str) {
        self.separate();
        self.write_str(key);
        self.put_byte(b':');
    }

    /// Write a quoted, escaped string. No separator.
    pub(crate) fn write_str(&mut self, value: &str) {
        self.grow(value.len() + 2);
        self.buf.push(b'"');
        EscapeProcessor::escape_into(&mut self.buf, value.as_bytes());
        self.buf.push(b'"');
    }

    pub(crate) fn write_number(&mut self, write: impl FnOnce(&mut Vec<u8>)) {
        self.grow(24);
        write(&mut self.buf);
    }

    pub(crate) fn write_object<E: ObjectEmitter + ?Sized>(&mut self, emitter: &E) {
        self.put_byte(b'{');
        emitter.emit(self);
        self.put_byte(b'}');
    }

    pub(crate) fn write_array<E: ArrayEmitter + ?Sized>(&mut self, emitter: &E) {
        self.put_byte(b'[');
        emitter.emit(self);
        self.put_byte(b']');
    }

    /// Append a value.
    pub fn add<T: Encode + ?Sized>(&mut self, value: &T) {
        self.live();
        self.separate();
        value.encode(self);
    }

    /// Append an object member.
    pub fn add_key<T: Encode + ?Sized>(&mut self, key: &str, value: &T) {
        self.live();
        self.write_key(key);
        value.encode(self);
    }

    /// Append a value unless it is empty (zero, `false`, `""`, `None`, `[]`).
    pub fn add_omit_empty<T: Encode + ?Sized>(&mut self, value: &T) {
        self.live();
        if !value.is_empty_value() {
            self.add(value);
        }
    }

    /// Append an object member unless its value is empty. Nothing is written,
    /// not even the key.
    pub fn add_key_omit_empty<T: Encode + ?Sized>(&mut self, key: &str, value: &T) {
        self.live();
        if !value.is_empty_value() {
            self.add_key(key, value);
        }
    }

    /// Append a value, or `null` when it is empty.
    pub fn add_null_empty<T: Encode + ?Sized>(&mut self, value: &T) {
        self.live();
        if value.is_empty_value() {
            self.add_null();
        } else {
            self.add(value);
        }
    }

    pub fn add_key_null_empty<T: Encode + ?Sized>(&mut self, key: &str, value: &T) {
        self.live();
        if value.is_empty_value() {
            self.add_null_key(key);
        } else {
            self.add_key(key, value);
        }
    }

    pub fn add_null(&mut self) {
        self.live();
        self.separate();
        self.put(b"null");
    }

    pub fn add_null_key(&mut self, key: &str) {
        self.live();
        self.write_key(key);
        self.put(b"null");
    }

    pub fn add_object<E: ObjectEmitter + ?Sized>(&mut self, emitter: &E) {
        self.live();
        self.separate();
        self.write_object(emitter);
    }

    pub fn add_object_key<E: ObjectEmitter + ?Sized>(&mut self, key: &str, emitter: &E) {
        self.live();
        self.write_key(key);
        self.write_object(emitter);
    }

    pub fn add_object_omit_empty<E: ObjectEmitter + ?Sized>(&mut self, emitter: &E) {
        self.live();
        if !emitter.is_empty() {
            self.add_object(emitter);
        }
    }

    pub fn add_object_key_omit_empty<E: ObjectEmitter + ?Sized>(&mut self, key: &str, emitter: &E) {
        self.live();
        if !emitter.is_empty() {
            self.add_object_key(key, emitter);
        }
    }

    pub fn add_object_null_empty<E: ObjectEmitter + ?Sized>(&mut self, emitter: &E) {
        self.live();
        if emitter.is_empty() {
            self.add_null();
        } else {
            self.add_object(emitter);
        }
    }

    pub fn add_object_key_null_empty<E: ObjectEmitter + ?Sized>(&mut self, key: &str, emitter: &E) {
        self.live();
        if emitter.is_empty() {
            self.add_null_key(key);
        } else {
            self.add_object_key(key, emitter);
        }
    }

    pub fn add_array<E: ArrayEmitter + ?Sized>(&mut self, emitter: &E) {
        self.live();
        self.separate();
        self.write_array(emitter);
    }

    pub fn add_array_key<E: ArrayEmitter + ?Sized>(&mut self, key: &str, emitter: &E) {
        self.live();
        self.write_key(key);
        self.write_array(emitter);
    }

    pub fn add_array_omit_empty<E: ArrayEmitter + ?Sized>(&mut self, emitter: &E) {
        self.live();
        if !emitter.is_empty() {
            self.add_array(emitter);
        }
    }

    pub fn add_array_key_omit_empty<E: ArrayEmitter + ?Sized>(&mut self, key: &str, emitter: &E) {
        self.live();
        if !emitter.is_empty() {
            self.add_array_key(key, emitter);
        }
    }

    pub fn add_array_null_empty<E: ArrayEmitter + ?Sized>(&mut self, emitter: &E) {
        self.live();
        if emitter.is_empty() {
            self.add_null();
        } else {
            self.add_array(emitter);
        }
    }

    pub fn add_array_key_null_empty<E: ArrayEmitter + ?Sized>(&mut self, key: &str, emitter: &E) {
        self.live();
        if emitter.is_empty() {
            self.add_null_key(key);
        } else {
            self.add_array_key(key, emitter);
        }
    }

    /// Append pre-encoded JSON as a value. The bytes are not validated.
    pub fn add_embedded_json(&mut self, json: &[u8]) {
        self.live();
        self.separate();
        self.put(json);
    }

    pub fn add_embedded_json_key(&mut self, key: &str, json: &[u8]) {
        self.live();
        self.write_key(key);
        self.put(json);
    }

    /// Append bytes as a standard Base64 string.
    #[cfg(feature = "base64")]
    pub fn add_base64(&mut self, data: &[u8]) {
        self.live();
        self.separate();
        self.write_base64(data);
    }

    #[cfg(feature = "base64")]
    pub fn add_base64_key(&mut self, key: &str, data: &[u8]) {
        self.live();
        self.write_key(key);
        self.write_base64(data);
    }

    #[cfg(feature = "base64")]
    fn write_base64(&mut self, data: &[u8]) {
        use base64::write::EncoderWriter;

        self.grow(data.len() / 3 * 4 + 6);
        self.buf.push(b'"');
        let mut writer =
            EncoderWriter::new(&mut self.buf, &base64::engine::general_purpose::STANDARD);
        let written = writer
            .write_all(data)
            .and_then(|()| writer.finish().map(drop));
        drop(writer);
        if let Err(e) = written {
            self.error.get_or_insert(Error::from(e));
        }
        self.buf.push(b'"');
    }

    /// Append bytes verbatim, without a separator.
    pub fn write_raw(&mut self, bytes: &[u8]) {
        self.live();
        self.put(bytes);
    }

    /// Encode a complete object and flush it to the sink, if any.
    pub fn encode_object<E: ObjectEmitter + ?Sized>(&mut self, emitter: &E) -> Result<()> {
        self.live();
        self.write_object(emitter);
        self.complete()
    }

    /// Encode a complete array and flush it to the sink, if any.
    pub fn encode_array<E: ArrayEmitter + ?Sized>(&mut self, emitter: &E) -> Result<()> {
        self.live();
        self.write_array(emitter);
        self.complete()
    }

    /// Encode a complete value and flush it to the sink, if any.
    pub fn encode<T: Encode + ?Sized>(&mut self, value: &T) -> Result<()> {
        self.live();
        value.encode(self);
        self.complete()
    }

    fn complete(&mut self) -> Result<()> {
        if self.sink.is_some() {
            self.flush()?;
        }
        match &self.error {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    /// Write the buffer to the sink and empty it. Returns the number of
    /// bytes written; `0` without a sink.
    pub fn flush(&mut self) -> Result<usize> {
        self.live();
        if let Some(err) = &self.error {
            return Err(err.clone());
        }
        let Some(sink) = self.sink.as_mut() else {
            return Ok(0);
        };
        let written = self.buf.len();
        if let Err(e) = sink.write_all(&self.buf).and_then(|_| sink.flush()) {
            let err = Error::from(e);
            self.error = Some(err.clone());
            return Err(err);
        }
        self.buf.clear();
        trace!("flushed {} bytes to sink", written);
        Ok(written)
    }

    /// Bytes encoded and not yet flushed.
    pub fn buffer(&self) -> &[u8] {
        self.live();
        &self.buf
    }

    pub fn len(&self) -> usize {
        self.live();
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.live();
        self.buf.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.live();
        self.buf.capacity()
    }

    /// Discard buffered bytes and any sticky error.
    pub fn reset(&mut self) {
        self.live();
        self.buf.clear();
        self.error = None;
    }

    /// The first sink error, if any.
    pub fn err(&self) -> Option<&Error> {
        self.live();
        self.error.as_ref()
    }

    /// Take the encoded bytes.
    pub fn into_bytes(mut self) -> Vec<u8> {
        self.live();
        mem::take(&mut self.buf)
    }
}

impl fmt::Debug for Encoder<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Encoder")
            .field("len", &self.buf.len())
            .field("capacity", &self.buf.capacity())
            .field("has_sink", &self.sink.is_some())
            .field("error", &self.error)
            .field("released", &self.released)
            .finish()
    }
}
