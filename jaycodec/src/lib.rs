// SPDX-License-Identifier: Apache-2.0

//! A visitor-driven JSON codec.
//!
//! Decoding pull-parses bytes straight into caller types: there is no
//! intermediate tree and no reflection. Objects and arrays are handed to
//! [`ObjectVisitor`] / [`ArrayVisitor`] implementations one member at a
//! time, scalars go through the typed primitives on [`Decoder`]. Encoding
//! is the mirror image, through [`ObjectEmitter`] / [`ArrayEmitter`] and the
//! add-style calls on [`Encoder`].
//!
//! Decoder and encoder storage can be recycled through a [`Pool`], and the
//! stream types decode open-ended value sequences or fan encoding out over
//! worker threads.
//!
//! ```
//! use jaycodec::{ArrayFn, Decoder, ObjectEmitFn, ObjectFn};
//!
//! let mut a = 0i64;
//! let mut b = Vec::new();
//! jaycodec::decode_object(
//!     br#"{"a": 1, "b": [1, 2, 3]}"#,
//!     &mut ObjectFn::new(|d: &mut Decoder<'_>, key: &str| match key {
//!         "a" => d.decode(&mut a),
//!         "b" => d.array(&mut ArrayFn::new(|d: &mut Decoder<'_>| {
//!             b.push(d.i64()?);
//!             Ok(())
//!         })),
//!         _ => Ok(()),
//!     }),
//! )
//! .unwrap();
//! assert_eq!((a, b), (1, vec![1, 2, 3]));
//!
//! let json = jaycodec::encode_object(&ObjectEmitFn::new(|e| {
//!     e.add_key("a", &1u8);
//!     e.add_key("b", &[1u8, 2, 3][..]);
//! }))
//! .unwrap();
//! assert_eq!(json, br#"{"a":1,"b":[1,2,3]}"#);
//! ```

mod cancel;
mod chunk_reader;
mod config;
mod copy_on_escape;
mod cursor;
mod decoder;
mod emitter;
mod encoder;
mod error;
mod escape_processor;
mod int_parser;
mod number_parser;
mod number_writer;
mod pool;
mod stream_decoder;
mod stream_encoder;
mod string_reader;
mod visitor;

pub use cancel::Cancellation;
pub use chunk_reader::ChunkReader;
pub use config::Config;
pub use cursor::ValueKind;
pub use decoder::Decoder;
pub use emitter::{ArrayEmitFn, ArrayEmitter, Encode, ObjectEmitFn, ObjectEmitter};
pub use encoder::Encoder;
pub use error::{Error, Result};
pub use pool::Pool;
pub use stream_decoder::{StreamDecoder, ValueSink};
pub use stream_encoder::{Delimiter, StreamEncoder, StreamWriter, ValueSource};
pub use string_reader::StringReader;
pub use visitor::{ArrayFn, ArrayVisitor, Decode, ObjectFn, ObjectVisitor};

/// Run `f` on a decoder borrowed from the global pool, then report the
/// first soft error and return the storage.
fn with_pooled_decoder(data: &[u8], f: impl FnOnce(&mut Decoder<'_>) -> Result<()>) -> Result<()> {
    let mut dec = Pool::global().borrow_decoder_slice(data);
    let result = f(&mut dec).and_then(|()| dec.finish());
    dec.release();
    result
}

/// Decode a complete JSON object from `data` into `visitor`.
///
/// Returns the first fatal error, or else the first soft error recorded
/// while decoding. Bytes after the object are ignored.
pub fn decode_object<V: ObjectVisitor + ?Sized>(data: &[u8], visitor: &mut V) -> Result<()> {
    with_pooled_decoder(data, |dec| dec.object(visitor))
}

/// Decode a complete JSON array from `data` into `visitor`.
pub fn decode_array<V: ArrayVisitor + ?Sized>(data: &[u8], visitor: &mut V) -> Result<()> {
    with_pooled_decoder(data, |dec| dec.array(visitor))
}

/// Decode a single value of any [`Decode`] type from `data`.
///
/// ```
/// let mut n = 0u16;
/// jaycodec::decode_scalar(b" 512 ", &mut n).unwrap();
/// assert_eq!(n, 512);
///
/// let err = jaycodec::decode_scalar(b"70000", &mut n).unwrap_err();
/// assert!(matches!(err, jaycodec::Error::Overflow { .. }));
/// assert_eq!(n, 0);
/// ```
pub fn decode_scalar<T: Decode + ?Sized>(data: &[u8], value: &mut T) -> Result<()> {
    with_pooled_decoder(data, |dec| dec.decode(value))
}

fn with_pooled_encoder(f: impl FnOnce(&mut Encoder<'_>) -> Result<()>) -> Result<Vec<u8>> {
    let mut enc = Pool::global().borrow_buffer_encoder();
    let result = f(&mut enc).map(|()| enc.buffer().to_vec());
    enc.release();
    result
}

/// Encode `emitter` as a JSON object.
pub fn encode_object<E: ObjectEmitter + ?Sized>(emitter: &E) -> Result<Vec<u8>> {
    with_pooled_encoder(|enc| enc.encode_object(emitter))
}

/// Encode `emitter` as a JSON array.
pub fn encode_array<E: ArrayEmitter + ?Sized>(emitter: &E) -> Result<Vec<u8>> {
    with_pooled_encoder(|enc| enc.encode_array(emitter))
}

/// Encode any [`Encode`] value.
///
/// ```
/// assert_eq!(jaycodec::encode_scalar("a\"b").unwrap(), br#""a\"b""#);
/// assert_eq!(jaycodec::encode_scalar(&f64::INFINITY).unwrap(), b"null");
/// ```
pub fn encode_scalar<T: Encode + ?Sized>(value: &T) -> Result<Vec<u8>> {
    with_pooled_encoder(|enc| enc.encode(value))
}
