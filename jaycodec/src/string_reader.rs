// SPDX-License-Identifier: Apache-2.0

//! Streaming access to a single string value.

use std::io;

use crate::copy_on_escape::{Step, Unescaper};
use crate::decoder::Decoder;
use crate::error::Result;

/// An [`io::Read`] over the unescaped contents of one JSON string.
///
/// The string is unescaped piece by piece as the caller reads, so a large
/// value never has to be held in memory as a whole. Malformed escapes and
/// truncated input surface as [`io::ErrorKind::InvalidData`] errors wrapping
/// the decoder [`Error`](crate::Error). Dropping the reader early skips the
/// rest of the string.
pub struct StringReader<'d, 'r> {
    dec: &'d mut Decoder<'r>,
    unescaper: Unescaper,
    pending: Vec<u8>,
    offset: usize,
    done: bool,
}

impl<'d, 'r> StringReader<'d, 'r> {
    fn new(dec: &'d mut Decoder<'r>, done: bool) -> Self {
        Self {
            dec,
            unescaper: Unescaper::default(),
            pending: Vec::new(),
            offset: 0,
            done,
        }
    }

    fn step(&mut self) -> Result<()> {
        self.pending.clear();
        self.offset = 0;
        // No offsets into the input are held between steps.
        self.dec.input.release_consumed();
        if self.unescaper.step(&mut self.dec.input, &mut self.pending)? == Step::Closed {
            self.done = true;
        }
        Ok(())
    }
}

impl io::Read for StringReader<'_, '_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        while self.offset == self.pending.len() && !self.done {
            self.step()
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        }
        let available = &self.pending[self.offset..];
        let n = available.len().min(buf.len());
        buf[..n].copy_from_slice(&available[..n]);
        self.offset += n;
        Ok(n)
    }
}

impl Drop for StringReader<'_, '_> {
    fn drop(&mut self) {
        while !self.done {
            if self.step().is_err() {
                break;
            }
        }
    }
}

impl<'r> Decoder<'r> {
    /// Stream the next string value through an [`io::Read`].
    ///
    /// `null` gives an empty reader. Any other non-string value records a
    /// soft type error, is skipped, and also gives an empty reader.
    ///
    /// # Example
    /// ```
    /// use std::io::Read;
    /// use jaycodec::Decoder;
    ///
    /// let mut dec = Decoder::from_slice(br#""line one\nline two""#);
    /// let mut text = String::new();
    /// dec.string_reader().unwrap().read_to_string(&mut text).unwrap();
    /// assert_eq!(text, "line one\nline two");
    /// ```
    pub fn string_reader(&mut self) -> Result<StringReader<'_, 'r>> {
        let open = self.begin_string_reader()?;
        Ok(StringReader::new(self, !open))
    }

    /// Stream the next string value through a standard Base64 decoder.
    #[cfg(feature = "base64")]
    pub fn base64_reader(
        &mut self,
    ) -> Result<
        base64::read::DecoderReader<
            'static,
            base64::engine::GeneralPurpose,
            StringReader<'_, 'r>,
        >,
    > {
        let reader = self.string_reader()?;
        Ok(base64::read::DecoderReader::new(
            reader,
            &base64::engine::general_purpose::STANDARD,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ChunkReader, Config, Error, ObjectFn};
    use std::io::Read;

    #[test]
    fn test_reads_escaped_string_in_small_pieces() {
        let json = br#"{"body": "a\"b\u0041\uD834\uDD1E end", "n": 3}"#;
        let mut dec = Decoder::with_config(
            ChunkReader::new(json, 2),
            &Config::default().with_buffer_size(4),
        );
        let mut body = Vec::new();
        let mut n = 0u8;
        dec.object(&mut ObjectFn::new(|d: &mut Decoder<'_>, key: &str| match key {
            "body" => {
                let mut reader = d.string_reader()?;
                let mut chunk = [0u8; 3];
                loop {
                    let got = reader.read(&mut chunk).map_err(Error::from)?;
                    if got == 0 {
                        break;
                    }
                    body.extend_from_slice(&chunk[..got]);
                }
                Ok(())
            }
            "n" => d.decode(&mut n),
            _ => Ok(()),
        }))
        .unwrap();
        assert_eq!(body, "a\"bA\u{1D11E} end".as_bytes());
        assert_eq!(n, 3);
    }

    #[test]
    fn test_null_and_mismatch_give_empty_reader() {
        let mut dec = Decoder::from_slice(b"null 12");
        let mut out = String::new();
        dec.string_reader().unwrap().read_to_string(&mut out).unwrap();
        assert!(out.is_empty());
        dec.string_reader().unwrap().read_to_string(&mut out).unwrap();
        assert!(out.is_empty());
        assert!(matches!(
            dec.finish(),
            Err(Error::TypeMismatch {
                expected: "string",
                ..
            })
        ));
    }

    #[test]
    fn test_dropping_early_skips_rest() {
        let mut dec = Decoder::from_slice(br#""abcdef\n" 7"#);
        {
            let mut reader = dec.string_reader().unwrap();
            let mut one = [0u8; 1];
            reader.read_exact(&mut one).unwrap();
            assert_eq!(&one, b"a");
        }
        assert_eq!(dec.i64().unwrap(), 7);
    }

    #[test]
    fn test_invalid_escape_is_io_error() {
        let mut dec = Decoder::from_slice(br#""ab\q""#);
        let mut out = Vec::new();
        let err = dec.string_reader().unwrap().read_to_end(&mut out).unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::InvalidData);
    }

    #[cfg(feature = "base64")]
    #[test]
    fn test_base64_reader() {
        let mut dec = Decoder::from_slice(br#""aGVsbG8gd29ybGQ=""#);
        let mut out = Vec::new();
        dec.base64_reader().unwrap().read_to_end(&mut out).unwrap();
        assert_eq!(out, b"hello world");
    }
}
