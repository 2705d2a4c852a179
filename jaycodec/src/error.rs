// SPDX-License-Identifier: Apache-2.0

use std::io;
use std::sync::Arc;

use thiserror::Error;

use crate::cursor::ValueKind;

/// Errors produced while decoding or encoding JSON.
///
/// Errors fall into two classes. *Fatal* errors (malformed syntax, truncated
/// input, I/O failures) stop the current call immediately. *Soft* errors
/// (a well-formed value of the wrong type, a numeric overflow, a string that
/// is not UTF-8) are recorded on the decoder, the offending value is skipped
/// and decoding carries on with its siblings. See [`Error::is_fatal`].
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// A byte that cannot start or continue a JSON token.
    #[error("invalid JSON: unexpected character {found:?} at offset {offset}")]
    InvalidJson { found: char, offset: usize },
    /// Input ended in the middle of a value.
    #[error("unexpected end of input at offset {offset}")]
    UnexpectedEnd { offset: usize },
    /// A backslash followed by a character that is not a JSON escape.
    #[error("invalid escape sequence at offset {offset}")]
    InvalidEscape { offset: usize },
    /// A `\u` escape with a non-hexadecimal digit.
    #[error("invalid hex digit in unicode escape at offset {offset}")]
    InvalidUnicodeHex { offset: usize },
    /// A well-formed value of a different kind than the destination expects.
    #[error("cannot decode {found} into {expected} at offset {offset}")]
    TypeMismatch {
        expected: &'static str,
        found: ValueKind,
        offset: usize,
    },
    /// A number that does not fit the destination type.
    #[error("number out of range for {target} at offset {offset}")]
    Overflow { target: &'static str, offset: usize },
    /// A string value whose decoded bytes are not valid UTF-8.
    #[error("string is not valid UTF-8 at offset {offset}")]
    InvalidUtf8 { offset: usize },
    /// Error from the underlying reader or writer.
    #[error("i/o error: {0}")]
    Io(Arc<io::Error>),
    /// A stream deadline passed before the stream finished.
    #[error("stream deadline exceeded")]
    Timeout,
    /// Error raised by a caller-supplied visitor, emitter or stream source.
    #[error("{0}")]
    Custom(String),
}

impl Error {
    /// Build a [`Error::Custom`] from anything displayable.
    pub fn custom(msg: impl std::fmt::Display) -> Self {
        Error::Custom(msg.to_string())
    }

    /// Returns `false` for the soft errors that decoding records and steps
    /// over, `true` for everything that aborts the current call.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            Error::TypeMismatch { .. } | Error::Overflow { .. } | Error::InvalidUtf8 { .. }
        )
    }

    pub(crate) fn invalid_byte(byte: u8, offset: usize) -> Self {
        Error::InvalidJson {
            found: char::from(byte),
            offset,
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::Io(Arc::new(err))
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = core::result::Result<T, Error>;

/// Accumulator for soft decode errors. The first recorded error wins.
#[derive(Debug, Default)]
pub(crate) struct SoftError(Option<Error>);

impl SoftError {
    pub fn record(&mut self, err: Error) {
        if self.0.is_none() {
            self.0 = Some(err);
        }
    }

    pub fn get(&self) -> Option<&Error> {
        self.0.as_ref()
    }

    pub fn take(&mut self) -> Option<Error> {
        self.0.take()
    }
}
