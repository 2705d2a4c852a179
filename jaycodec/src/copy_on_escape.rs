// SPDX-License-Identifier: Apache-2.0

//! Copy-on-escape string decoding.
//!
//! A string without backslashes is returned as a range of the input buffer
//! and never copied. The first backslash switches to the scratch buffer:
//! the bytes seen so far are copied once and the rest of the string is
//! unescaped into it.

use crate::cursor::InputBuffer;
use crate::error::{Error, Result};
use crate::escape_processor::{EscapeProcessor, REPLACEMENT_CHAR};

/// Where the decoded bytes of a string ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum StringBytes {
    /// Unescaped bytes at `input.buf[start..end]`.
    Input { start: usize, end: usize },
    /// Unescaped bytes are the whole scratch buffer.
    Scratch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Step {
    More,
    Closed,
}

/// Incremental unescaper. Holds a high surrogate across `\u` escapes so a
/// pair split over two calls still combines.
#[derive(Debug, Default)]
pub(crate) struct Unescaper {
    pending_high: Option<u32>,
}

impl Unescaper {
    /// Decode the next literal run or escape sequence at the cursor into
    /// `out`. Returns [`Step::Closed`] after consuming the closing quote.
    pub fn step(&mut self, input: &mut InputBuffer<'_>, out: &mut Vec<u8>) -> Result<Step> {
        let Some(byte) = input.peek()? else {
            return Err(Error::UnexpectedEnd {
                offset: input.offset(),
            });
        };
        match byte {
            b'"' => {
                input.advance();
                self.flush_pending(out);
                Ok(Step::Closed)
            }
            b'\\' => {
                let at = input.offset();
                input.advance();
                let escape = input.next_required()?;
                if escape == b'u' {
                    let codepoint = read_hex4(input)?;
                    self.unicode(codepoint, out);
                } else {
                    self.flush_pending(out);
                    let unescaped = EscapeProcessor::process_simple_escape(escape)
                        .ok_or(Error::InvalidEscape { offset: at })?;
                    out.push(unescaped);
                }
                Ok(Step::More)
            }
            _ => {
                self.flush_pending(out);
                out.extend_from_slice(input.take_plain_run());
                Ok(Step::More)
            }
        }
    }

    fn unicode(&mut self, codepoint: u32, out: &mut Vec<u8>) {
        if let Some(high) = self.pending_high.take() {
            if EscapeProcessor::is_low_surrogate(codepoint) {
                let combined = EscapeProcessor::combine_surrogate_pair(high, codepoint);
                EscapeProcessor::push_codepoint(out, combined);
                return;
            }
            push_replacement(out);
        }
        if EscapeProcessor::is_high_surrogate(codepoint) {
            self.pending_high = Some(codepoint);
        } else {
            // Lone low surrogates come out as U+FFFD here too.
            EscapeProcessor::push_codepoint(out, codepoint);
        }
    }

    fn flush_pending(&mut self, out: &mut Vec<u8>) {
        if self.pending_high.take().is_some() {
            push_replacement(out);
        }
    }
}

fn push_replacement(out: &mut Vec<u8>) {
    EscapeProcessor::push_codepoint(out, REPLACEMENT_CHAR as u32);
}

fn read_hex4(input: &mut InputBuffer<'_>) -> Result<u32> {
    let mut codepoint = 0u32;
    for _ in 0..4 {
        let at = input.offset();
        let byte = input.next_required()?;
        let digit =
            EscapeProcessor::hex_value(byte).ok_or(Error::InvalidUnicodeHex { offset: at })?;
        codepoint = (codepoint << 4) | digit;
    }
    Ok(codepoint)
}

/// Read a string body whose opening quote has already been consumed,
/// leaving the cursor after the closing quote.
pub(crate) fn read_string(input: &mut InputBuffer<'_>, scratch: &mut Vec<u8>) -> Result<StringBytes> {
    let start = input.pos;
    loop {
        input.take_plain_run();
        match input.peek()? {
            Some(b'"') => {
                let end = input.pos;
                input.advance();
                return Ok(StringBytes::Input { start, end });
            }
            Some(b'\\') => break,
            // Refilled; keep scanning.
            Some(_) => continue,
            None => {
                return Err(Error::UnexpectedEnd {
                    offset: input.offset(),
                })
            }
        }
    }
    scratch.clear();
    scratch.extend_from_slice(&input.buf[start..input.pos]);
    let mut unescaper = Unescaper::default();
    while unescaper.step(input, scratch)? == Step::More {}
    Ok(StringBytes::Scratch)
}
