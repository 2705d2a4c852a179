// SPDX-License-Identifier: Apache-2.0

/// Pure helpers for JSON escape sequences, shared by the string decoder,
/// the streaming string reader and the encoder.
pub(crate) struct EscapeProcessor;

/// Replacement for lone or mismatched surrogates.
pub(crate) const REPLACEMENT_CHAR: char = '\u{FFFD}';

impl EscapeProcessor {
    /// Map the character after a backslash to the byte it stands for.
    /// Returns `None` for `u` and for anything that is not a JSON escape.
    pub fn process_simple_escape(escape_char: u8) -> Option<u8> {
        match escape_char {
            b'n' => Some(b'\n'),
            b't' => Some(b'\t'),
            b'r' => Some(b'\r'),
            b'\\' => Some(b'\\'),
            b'"' => Some(b'"'),
            b'/' => Some(b'/'),
            b'b' => Some(0x08),
            b'f' => Some(0x0C),
            _ => None,
        }
    }

    /// Numeric value (0-15) of a hexadecimal digit.
    pub fn hex_value(byte: u8) -> Option<u32> {
        match byte {
            b'0'..=b'9' => Some((byte - b'0') as u32),
            b'a'..=b'f' => Some((byte - b'a' + 10) as u32),
            b'A'..=b'F' => Some((byte - b'A' + 10) as u32),
            _ => None,
        }
    }

    /// Check if a Unicode codepoint is a high surrogate (0xD800-0xDBFF)
    pub fn is_high_surrogate(codepoint: u32) -> bool {
        (0xD800..=0xDBFF).contains(&codepoint)
    }

    /// Check if a Unicode codepoint is a low surrogate (0xDC00-0xDFFF)
    pub fn is_low_surrogate(codepoint: u32) -> bool {
        (0xDC00..=0xDFFF).contains(&codepoint)
    }

    /// Combine a high and low surrogate pair into a single codepoint.
    pub fn combine_surrogate_pair(high: u32, low: u32) -> u32 {
        debug_assert!(Self::is_high_surrogate(high) && Self::is_low_surrogate(low));
        0x10000 + ((high & 0x3FF) << 10) + (low & 0x3FF)
    }

    /// Append the UTF-8 encoding of `codepoint`, substituting U+FFFD for
    /// anything that is not a Unicode scalar value.
    pub fn push_codepoint(out: &mut Vec<u8>, codepoint: u32) {
        let ch = char::from_u32(codepoint).unwrap_or(REPLACEMENT_CHAR);
        let mut utf8 = [0u8; 4];
        out.extend_from_slice(ch.encode_utf8(&mut utf8).as_bytes());
    }

    /// Whether `byte` cannot be copied verbatim into a JSON string.
    #[inline]
    pub fn needs_escape(byte: u8) -> bool {
        byte < 0x20 || byte == b'"' || byte == b'\\'
    }

    /// Append `bytes` as the contents of a JSON string (no quotes).
    ///
    /// `"` and `\` are backslash-escaped, `\b \f \n \r \t` use their short
    /// forms and ESC is written as `\u001b`. Every other control byte is
    /// dropped from the output.
    pub fn escape_into(out: &mut Vec<u8>, bytes: &[u8]) {
        let mut start = 0;
        for (i, &byte) in bytes.iter().enumerate() {
            if !Self::needs_escape(byte) {
                continue;
            }
            out.extend_from_slice(&bytes[start..i]);
            start = i + 1;
            match byte {
                b'"' => out.extend_from_slice(b"\\\""),
                b'\\' => out.extend_from_slice(b"\\\\"),
                0x08 => out.extend_from_slice(b"\\b"),
                0x0C => out.extend_from_slice(b"\\f"),
                b'\n' => out.extend_from_slice(b"\\n"),
                b'\r' => out.extend_from_slice(b"\\r"),
                b'\t' => out.extend_from_slice(b"\\t"),
                0x1B => out.extend_from_slice(b"\\u001b"),
                _ => {}
            }
        }
        out.extend_from_slice(&bytes[start..]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn escaped(input: &str) -> String {
        let mut out = Vec::new();
        EscapeProcessor::escape_into(&mut out, input.as_bytes());
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_simple_escapes() {
        assert_eq!(EscapeProcessor::process_simple_escape(b'n'), Some(b'\n'));
        assert_eq!(EscapeProcessor::process_simple_escape(b't'), Some(b'\t'));
        assert_eq!(EscapeProcessor::process_simple_escape(b'r'), Some(b'\r'));
        assert_eq!(EscapeProcessor::process_simple_escape(b'\\'), Some(b'\\'));
        assert_eq!(EscapeProcessor::process_simple_escape(b'"'), Some(b'"'));
        assert_eq!(EscapeProcessor::process_simple_escape(b'/'), Some(b'/'));
        assert_eq!(EscapeProcessor::process_simple_escape(b'b'), Some(0x08));
        assert_eq!(EscapeProcessor::process_simple_escape(b'f'), Some(0x0C));
    }

    #[test]
    fn test_invalid_simple_escape() {
        assert_eq!(EscapeProcessor::process_simple_escape(b'x'), None);
        assert_eq!(EscapeProcessor::process_simple_escape(b'u'), None);
        assert_eq!(EscapeProcessor::process_simple_escape(b'1'), None);
    }

    #[test]
    fn test_hex_digit_validation() {
        assert_eq!(EscapeProcessor::hex_value(b'0'), Some(0));
        assert_eq!(EscapeProcessor::hex_value(b'9'), Some(9));
        assert_eq!(EscapeProcessor::hex_value(b'a'), Some(10));
        assert_eq!(EscapeProcessor::hex_value(b'F'), Some(15));
        assert_eq!(EscapeProcessor::hex_value(b'g'), None);
        assert_eq!(EscapeProcessor::hex_value(b' '), None);
    }

    #[test]
    fn test_surrogate_pair() {
        assert!(EscapeProcessor::is_high_surrogate(0xD834));
        assert!(!EscapeProcessor::is_high_surrogate(0xDD1E));
        assert!(EscapeProcessor::is_low_surrogate(0xDD1E));
        // U+1D11E MUSICAL SYMBOL G CLEF
        assert_eq!(
            EscapeProcessor::combine_surrogate_pair(0xD834, 0xDD1E),
            0x1D11E
        );
    }

    #[test]
    fn test_push_codepoint_replaces_surrogates() {
        let mut out = Vec::new();
        EscapeProcessor::push_codepoint(&mut out, 0x03B1);
        EscapeProcessor::push_codepoint(&mut out, 0xD800);
        assert_eq!(out, "α\u{FFFD}".as_bytes());
    }

    #[test]
    fn test_escape_quotes_and_backslash() {
        assert_eq!(escaped(r#"say "hi"\now"#), r#"say \"hi\"\\now"#);
        assert_eq!(escaped("plain"), "plain");
        assert_eq!(escaped(""), "");
    }

    #[test]
    fn test_escape_short_forms() {
        assert_eq!(escaped("a\nb\tc\rd\u{8}e\u{c}"), r"a\nb\tc\rd\be\f");
    }

    #[test]
    fn test_escape_control_drop_list() {
        assert_eq!(escaped("a\u{0}\u{7}\u{b}\u{e}\u{1a}\u{1c}\u{1f}b"), "ab");
        assert_eq!(escaped("\u{1b}[0m"), r"\u001b[0m");
    }

    #[test]
    fn test_escape_keeps_multibyte_utf8() {
        assert_eq!(escaped("héllo ✓"), "héllo ✓");
    }
}
