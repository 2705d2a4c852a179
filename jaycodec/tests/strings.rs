// SPDX-License-Identifier: Apache-2.0

//! String escapes in both directions, surrogate handling and streamed
//! string access.

use std::io::Read;

use jaycodec::{ArrayFn, ChunkReader, Config, Decoder, Encoder, Error};

fn decode_string(json: &[u8]) -> jaycodec::Result<String> {
    let mut out = String::new();
    jaycodec::decode_scalar(json, &mut out)?;
    Ok(out)
}

#[test_log::test]
fn test_simple_escapes() {
    assert_eq!(decode_string(br#""a\"b""#).unwrap(), "a\"b");
    assert_eq!(
        decode_string(br#""\\ \/ \b \f \n \r \t""#).unwrap(),
        "\\ / \u{8} \u{c} \n \r \t"
    );
}

#[test_log::test]
fn test_unicode_escapes() {
    assert_eq!(decode_string(br#""\u0041""#).unwrap(), "A");
    assert_eq!(decode_string(br#""\u00e9t\u00E9""#).unwrap(), "\u{e9}t\u{e9}");
    assert_eq!(decode_string(br#""\uD83D\uDE00""#).unwrap(), "\u{1F600}");
}

#[test_log::test]
fn test_lone_high_surrogate_without_desync() {
    let mut dec = Decoder::from_slice(br#"["\uD834", "next", 3]"#);
    let mut strings = Vec::new();
    let mut number = 0u8;
    dec.array(&mut ArrayFn::new(|d: &mut Decoder<'_>| {
        if strings.len() < 2 {
            let mut s = String::new();
            d.string(&mut s)?;
            strings.push(s);
        } else {
            number = d.u8()?;
        }
        Ok(())
    }))
    .unwrap();
    dec.finish().unwrap();
    assert_eq!(strings, ["\u{FFFD}", "next"]);
    assert_eq!(strings[0].chars().count(), 1);
    assert_eq!(number, 3);
}

#[test_log::test]
fn test_raw_utf8_passes_through() {
    let json = "\"gr\u{fc}\u{df}e \u{1F44B}\"";
    assert_eq!(
        decode_string(json.as_bytes()).unwrap(),
        "gr\u{fc}\u{df}e \u{1F44B}"
    );
}

#[test_log::test]
fn test_invalid_utf8_is_soft() {
    let mut dec = Decoder::from_slice(b"[\"\xff\xfe\", \"ok\"]");
    let mut out: Vec<String> = Vec::new();
    dec.decode(&mut out).unwrap();
    assert_eq!(out, ["", "ok"]);
    assert!(matches!(dec.finish(), Err(Error::InvalidUtf8 { offset: 1 })));
}

#[test_log::test]
fn test_bad_escapes_are_fatal() {
    assert!(matches!(
        decode_string(br#""abc\x""#),
        Err(Error::InvalidEscape { offset: 4 })
    ));
    assert!(matches!(
        decode_string(br#""\u12G4""#),
        Err(Error::InvalidUnicodeHex { offset: 5 })
    ));
    assert!(matches!(
        decode_string(br#""unterminated"#),
        Err(Error::UnexpectedEnd { .. })
    ));
}

#[test_log::test]
fn test_escaped_strings_across_refills() {
    let json = br#"["first \"quoted\" \u00e9", "\uD834\uDD1E tail", "plain"]"#;
    for chunk in 1..6 {
        let mut dec = Decoder::with_config(
            ChunkReader::new(json, chunk),
            &Config::default().with_buffer_size(3),
        );
        let mut out: Vec<String> = Vec::new();
        dec.decode(&mut out).unwrap();
        assert_eq!(
            out,
            ["first \"quoted\" \u{e9}", "\u{1D11E} tail", "plain"],
            "chunk {}",
            chunk
        );
    }
}

#[test_log::test]
fn test_encoder_escapes_round_trip() {
    let original = "quote \" backslash \\ newline \n tab \t esc \u{1b} \u{e9}\u{1F600}";
    let json = jaycodec::encode_scalar(original).unwrap();
    assert_eq!(
        json,
        "\"quote \\\" backslash \\\\ newline \\n tab \\t esc \\u001b \u{e9}\u{1F600}\"".as_bytes()
    );
    assert_eq!(decode_string(&json).unwrap(), original);
}

#[test_log::test]
fn test_encoder_escapes_keys() {
    let mut enc = Encoder::new();
    enc.encode_object(&jaycodec::ObjectEmitFn::new(|e| e.add_key("a\"b", &1u8)))
        .unwrap();
    assert_eq!(enc.buffer(), br#"{"a\"b":1}"#);
}

#[test_log::test]
fn test_string_reader_large_value_small_buffer() {
    let body = "0123456789\\n".repeat(200);
    let json = format!("{{\"blob\": \"{}\", \"n\": 1}}", body);
    let mut dec = Decoder::with_config(
        ChunkReader::new(json.as_bytes(), 16),
        &Config::default().with_buffer_size(16),
    );
    let mut text = String::new();
    let mut n = 0u8;
    dec.object(&mut jaycodec::ObjectFn::new(|d: &mut Decoder<'_>, key: &str| {
        match key {
            "blob" => {
                d.string_reader()?
                    .read_to_string(&mut text)
                    .map_err(Error::from)?;
            }
            "n" => n = d.u8()?,
            _ => {}
        }
        Ok(())
    }))
    .unwrap();
    assert_eq!(text, "0123456789\n".repeat(200));
    assert_eq!(n, 1);
    assert!(dec.capacity() < 1024, "buffer grew to {}", dec.capacity());
}

#[cfg(feature = "base64")]
#[test_log::test]
fn test_base64_round_trip() {
    let data: Vec<u8> = (0u8..=255).collect();
    let mut enc = Encoder::new();
    enc.encode_object(&jaycodec::ObjectEmitFn::new(|e| e.add_base64_key("bin", &data)))
        .unwrap();

    let mut back = Vec::new();
    let mut dec = Decoder::from_slice(enc.buffer());
    dec.object(&mut jaycodec::ObjectFn::new(|d: &mut Decoder<'_>, key: &str| {
        if key == "bin" {
            d.base64_reader()?
                .read_to_end(&mut back)
                .map_err(Error::from)?;
        }
        Ok(())
    }))
    .unwrap();
    assert_eq!(back, data);
}
