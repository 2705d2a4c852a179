// SPDX-License-Identifier: Apache-2.0

//! Encoder output: separators, empty composites, omit-empty and
//! null-empty variants, sinks and buffer growth.

use std::io;

use jaycodec::{
    ArrayEmitFn, ArrayEmitter, Encoder, Error, ObjectEmitFn, ObjectEmitter,
};

struct Profile {
    name: String,
    age: u8,
    tags: Vec<String>,
    manager: Option<Box<Profile>>,
    score: f64,
}

impl ObjectEmitter for Profile {
    fn emit(&self, enc: &mut Encoder<'_>) {
        enc.add_key("name", &self.name);
        enc.add_key_omit_empty("age", &self.age);
        enc.add_key_omit_empty("tags", &self.tags);
        match &self.manager {
            Some(manager) => enc.add_object_key("manager", &**manager),
            None => enc.add_null_key("manager"),
        }
        enc.add_key("score", &self.score);
    }
}

#[test_log::test]
fn test_nested_object() {
    let profile = Profile {
        name: "Ada".into(),
        age: 36,
        tags: vec!["math".into(), "engines".into()],
        manager: Some(Box::new(Profile {
            name: "Charles".into(),
            age: 0,
            tags: Vec::new(),
            manager: None,
            score: 0.5,
        })),
        score: 9.75,
    };
    let json = jaycodec::encode_object(&profile).unwrap();
    assert_eq!(
        String::from_utf8(json).unwrap(),
        r#"{"name":"Ada","age":36,"tags":["math","engines"],"manager":{"name":"Charles","manager":null,"score":0.5},"score":9.75}"#
    );
}

#[test_log::test]
fn test_empty_composites() {
    assert_eq!(
        jaycodec::encode_object(&ObjectEmitFn::new(|_| {})).unwrap(),
        b"{}"
    );
    assert_eq!(
        jaycodec::encode_array(&ArrayEmitFn::new(|_| {})).unwrap(),
        b"[]"
    );
    assert_eq!(jaycodec::encode_scalar(&Vec::<u8>::new()).unwrap(), b"[]");
}

#[test_log::test]
fn test_omit_empty_writes_nothing() {
    let empty_obj = ObjectEmitFn::new(|_| {}).with_empty(true);
    let empty_arr = ArrayEmitFn::new(|_| {}).with_empty(true);
    let json = jaycodec::encode_object(&ObjectEmitFn::new(|e| {
        e.add_key_omit_empty("s", "");
        e.add_key_omit_empty("n", &0i64);
        e.add_key_omit_empty("b", &false);
        e.add_key_omit_empty("o", &None::<u8>);
        e.add_object_key_omit_empty("obj", &empty_obj);
        e.add_array_key_omit_empty("arr", &empty_arr);
    }))
    .unwrap();
    assert_eq!(json, b"{}");

    let json = jaycodec::encode_array(&ArrayEmitFn::new(|e| {
        e.add_omit_empty("");
        e.add(&1u8);
        e.add_omit_empty(&0u32);
        e.add_object_omit_empty(&empty_obj);
        e.add_array_omit_empty(&empty_arr);
        e.add(&2u8);
    }))
    .unwrap();
    assert_eq!(json, b"[1,2]");
}

#[test_log::test]
fn test_null_empty_writes_null() {
    let empty_obj = ObjectEmitFn::new(|_| {}).with_empty(true);
    let empty_arr = ArrayEmitFn::new(|_| {}).with_empty(true);
    let json = jaycodec::encode_object(&ObjectEmitFn::new(|e| {
        e.add_key_null_empty("s", "");
        e.add_object_key_null_empty("obj", &empty_obj);
        e.add_array_key_null_empty("arr", &empty_arr);
        e.add_key_null_empty("full", "x");
    }))
    .unwrap();
    assert_eq!(json, br#"{"s":null,"obj":null,"arr":null,"full":"x"}"#);

    let json = jaycodec::encode_array(&ArrayEmitFn::new(|e| {
        e.add_null_empty(&0u8);
        e.add_object_null_empty(&empty_obj);
        e.add_array_null_empty(&empty_arr);
        e.add_null();
    }))
    .unwrap();
    assert_eq!(json, b"[null,null,null,null]");
}

struct Grid(Vec<Vec<i32>>);

impl ArrayEmitter for Grid {
    fn emit(&self, enc: &mut Encoder<'_>) {
        for row in &self.0 {
            enc.add_array(&ArrayEmitFn::new(|e| {
                for cell in row {
                    e.add(cell);
                }
            }));
        }
    }

    fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[test_log::test]
fn test_separators_in_nested_arrays() {
    let grid = Grid(vec![vec![1, -2], vec![], vec![3]]);
    assert_eq!(jaycodec::encode_array(&grid).unwrap(), b"[[1,-2],[],[3]]");
}

#[test_log::test]
fn test_embedded_json_and_raw() {
    let mut enc = Encoder::new();
    enc.encode_object(&ObjectEmitFn::new(|e| {
        e.add_embedded_json_key("cfg", br#"{"a":[1,2]}"#);
        e.add_key("n", &1u8);
    }))
    .unwrap();
    assert_eq!(enc.buffer(), br#"{"cfg":{"a":[1,2]},"n":1}"#);

    enc.reset();
    enc.add_embedded_json(b"true");
    enc.add_embedded_json(b"[]");
    enc.write_raw(b"\n");
    assert_eq!(enc.buffer(), b"true,[]\n");
}

#[test_log::test]
fn test_consecutive_values_are_separated() {
    let mut enc = Encoder::new();
    enc.add(&1u8);
    enc.add("two");
    enc.add_null();
    assert_eq!(enc.buffer(), br#"1,"two",null"#);
}

#[test_log::test]
fn test_writer_sink_flushes_each_value() {
    let mut out = Vec::new();
    {
        let mut enc = Encoder::with_writer(&mut out);
        enc.encode(&[1u8, 2][..]).unwrap();
        assert!(enc.is_empty());
        enc.encode_object(&ObjectEmitFn::new(|e| e.add_key("k", "v")))
            .unwrap();
    }
    assert_eq!(out, br#"[1,2]{"k":"v"}"#);
}

struct BrokenPipe;

impl io::Write for BrokenPipe {
    fn write(&mut self, _: &[u8]) -> io::Result<usize> {
        Err(io::Error::new(io::ErrorKind::BrokenPipe, "peer gone"))
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[test_log::test]
fn test_sink_error_is_sticky() {
    let mut enc = Encoder::with_writer(BrokenPipe);
    assert!(matches!(enc.encode(&1u8), Err(Error::Io(_))));
    assert!(matches!(enc.encode(&2u8), Err(Error::Io(_))));
    assert!(enc.err().is_some());
    enc.reset();
    assert!(enc.err().is_none());
}

#[test_log::test]
fn test_capacity_grows_to_fit() {
    let mut enc = Encoder::with_capacity(4);
    let long = "x".repeat(1000);
    enc.add(long.as_str());
    assert_eq!(enc.len(), 1002);
    assert!(enc.capacity() >= 1002);
    let before = enc.capacity();
    enc.reset();
    assert_eq!(enc.capacity(), before);
}

#[cfg(feature = "base64")]
#[test_log::test]
fn test_base64_values() {
    let json = jaycodec::encode_array(&ArrayEmitFn::new(|e| {
        e.add_base64(b"hello");
        e.add_base64(b"");
    }))
    .unwrap();
    assert_eq!(json, br#"["aGVsbG8=",""]"#);
}
