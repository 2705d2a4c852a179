// SPDX-License-Identifier: Apache-2.0

//! Encode-side capability traits and their closure adapters.

use crate::encoder::Encoder;
use crate::number_writer;

/// Writes the members of a JSON object, typically with
/// [`Encoder::add_key`] and friends.
pub trait ObjectEmitter {
    fn emit(&self, enc: &mut Encoder<'_>);

    /// Whether the omit-empty / null-empty variants treat this as empty.
    fn is_empty(&self) -> bool {
        false
    }
}

/// Writes the elements of a JSON array, typically with [`Encoder::add`].
pub trait ArrayEmitter {
    fn emit(&self, enc: &mut Encoder<'_>);

    fn is_empty(&self) -> bool {
        false
    }
}

/// A value that knows how to write itself as one JSON value.
pub trait Encode {
    fn encode(&self, enc: &mut Encoder<'_>);

    /// Whether this is the empty value for omit-empty purposes.
    fn is_empty_value(&self) -> bool {
        false
    }
}

macro_rules! impl_encode_int {
    ($writer:path, $wide:ty => $($ty:ty),*) => {
        $(
            impl Encode for $ty {
                fn encode(&self, enc: &mut Encoder<'_>) {
                    let value = *self as $wide;
                    enc.write_number(|out| $writer(out, value));
                }

                fn is_empty_value(&self) -> bool {
                    *self == 0
                }
            }
        )*
    };
}

impl_encode_int!(number_writer::write_i64, i64 => i8, i16, i32, i64);
impl_encode_int!(number_writer::write_u64, u64 => u8, u16, u32, u64);

impl Encode for f64 {
    fn encode(&self, enc: &mut Encoder<'_>) {
        let value = *self;
        enc.write_number(|out| number_writer::write_f64(out, value));
    }

    fn is_empty_value(&self) -> bool {
        *self == 0.0
    }
}

impl Encode for f32 {
    fn encode(&self, enc: &mut Encoder<'_>) {
        let value = *self;
        enc.write_number(|out| number_writer::write_f32(out, value));
    }

    fn is_empty_value(&self) -> bool {
        *self == 0.0
    }
}

impl Encode for bool {
    fn encode(&self, enc: &mut Encoder<'_>) {
        enc.put(if *self { &b"true"[..] } else { &b"false"[..] });
    }

    fn is_empty_value(&self) -> bool {
        !*self
    }
}

impl Encode for str {
    fn encode(&self, enc: &mut Encoder<'_>) {
        enc.write_str(self);
    }

    fn is_empty_value(&self) -> bool {
        self.is_empty()
    }
}

impl Encode for String {
    fn encode(&self, enc: &mut Encoder<'_>) {
        enc.write_str(self);
    }

    fn is_empty_value(&self) -> bool {
        self.is_empty()
    }
}

impl<T: Encode + ?Sized> Encode for &T {
    fn encode(&self, enc: &mut Encoder<'_>) {
        (**self).encode(enc)
    }

    fn is_empty_value(&self) -> bool {
        (**self).is_empty_value()
    }
}

/// `None` is written as `null` and counts as empty.
impl<T: Encode> Encode for Option<T> {
    fn encode(&self, enc: &mut Encoder<'_>) {
        match self {
            Some(value) => value.encode(enc),
            None => enc.put(b"null"),
        }
    }

    fn is_empty_value(&self) -> bool {
        self.is_none()
    }
}

impl<T: Encode> Encode for [T] {
    fn encode(&self, enc: &mut Encoder<'_>) {
        enc.write_array(&SliceEmitter(self));
    }

    fn is_empty_value(&self) -> bool {
        self.is_empty()
    }
}

impl<T: Encode> Encode for Vec<T> {
    fn encode(&self, enc: &mut Encoder<'_>) {
        self.as_slice().encode(enc)
    }

    fn is_empty_value(&self) -> bool {
        self.is_empty()
    }
}

struct SliceEmitter<'a, T>(&'a [T]);

impl<T: Encode> ArrayEmitter for SliceEmitter<'_, T> {
    fn emit(&self, enc: &mut Encoder<'_>) {
        for item in self.0 {
            enc.add(item);
        }
    }
}

/// An [`ObjectEmitter`] backed by a closure.
pub struct ObjectEmitFn<F> {
    f: F,
    empty: bool,
}

impl<F> ObjectEmitFn<F>
where
    F: Fn(&mut Encoder<'_>),
{
    pub fn new(f: F) -> Self {
        Self { f, empty: false }
    }

    /// Report the object as empty to the omit-empty / null-empty variants.
    pub fn with_empty(mut self, empty: bool) -> Self {
        self.empty = empty;
        self
    }
}

impl<F> ObjectEmitter for ObjectEmitFn<F>
where
    F: Fn(&mut Encoder<'_>),
{
    fn emit(&self, enc: &mut Encoder<'_>) {
        (self.f)(enc)
    }

    fn is_empty(&self) -> bool {
        self.empty
    }
}

/// An [`ArrayEmitter`] backed by a closure.
pub struct ArrayEmitFn<F> {
    f: F,
    empty: bool,
}

impl<F> ArrayEmitFn<F>
where
    F: Fn(&mut Encoder<'_>),
{
    pub fn new(f: F) -> Self {
        Self { f, empty: false }
    }

    pub fn with_empty(mut self, empty: bool) -> Self {
        self.empty = empty;
        self
    }
}

impl<F> ArrayEmitter for ArrayEmitFn<F>
where
    F: Fn(&mut Encoder<'_>),
{
    fn emit(&self, enc: &mut Encoder<'_>) {
        (self.f)(enc)
    }

    fn is_empty(&self) -> bool {
        self.empty
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct User {
        id: u64,
        name: String,
        email: Option<String>,
        roles: Vec<&'static str>,
    }

    impl ObjectEmitter for User {
        fn emit(&self, enc: &mut Encoder<'_>) {
            enc.add_key("id", &self.id);
            enc.add_key("name", &self.name);
            enc.add_key_omit_empty("email", &self.email);
            enc.add_key("roles", &self.roles);
        }
    }

    #[test]
    fn test_struct_emitter() {
        let user = User {
            id: 42,
            name: "Ann".into(),
            email: None,
            roles: vec!["admin", "dev"],
        };
        let mut enc = Encoder::new();
        enc.encode_object(&user).unwrap();
        assert_eq!(
            enc.buffer(),
            br#"{"id":42,"name":"Ann","roles":["admin","dev"]}"#
        );
    }

    #[test]
    fn test_scalars() {
        let mut enc = Encoder::new();
        enc.encode_array(&ArrayEmitFn::new(|e| {
            e.add(&-5i8);
            e.add(&u64::MAX);
            e.add(&0.5f32);
            e.add(&f64::NAN);
            e.add(&false);
            e.add(&None::<u8>);
            e.add(&Some("s"));
        }))
        .unwrap();
        assert_eq!(
            enc.buffer(),
            br#"[-5,18446744073709551615,0.5,null,false,null,"s"]"#
        );
    }

    #[test]
    fn test_empty_values() {
        assert!(0i32.is_empty_value());
        assert!(!1u8.is_empty_value());
        assert!("".is_empty_value());
        assert!(None::<i32>.is_empty_value());
        assert!(Vec::<u8>::new().is_empty_value());
        assert!(!true.is_empty_value());
        assert!(0.0f64.is_empty_value());
    }

    #[test]
    fn test_nested_vecs() {
        let mut enc = Encoder::new();
        enc.encode(&vec![vec![1u8, 2], vec![], vec![3]]).unwrap();
        assert_eq!(enc.buffer(), b"[[1,2],[],[3]]");
    }
}
