// SPDX-License-Identifier: Apache-2.0

//! Decode-side capability traits and their closure adapters.

use crate::decoder::Decoder;
use crate::error::Result;

/// Receives the members of a JSON object.
pub trait ObjectVisitor {
    /// Called once per member, with the decoder positioned on the value.
    ///
    /// Decode the value through `dec` to consume it; if nothing is read
    /// the value is skipped.
    fn visit_member(&mut self, dec: &mut Decoder<'_>, key: &str) -> Result<()>;

    /// Number of members to consume before the rest of the object is
    /// skipped. `0` consumes them all.
    fn expected_members(&self) -> usize {
        0
    }
}

/// Receives the elements of a JSON array.
pub trait ArrayVisitor {
    fn visit_element(&mut self, dec: &mut Decoder<'_>) -> Result<()>;
}

impl<V: ObjectVisitor + ?Sized> ObjectVisitor for &mut V {
    fn visit_member(&mut self, dec: &mut Decoder<'_>, key: &str) -> Result<()> {
        (**self).visit_member(dec, key)
    }

    fn expected_members(&self) -> usize {
        (**self).expected_members()
    }
}

impl<V: ArrayVisitor + ?Sized> ArrayVisitor for &mut V {
    fn visit_element(&mut self, dec: &mut Decoder<'_>) -> Result<()> {
        (**self).visit_element(dec)
    }
}

/// A value that knows how to decode itself from the next JSON value.
pub trait Decode {
    fn decode(&mut self, dec: &mut Decoder<'_>) -> Result<()>;
}

macro_rules! impl_decode_scalar {
    ($($ty:ty => $method:ident),* $(,)?) => {
        $(
            impl Decode for $ty {
                fn decode(&mut self, dec: &mut Decoder<'_>) -> Result<()> {
                    *self = dec.$method()?;
                    Ok(())
                }
            }
        )*
    };
}

impl_decode_scalar! {
    i8 => i8, i16 => i16, i32 => i32, i64 => i64,
    u8 => u8, u16 => u16, u32 => u32, u64 => u64,
    f32 => f32, f64 => f64, bool => bool,
}

impl Decode for String {
    fn decode(&mut self, dec: &mut Decoder<'_>) -> Result<()> {
        dec.string(self)
    }
}

/// `null` decodes to `None`; anything else into the (possibly reused) inner value.
impl<T: Decode + Default> Decode for Option<T> {
    fn decode(&mut self, dec: &mut Decoder<'_>) -> Result<()> {
        if dec.consume_null()? {
            *self = None;
            return Ok(());
        }
        self.get_or_insert_with(T::default).decode(dec)
    }
}

/// Arrays decode element by element; the vector is cleared first.
impl<T: Decode + Default> Decode for Vec<T> {
    fn decode(&mut self, dec: &mut Decoder<'_>) -> Result<()> {
        self.clear();
        dec.array(&mut VecVisitor(self))
    }
}

struct VecVisitor<'v, T>(&'v mut Vec<T>);

impl<T: Decode + Default> ArrayVisitor for VecVisitor<'_, T> {
    fn visit_element(&mut self, dec: &mut Decoder<'_>) -> Result<()> {
        let mut item = T::default();
        item.decode(dec)?;
        self.0.push(item);
        Ok(())
    }
}

/// An [`ObjectVisitor`] backed by a closure.
pub struct ObjectFn<F> {
    f: F,
    expected: usize,
}

impl<F> ObjectFn<F>
where
    F: FnMut(&mut Decoder<'_>, &str) -> Result<()>,
{
    pub fn new(f: F) -> Self {
        Self { f, expected: 0 }
    }

    /// Stop after `expected` members have been consumed.
    pub fn with_expected(mut self, expected: usize) -> Self {
        self.expected = expected;
        self
    }
}

impl<F> ObjectVisitor for ObjectFn<F>
where
    F: FnMut(&mut Decoder<'_>, &str) -> Result<()>,
{
    fn visit_member(&mut self, dec: &mut Decoder<'_>, key: &str) -> Result<()> {
        (self.f)(dec, key)
    }

    fn expected_members(&self) -> usize {
        self.expected
    }
}

/// An [`ArrayVisitor`] backed by a closure.
pub struct ArrayFn<F>(F);

impl<F> ArrayFn<F>
where
    F: FnMut(&mut Decoder<'_>) -> Result<()>,
{
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

impl<F> ArrayVisitor for ArrayFn<F>
where
    F: FnMut(&mut Decoder<'_>) -> Result<()>,
{
    fn visit_element(&mut self, dec: &mut Decoder<'_>) -> Result<()> {
        (self.0)(dec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    #[derive(Debug, Default, PartialEq)]
    struct Point {
        x: i32,
        y: i32,
        label: Option<String>,
    }

    impl ObjectVisitor for Point {
        fn visit_member(&mut self, dec: &mut Decoder<'_>, key: &str) -> Result<()> {
            match key {
                "x" => dec.decode(&mut self.x),
                "y" => dec.decode(&mut self.y),
                "label" => dec.decode(&mut self.label),
                _ => Ok(()),
            }
        }

        fn expected_members(&self) -> usize {
            3
        }
    }

    impl Decode for Point {
        fn decode(&mut self, dec: &mut Decoder<'_>) -> Result<()> {
            dec.object(self)
        }
    }

    #[test]
    fn test_struct_visitor() {
        let mut dec = Decoder::from_slice(br#"{"x": 1, "y": -2, "label": "p"}"#);
        let mut p = Point::default();
        dec.decode(&mut p).unwrap();
        assert_eq!(
            p,
            Point {
                x: 1,
                y: -2,
                label: Some("p".into())
            }
        );
    }

    #[test]
    fn test_nested_vec_of_structs() {
        let mut dec = Decoder::from_slice(br#"[{"x": 1, "y": 2}, null, {"label": null}]"#);
        let mut points: Vec<Point> = vec![Point::default()];
        dec.decode(&mut points).unwrap();
        assert_eq!(points.len(), 3);
        assert_eq!(points[0].y, 2);
        assert_eq!(points[1], Point::default());
        assert_eq!(points[2].label, None);
    }

    #[test]
    fn test_option_null_and_value() {
        let mut dec = Decoder::from_slice(b"null 5");
        let mut v: Option<u16> = Some(1);
        dec.decode(&mut v).unwrap();
        assert_eq!(v, None);
        dec.decode(&mut v).unwrap();
        assert_eq!(v, Some(5));
    }

    #[test]
    fn test_object_or_null() {
        let mut dec = Decoder::from_slice(br#"[null, {"x": 4}]"#);
        let mut slots: Vec<Option<Point>> = Vec::new();
        dec.array(&mut ArrayFn::new(|d: &mut Decoder<'_>| {
            let mut slot: Option<Point> = None;
            d.object_or_null(&mut slot)?;
            slots.push(slot);
            Ok(())
        }))
        .unwrap();
        assert!(slots[0].is_none());
        assert_eq!(slots[1].as_ref().map(|p| p.x), Some(4));
    }

    #[derive(Default)]
    struct Sum(i64);

    impl ArrayVisitor for Sum {
        fn visit_element(&mut self, dec: &mut Decoder<'_>) -> Result<()> {
            self.0 += dec.i64()?;
            Ok(())
        }
    }

    #[test]
    fn test_array_or_null() {
        let mut dec = Decoder::from_slice(b"[1, 2, 3] null");
        let mut slot: Option<Sum> = None;
        dec.array_or_null(&mut slot).unwrap();
        assert_eq!(slot.as_ref().map(|s| s.0), Some(6));
        dec.array_or_null(&mut slot).unwrap();
        assert!(slot.is_none());
    }

    #[test]
    fn test_closure_error_propagates() {
        let mut dec = Decoder::from_slice(br#"{"a": 1}"#);
        let err = dec
            .object(&mut ObjectFn::new(|_: &mut Decoder<'_>, key: &str| {
                Err(Error::custom(format!("unexpected key {}", key)))
            }))
            .unwrap_err();
        assert_eq!(err.to_string(), "unexpected key a");
    }
}
