// SPDX-License-Identifier: Apache-2.0

//! Number token validation and floating point conversion.
//!
//! The decoder collects the raw bytes of a number token and hands them here.
//! [`NumberShape::scan`] checks them against the JSON number grammar and
//! records where the integer part ends; integer targets are then parsed by
//! [`crate::int_parser`], float targets by [`parse_f64`] / [`parse_f32`].

/// Syntax summary of a validated number token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct NumberShape {
    pub negative: bool,
    /// End of the integer digits (exclusive).
    pub int_end: usize,
    /// Start and end of the fraction digits, empty when there is no `.`.
    pub frac: (usize, usize),
    /// Index of the first exponent byte after `e`/`E` (sign included),
    /// or `None` without an exponent.
    pub exp_start: Option<usize>,
}

impl NumberShape {
    /// Validate `token` as `-? (0 | [1-9][0-9]*) (. [0-9]+)? ([eE] [+-]? [0-9]+)?`.
    ///
    /// On failure returns the index of the offending byte, which equals
    /// `token.len()` when the token ends too early.
    pub fn scan(token: &[u8]) -> Result<Self, usize> {
        let mut i = 0;
        let negative = token.first() == Some(&b'-');
        if negative {
            i += 1;
        }
        match token.get(i) {
            Some(b'0') => i += 1,
            Some(b'1'..=b'9') => i = digits_end(token, i + 1),
            _ => return Err(i),
        }
        let int_end = i;

        let mut frac = (i, i);
        if token.get(i) == Some(&b'.') {
            let start = i + 1;
            let end = digits_end(token, start);
            if end == start {
                return Err(start);
            }
            frac = (start, end);
            i = end;
        }

        let mut exp_start = None;
        if matches!(token.get(i), Some(b'e' | b'E')) {
            i += 1;
            exp_start = Some(i);
            if matches!(token.get(i), Some(b'+' | b'-')) {
                i += 1;
            }
            let end = digits_end(token, i);
            if end == i {
                return Err(i);
            }
            i = end;
        }

        if i != token.len() {
            return Err(i);
        }
        Ok(Self {
            negative,
            int_end,
            frac,
            exp_start,
        })
    }

    pub fn is_integer(&self) -> bool {
        self.frac.0 == self.frac.1 && self.exp_start.is_none()
    }

    /// The integer digits, without sign.
    pub fn int_digits<'t>(&self, token: &'t [u8]) -> &'t [u8] {
        &token[self.negative as usize..self.int_end]
    }
}

fn digits_end(token: &[u8], from: usize) -> usize {
    let mut i = from;
    while matches!(token.get(i), Some(b'0'..=b'9')) {
        i += 1;
    }
    i
}

const F64_POW10: [f64; 23] = [
    1e0, 1e1, 1e2, 1e3, 1e4, 1e5, 1e6, 1e7, 1e8, 1e9, 1e10, 1e11, 1e12, 1e13, 1e14, 1e15, 1e16,
    1e17, 1e18, 1e19, 1e20, 1e21, 1e22,
];

const F32_POW10: [f32; 11] = [1e0, 1e1, 1e2, 1e3, 1e4, 1e5, 1e6, 1e7, 1e8, 1e9, 1e10];

/// Mantissa and decimal exponent for the exact fast path, or `None` when the
/// digits do not fit in a `u64` or the exponent is unusually large.
fn decimal_parts(token: &[u8], shape: &NumberShape) -> Option<(u64, i32)> {
    let int_digits = shape.int_digits(token);
    let frac_digits = &token[shape.frac.0..shape.frac.1];
    if int_digits.len() + frac_digits.len() > 19 {
        return None;
    }
    let mut mantissa = 0u64;
    for &byte in int_digits.iter().chain(frac_digits) {
        mantissa = (mantissa << 3) + (mantissa << 1) + (byte - b'0') as u64;
    }
    let mut exponent = -(frac_digits.len() as i32);
    if let Some(start) = shape.exp_start {
        let (exp_negative, digits) = match token[start] {
            b'-' => (true, &token[start + 1..]),
            b'+' => (false, &token[start + 1..]),
            _ => (false, &token[start..]),
        };
        if digits.len() > 4 {
            return None;
        }
        let mut e = 0i32;
        for &byte in digits {
            e = e * 10 + (byte - b'0') as i32;
        }
        exponent += if exp_negative { -e } else { e };
    }
    Some((mantissa, exponent))
}

fn parse_slow<F: std::str::FromStr>(token: &[u8]) -> Option<F> {
    std::str::from_utf8(token).ok()?.parse().ok()
}

/// Convert a validated token to `f64`. `None` means out of range.
pub(crate) fn parse_f64(token: &[u8], shape: &NumberShape) -> Option<f64> {
    let value = match decimal_parts(token, shape) {
        Some((m, e)) if m <= 1 << 53 && (-22..=22).contains(&e) => {
            let m = m as f64;
            let v = if e < 0 {
                m / F64_POW10[(-e) as usize]
            } else {
                m * F64_POW10[e as usize]
            };
            if shape.negative {
                -v
            } else {
                v
            }
        }
        _ => parse_slow::<f64>(token)?,
    };
    value.is_finite().then_some(value)
}

/// Convert a validated token to `f32`. `None` means out of range.
pub(crate) fn parse_f32(token: &[u8], shape: &NumberShape) -> Option<f32> {
    let value = match decimal_parts(token, shape) {
        Some((m, e)) if m <= 1 << 24 && (-10..=10).contains(&e) => {
            let m = m as f32;
            let v = if e < 0 {
                m / F32_POW10[(-e) as usize]
            } else {
                m * F32_POW10[e as usize]
            };
            if shape.negative {
                -v
            } else {
                v
            }
        }
        _ => parse_slow::<f32>(token)?,
    };
    value.is_finite().then_some(value)
}
