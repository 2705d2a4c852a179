// SPDX-License-Identifier: Apache-2.0

//! Decimal formatting for the encoder.

use std::io::Write;

const DIGIT_PAIRS: &[u8; 200] = b"\
    0001020304050607080910111213141516171819\
    2021222324252627282930313233343536373839\
    4041424344454647484950515253545556575859\
    6061626364656667686970717273747576777879\
    8081828384858687888990919293949596979899";

/// Append the decimal form of `value`.
pub(crate) fn write_u64(out: &mut Vec<u8>, mut value: u64) {
    let mut tmp = [0u8; 20];
    let mut cur = tmp.len();
    while value >= 100 {
        let pair = (value % 100) as usize * 2;
        value /= 100;
        cur -= 2;
        tmp[cur..cur + 2].copy_from_slice(&DIGIT_PAIRS[pair..pair + 2]);
    }
    if value >= 10 {
        let pair = value as usize * 2;
        cur -= 2;
        tmp[cur..cur + 2].copy_from_slice(&DIGIT_PAIRS[pair..pair + 2]);
    } else {
        cur -= 1;
        tmp[cur] = b'0' + value as u8;
    }
    out.extend_from_slice(&tmp[cur..]);
}

pub(crate) fn write_i64(out: &mut Vec<u8>, value: i64) {
    if value < 0 {
        out.push(b'-');
    }
    write_u64(out, value.unsigned_abs());
}

/// Append the shortest decimal form that reads back as `value`, never in
/// exponent notation. NaN and infinities are written as `null`.
pub(crate) fn write_f64(out: &mut Vec<u8>, value: f64) {
    if !value.is_finite() {
        out.extend_from_slice(b"null");
        return;
    }
    // Writing into a Vec cannot fail.
    let _ = write!(out, "{}", value);
}

pub(crate) fn write_f32(out: &mut Vec<u8>, value: f32) {
    if !value.is_finite() {
        out.extend_from_slice(b"null");
        return;
    }
    let _ = write!(out, "{}", value);
}
