// SPDX-License-Identifier: Apache-2.0

// Per-width decimal integer accumulation over pre-validated digit runs.

/// Creates a base-10 parser for a specific integer type.
///
/// Digits are accumulated as an unsigned magnitude with shift-add
/// (`(v << 3) + (v << 1) + digit`). Runs no longer than `$safe` digits cannot
/// overflow the magnitude type and skip the per-digit checks; longer runs check
/// `v > limit / 10` before the multiply and `v > limit - digit` after it.
/// Signed types use `MAX + 1` as the limit for negative input so that `MIN`
/// parses, then negate with wrapping arithmetic.
macro_rules! define_int_parser {
    (unsigned $fn_name:ident, $int_ty:ty, $safe:expr) => {
        /// Parse a run of ASCII digits into a(n) `
        #[doc = stringify!($int_ty)]
        /// `. Returns `None` on overflow. A negative sign is only accepted
        /// for zero.
        pub(crate) fn $fn_name(negative: bool, digits: &[u8]) -> Option<$int_ty> {
            let magnitude = define_int_parser!(@accumulate $int_ty, <$int_ty>::MAX, $safe, digits)?;
            if negative && magnitude != 0 {
                return None;
            }
            Some(magnitude)
        }
    };
    (signed $fn_name:ident, $int_ty:ty, $mag_ty:ty, $safe:expr) => {
        /// Parse a run of ASCII digits into a(n) `
        #[doc = stringify!($int_ty)]
        /// `. Returns `None` on overflow.
        pub(crate) fn $fn_name(negative: bool, digits: &[u8]) -> Option<$int_ty> {
            let limit = if negative {
                <$int_ty>::MAX as $mag_ty + 1
            } else {
                <$int_ty>::MAX as $mag_ty
            };
            let magnitude = define_int_parser!(@accumulate $mag_ty, limit, $safe, digits)?;
            let value = magnitude as $int_ty;
            Some(if negative { value.wrapping_neg() } else { value })
        }
    };
    (@accumulate $mag_ty:ty, $limit:expr, $safe:expr, $digits:expr) => {{
        let limit: $mag_ty = $limit;
        let mut v: $mag_ty = 0;
        if $digits.len() <= $safe {
            for &byte in $digits {
                v = (v << 3) + (v << 1) + (byte - b'0') as $mag_ty;
            }
            if v > limit {
                None
            } else {
                Some(v)
            }
        } else {
            let mut overflow = false;
            for &byte in $digits {
                let digit = (byte - b'0') as $mag_ty;
                if v > limit / 10 {
                    overflow = true;
                    break;
                }
                v = (v << 3) + (v << 1);
                if v > limit - digit {
                    overflow = true;
                    break;
                }
                v += digit;
            }
            if overflow {
                None
            } else {
                Some(v)
            }
        }
    }};
}

define_int_parser!(unsigned parse_u8, u8, 2);
define_int_parser!(unsigned parse_u16, u16, 4);
define_int_parser!(unsigned parse_u32, u32, 9);
define_int_parser!(unsigned parse_u64, u64, 19);
define_int_parser!(signed parse_i8, i8, u8, 2);
define_int_parser!(signed parse_i16, i16, u16, 4);
define_int_parser!(signed parse_i32, i32, u32, 9);
define_int_parser!(signed parse_i64, i64, u64, 18);
