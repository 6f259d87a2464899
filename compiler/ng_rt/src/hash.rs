//! Hash functions for keys and values.
//!
//! Content hashes (strings, bytes, symbol names) are seeded per runtime.
//! Number hashes are seed-independent so that an integral float and the
//! equal int hash alike.

use std::hash::Hasher;

use rustc_hash::FxHasher;

/// Hash of positive infinity; negative infinity and NaN hash to its negation.
pub const INF_HASH: i64 = 0x0034_5678;

/// SplitMix64 finalizer: full avalanche over all 64 bits.
#[inline]
pub fn splitmix64(mut x: u64) -> u64 {
    x = (x ^ (x >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    x = (x ^ (x >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    x ^ (x >> 31)
}

/// Seeded hash of a byte string.
#[expect(
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    reason = "seed and result are bit patterns, not quantities"
)]
pub fn content_hash(seed: u64, bytes: &[u8]) -> i64 {
    let mut hasher = FxHasher::with_seed(seed as usize);
    hasher.write(bytes);
    hasher.write_usize(bytes.len());
    splitmix64(hasher.finish()) as i64
}

/// Hash of an int. `-1` is reserved, as in the C convention of signalling
/// failure with it, and maps to `-2`.
#[inline]
pub fn int_hash(value: i64) -> i64 {
    if value == -1 {
        -2
    } else {
        value
    }
}

/// Hash of a float, equal to [`int_hash`] for integral values.
#[expect(
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    reason = "integral floats in range are exact; mantissa fits in 53 bits"
)]
pub fn float_hash(value: f64) -> i64 {
    if value.is_nan() {
        return -INF_HASH;
    }
    if value.is_infinite() {
        return if value > 0.0 { INF_HASH } else { -INF_HASH };
    }
    if value == 0.0 {
        return 0;
    }
    if value.fract() == 0.0 {
        return int_hash(value as i64);
    }

    let (mantissa, exponent) = frexp(value.abs());
    let mut hash = (mantissa as i64) ^ i64::from(exponent);
    if value < 0.0 {
        hash = -hash;
    }
    int_hash(hash)
}

/// Split a positive finite float into a 53-bit integer mantissa and the
/// exponent `e` such that `value = mantissa * 2^(e - 53)`.
fn frexp(value: f64) -> (u64, i32) {
    const SUBNORMAL_SCALE: i32 = 54;
    let bits = value.to_bits();
    let exponent_field = ((bits >> 52) & 0x7ff) as i32;
    if exponent_field == 0 {
        let (mantissa, exponent) = frexp(value * 2f64.powi(SUBNORMAL_SCALE));
        return (mantissa, exponent - SUBNORMAL_SCALE);
    }
    let fraction = bits & ((1 << 52) - 1);
    (fraction | (1 << 52), exponent_field - 1022)
}

/// Hash of an object compared by identity. Blocks are 8-aligned, so the
/// low bits carry no information and are rotated to the top.
#[inline]
#[expect(clippy::cast_possible_wrap, reason = "address bit pattern")]
pub fn identity_hash(addr: usize) -> i64 {
    addr.rotate_right(4) as i64
}

/// Fold one element hash into a tuple hash.
#[inline]
pub fn combine(acc: i64, item: i64) -> i64 {
    acc.wrapping_mul(31).wrapping_add(item)
}

/// Starting value for [`combine`].
pub const TUPLE_HASH_SEED: i64 = 17;

#[cfg(test)]
mod tests;
