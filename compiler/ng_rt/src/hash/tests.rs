use super::*;

#[test]
fn int_hash_reserves_minus_one() {
    assert_eq!(int_hash(-1), -2);
    assert_eq!(int_hash(-2), -2);
    assert_eq!(int_hash(0), 0);
    assert_eq!(int_hash(i64::MAX), i64::MAX);
}

#[test]
fn integral_floats_hash_like_ints() {
    assert_eq!(float_hash(3.0), int_hash(3));
    assert_eq!(float_hash(-1.0), -2);
    assert_eq!(float_hash(0.0), 0);
    assert_eq!(float_hash(-0.0), 0);
}

#[test]
fn non_finite_floats() {
    assert_eq!(float_hash(f64::INFINITY), INF_HASH);
    assert_eq!(float_hash(f64::NEG_INFINITY), -INF_HASH);
    assert_eq!(float_hash(f64::NAN), -INF_HASH);
}

#[test]
fn fractional_floats_use_mantissa_and_exponent() {
    // 0.5 = 0.5 * 2^0 -> mantissa 2^52, exponent 0
    assert_eq!(float_hash(0.5), 1 << 52);
    assert_eq!(float_hash(-0.5), -(1 << 52));
    // 1.5 = 0.75 * 2^1
    assert_eq!(float_hash(1.5), (3 << 51) ^ 1);
    assert_ne!(float_hash(0.1), float_hash(0.2));
}

#[test]
fn subnormals_are_finite_and_distinct() {
    let tiny = f64::from_bits(1);
    let (mantissa, exponent) = frexp(tiny);
    assert_eq!(mantissa, 1 << 52);
    assert_eq!(exponent, -1073);
    assert_ne!(float_hash(tiny), float_hash(f64::from_bits(2)));
}

#[test]
fn content_hash_depends_on_seed_and_bytes() {
    assert_eq!(content_hash(1, b"abc"), content_hash(1, b"abc"));
    assert_ne!(content_hash(1, b"abc"), content_hash(2, b"abc"));
    assert_ne!(content_hash(1, b"abc"), content_hash(1, b"abd"));
    assert_ne!(content_hash(1, b""), content_hash(1, b"\0"));
}

#[test]
fn identity_hash_moves_alignment_bits() {
    assert_eq!(identity_hash(0x10), 1);
    assert_eq!(identity_hash(0x18), i64::MIN + 1);
}

#[test]
fn splitmix_spreads_small_keys() {
    let low_bits: std::collections::HashSet<_> = (0..64u64).map(|k| splitmix64(k) & 63).collect();
    assert!(low_bits.len() > 24);
}
