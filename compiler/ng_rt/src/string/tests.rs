//! Tests for strings and bytes.

#![allow(
    clippy::unwrap_used,
    reason = "test code uses unwrap for concise assertions"
)]

use pretty_assertions::assert_eq;

use super::*;
use crate::test_runtime;

// ── Width selection ─────────────────────────────────────────────────────

#[test]
fn width_follows_the_largest_code_point() {
    let mut rt = test_runtime();
    let cases = [
        ('\u{7F}', StrKind::Latin1),
        ('\u{FF}', StrKind::Latin1),
        ('\u{100}', StrKind::Ucs2),
        ('\u{FFFF}', StrKind::Ucs2),
        ('\u{10000}', StrKind::Ucs4),
    ];
    for (ch, expected) in cases {
        let text = format!("a{ch}b");
        let s = rt.alloc_str(&text).unwrap();
        assert_eq!(rt.str_kind(s).unwrap(), expected, "U+{:04X}", u32::from(ch));
        assert_eq!(rt.str_len(s).unwrap(), 3);
        assert_eq!(rt.to_c_string(s).unwrap(), text);
        rt.decref(s);
    }
}

#[test]
fn kind_numbers_match_width_exponent() {
    assert_eq!(StrKind::Latin1 as u8, 0);
    assert_eq!(StrKind::Ucs2 as u8, 1);
    assert_eq!(StrKind::Ucs4 as u8, 2);
    assert_eq!(StrKind::Ucs4.width(), 4);
}

#[test]
fn ascii_flag_and_zero_copy_fast_path() {
    let mut rt = test_runtime();
    let ascii = rt.alloc_str("hello").unwrap();
    let latin = rt.alloc_str("café").unwrap();

    assert!(rt.str_is_ascii(ascii).unwrap());
    assert!(matches!(rt.to_c_string(ascii).unwrap(), Cow::Borrowed("hello")));

    assert!(!rt.str_is_ascii(latin).unwrap());
    assert_eq!(rt.str_kind(latin).unwrap(), StrKind::Latin1);
    assert!(matches!(rt.to_c_string(latin).unwrap(), Cow::Owned(_)));
    assert_eq!(rt.to_c_string(latin).unwrap(), "café");

    rt.decref(ascii);
    rt.decref(latin);
}

#[test]
fn empty_string() {
    let mut rt = test_runtime();
    let s = rt.alloc_str("").unwrap();
    assert_eq!(rt.str_len(s).unwrap(), 0);
    assert_eq!(rt.str_kind(s).unwrap(), StrKind::Latin1);
    assert_eq!(rt.to_c_string(s).unwrap(), "");
    rt.decref(s);
}

#[test]
fn char_at_reads_each_width() {
    let mut rt = test_runtime();
    let s = rt.alloc_str("x\u{263A}\u{1F600}").unwrap();
    assert_eq!(rt.str_kind(s).unwrap(), StrKind::Ucs4);
    assert_eq!(rt.str_char_at(s, 0).unwrap(), Some('x'));
    assert_eq!(rt.str_char_at(s, 1).unwrap(), Some('\u{263A}'));
    assert_eq!(rt.str_char_at(s, 2).unwrap(), Some('\u{1F600}'));
    assert_eq!(rt.str_char_at(s, 3).unwrap(), None);
    rt.decref(s);
}

#[test]
fn char_at_matches_iteration_for_every_kind() {
    let mut rt = test_runtime();
    for text in ["caf\u{e9} au lait", "\u{3b1}\u{3b2}\u{3b3}-abc", "a\u{1F600}b\u{10FFFF}"] {
        let s = rt.alloc_str(text).unwrap();
        let by_index: String = (0..text.chars().count())
            .map(|i| rt.str_char_at(s, i).unwrap().unwrap())
            .collect();
        assert_eq!(by_index, text);
        assert_eq!(rt.str_char_at(s, text.chars().count()).unwrap(), None);
        assert_eq!(rt.str_char_at(s, usize::MAX).unwrap(), None);
        rt.decref(s);
    }
}

// ── Hashing and equality ────────────────────────────────────────────────

#[test]
fn equal_text_hashes_equal() {
    let mut rt = test_runtime();
    let a = rt.alloc_str("key").unwrap();
    let b = rt.alloc_str("key").unwrap();
    let c = rt.alloc_str("kez").unwrap();
    assert_eq!(rt.str_hash(a).unwrap(), rt.str_hash(b).unwrap());
    assert!(crate::keys_equal(a, b));
    assert!(!crate::keys_equal(a, c));
    for s in [a, b, c] {
        rt.decref(s);
    }
}

#[test]
fn lossy_construction_replaces_invalid_utf8() {
    let mut rt = test_runtime();
    let s = rt.alloc_str_lossy(b"ok\xFF").unwrap();
    assert_eq!(rt.to_c_string(s).unwrap(), "ok\u{FFFD}");
    assert_eq!(rt.str_kind(s).unwrap(), StrKind::Ucs2);
    rt.decref(s);
}

#[test]
fn cat_str_joins_mixed_widths() {
    let mut rt = test_runtime();
    let a = rt.alloc_str("ab").unwrap();
    let b = rt.alloc_str("\u{3B1}").unwrap();
    let joined = rt.cat_str(a, b).unwrap();
    assert_eq!(rt.to_c_string(joined).unwrap(), "ab\u{3B1}");
    assert_eq!(rt.str_kind(joined).unwrap(), StrKind::Ucs2);
    for s in [a, b, joined] {
        rt.decref(s);
    }
}

#[test]
fn bytes_round_trip_and_compare() {
    let mut rt = test_runtime();
    let a = rt.alloc_bytes(&[0, 1, 2, 255]).unwrap();
    let b = rt.alloc_bytes(&[0, 1, 2, 255]).unwrap();
    assert_eq!(rt.bytes_data(a).unwrap(), &[0, 1, 2, 255]);
    assert!(crate::keys_equal(a, b));
    rt.decref(a);
    rt.decref(b);
}

#[test]
fn wrong_type_is_a_type_error() {
    let mut rt = test_runtime();
    let n = rt.alloc_int(3).unwrap();
    let err = rt.str_len(n).unwrap_err();
    assert_eq!(err.to_string(), "TypeError: str() expected 'str', got 'int'");
    rt.decref(n);
}
