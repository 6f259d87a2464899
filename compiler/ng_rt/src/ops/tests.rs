//! Tests for generic operations.

#![allow(
    clippy::unwrap_used,
    reason = "test code uses unwrap for concise assertions"
)]

use pretty_assertions::assert_eq;

use super::arith::{checked_pow, floor_div_int, mod_float, mod_int};
use super::*;
use crate::{test_runtime, Entry};

type BinaryOp = fn(&mut Runtime, ObjRef, ObjRef) -> RtResult<ObjRef>;

/// Render `op(a, b)`, or its diagnostic.
fn eval(rt: &mut Runtime, op: BinaryOp, a: ObjRef, b: ObjRef) -> String {
    match op(rt, a, b) {
        Ok(result) => {
            let text = rt.to_text(result, true).unwrap();
            rt.decref(result);
            text
        }
        Err(err) => err.to_string(),
    }
}

fn render(rt: &mut Runtime, obj: ObjRef) -> String {
    let s = rt.to_string(obj).unwrap();
    let text = rt.to_c_string(s).unwrap().into_owned();
    rt.decref(s);
    text
}

// ── Arithmetic helpers ──────────────────────────────────────────────────

#[test]
fn floor_semantics() {
    assert_eq!(floor_div_int(7, 2), Some(3));
    assert_eq!(floor_div_int(-7, 2), Some(-4));
    assert_eq!(floor_div_int(7, -2), Some(-4));
    assert_eq!(floor_div_int(-7, -2), Some(3));
    assert_eq!(floor_div_int(i64::MIN, -1), None);
    assert_eq!(mod_int(7, 3), 1);
    assert_eq!(mod_int(-7, 3), 2);
    assert_eq!(mod_int(7, -3), -2);
    assert_eq!(mod_int(i64::MIN, -1), 0);
    assert_eq!(mod_float(-1.0, 3.0), 2.0);
    assert_eq!(mod_float(5.5, -2.0), -0.5);
}

#[test]
fn square_and_multiply() {
    assert_eq!(checked_pow(2, 10), Some(1024));
    assert_eq!(checked_pow(-3, 3), Some(-27));
    assert_eq!(checked_pow(7, 0), Some(1));
    assert_eq!(checked_pow(2, 62), Some(1 << 62));
    assert_eq!(checked_pow(2, 63), None);
    assert_eq!(checked_pow(-2, 63), Some(i64::MIN));
}

// ── Operators ───────────────────────────────────────────────────────────

#[test]
fn int_float_arithmetic() {
    let mut rt = test_runtime();
    let seven = rt.alloc_int(7).unwrap();
    let two = rt.alloc_int(2).unwrap();
    let half = rt.alloc_float(0.5).unwrap();

    let cases: [(BinaryOp, ObjRef, ObjRef, &str); 9] = [
        (Runtime::add, seven, two, "9"),
        (Runtime::sub, two, seven, "-5"),
        (Runtime::mul, seven, half, "3.500000"),
        (Runtime::true_div, seven, two, "3.500000"),
        (Runtime::floor_div, seven, two, "3"),
        (Runtime::floor_div, seven, half, "14.000000"),
        (Runtime::modulo, seven, two, "1"),
        (Runtime::pow, two, seven, "128"),
        (Runtime::add, seven, half, "7.500000"),
    ];
    for (op, a, b, expected) in cases {
        assert_eq!(eval(&mut rt, op, a, b), expected);
    }
    for obj in [seven, two, half] {
        rt.decref(obj);
    }
}

#[test]
fn arithmetic_errors() {
    let mut rt = test_runtime();
    let zero = rt.alloc_int(0).unwrap();
    let fzero = rt.alloc_float(0.0).unwrap();
    let one = rt.alloc_int(1).unwrap();
    let max = rt.alloc_int(i64::MAX).unwrap();
    let neg = rt.alloc_int(-1).unwrap();
    let s = rt.alloc_str("s").unwrap();

    let cases: [(BinaryOp, ObjRef, ObjRef, &str); 9] = [
        (Runtime::true_div, one, zero, "ZeroDivisionError: division by zero"),
        (
            Runtime::floor_div,
            one,
            zero,
            "ZeroDivisionError: integer division or modulo by zero",
        ),
        (
            Runtime::modulo,
            one,
            zero,
            "ZeroDivisionError: integer division or modulo by zero",
        ),
        (Runtime::modulo, one, fzero, "ZeroDivisionError: float modulo"),
        (
            Runtime::floor_div,
            one,
            fzero,
            "ZeroDivisionError: float floor division by zero",
        ),
        (Runtime::add, max, one, "OverflowError: integer overflow in +"),
        (Runtime::mul, max, max, "OverflowError: integer overflow in *"),
        (
            Runtime::add,
            one,
            s,
            "TypeError: unsupported operand type(s) for +: 'int' and 'str'",
        ),
        (Runtime::pow, one, neg, "1.000000"),
    ];
    for (op, a, b, expected) in cases {
        assert_eq!(eval(&mut rt, op, a, b), expected);
    }
    for obj in [zero, fzero, one, max, neg, s] {
        rt.decref(obj);
    }
}

#[test]
fn sequence_concatenation_and_repetition() {
    let mut rt = test_runtime();
    let ab = rt.alloc_str("ab").unwrap();
    let cd = rt.alloc_str("cd").unwrap();
    let three = rt.alloc_int(3).unwrap();
    let tuple = rt.alloc_tuple(&[three]).unwrap();
    let list = rt.alloc_list().unwrap();
    rt.list_append(list, ab).unwrap();

    assert_eq!(eval(&mut rt, Runtime::add, ab, cd), "\"abcd\"");
    assert_eq!(eval(&mut rt, Runtime::mul, ab, three), "\"ababab\"");
    assert_eq!(eval(&mut rt, Runtime::mul, three, ab), "\"ababab\"");
    assert_eq!(eval(&mut rt, Runtime::add, tuple, tuple), "(3, 3)");
    assert_eq!(eval(&mut rt, Runtime::add, list, list), "[\"ab\", \"ab\"]");
    assert_eq!(eval(&mut rt, Runtime::mul, list, three), "[\"ab\", \"ab\", \"ab\"]");
    assert_eq!(
        eval(&mut rt, Runtime::sub, ab, cd),
        "TypeError: unsupported operand type(s) for -: 'str' and 'str'"
    );

    for obj in [list, tuple, three, cd, ab] {
        rt.decref(obj);
    }
}

#[test]
fn oversized_repetition_is_an_error() {
    let mut rt = test_runtime();
    let ab = rt.alloc_str("ab").unwrap();
    let empty = rt.alloc_str("").unwrap();
    let one = rt.alloc_int(1).unwrap();
    let huge = rt.alloc_int(1 << 62).unwrap();
    let big = rt.alloc_int(1 << 61).unwrap();
    let negative = rt.alloc_int(-2).unwrap();
    let list = rt.alloc_list().unwrap();
    rt.list_append(list, one).unwrap();
    let empty_list = rt.alloc_list().unwrap();

    let too_long = "OverflowError: repeated sequence is too long";
    assert_eq!(eval(&mut rt, Runtime::mul, ab, huge), too_long);
    assert_eq!(eval(&mut rt, Runtime::mul, big, list), too_long);
    assert_eq!(eval(&mut rt, Runtime::mul, empty, huge), "\"\"");
    assert_eq!(eval(&mut rt, Runtime::mul, empty_list, huge), "[]");
    assert_eq!(eval(&mut rt, Runtime::mul, list, negative), "[]");
    assert_eq!(one.refcount(), 2);

    for obj in [empty_list, list, negative, big, huge, one, empty, ab] {
        rt.decref(obj);
    }
}

#[test]
fn comparisons() {
    let mut rt = test_runtime();
    let one = rt.alloc_int(1).unwrap();
    let one_f = rt.alloc_float(1.0).unwrap();
    let two = rt.alloc_int(2).unwrap();
    let apple = rt.alloc_str("apple").unwrap();
    let banana = rt.alloc_str("banana").unwrap();

    let cases: [(BinaryOp, ObjRef, ObjRef, &str); 9] = [
        (Runtime::eq, one, one_f, "True"),
        (Runtime::ne, one, two, "True"),
        (Runtime::lt, one, two, "True"),
        (Runtime::ge, one, two, "False"),
        (Runtime::le, one_f, one, "True"),
        (Runtime::lt, apple, banana, "True"),
        (Runtime::gt, apple, banana, "False"),
        (Runtime::eq, apple, one, "False"),
        (
            Runtime::lt,
            apple,
            one,
            "TypeError: '<' not supported between instances of 'str' and 'int'",
        ),
    ];
    for (op, a, b, expected) in cases {
        assert_eq!(eval(&mut rt, op, a, b), expected);
    }
    for obj in [one, one_f, two, apple, banana] {
        rt.decref(obj);
    }
}

#[test]
fn comparison_results_are_bools() {
    let mut rt = test_runtime();
    let a = rt.alloc_int(1).unwrap();
    let result = rt.eq(a, a).unwrap();
    assert!(rt.is_bool(result));
    assert_eq!(rt.bool_value(result), Some(true));
    assert_eq!(rt.type_name(result), "bool");
    rt.decref(result);
    rt.decref(a);
}

// ── Subscripts ──────────────────────────────────────────────────────────

#[test]
fn item_access() {
    let mut rt = test_runtime();
    let zero = rt.alloc_int(0).unwrap();
    let minus_one = rt.alloc_int(-1).unwrap();
    let five = rt.alloc_int(5).unwrap();
    let text = rt.alloc_str("h\u{e9}llo").unwrap();
    let tuple = rt.alloc_tuple(&[zero, five]).unwrap();

    assert_eq!(eval(&mut rt, Runtime::get_item, text, minus_one), "\"o\"");
    assert_eq!(eval(&mut rt, Runtime::get_item, tuple, minus_one), "5");
    assert_eq!(
        eval(&mut rt, Runtime::get_item, tuple, five),
        "IndexError: tuple index 5 out of range"
    );
    assert_eq!(
        eval(&mut rt, Runtime::get_item, text, five),
        "IndexError: string index 5 out of range"
    );
    assert_eq!(
        eval(&mut rt, Runtime::get_item, five, zero),
        "TypeError: 'int' object is not subscriptable"
    );
    assert_eq!(
        rt.set_item(tuple, zero, five).unwrap_err().to_string(),
        "TypeError: 'tuple' object does not support item assignment"
    );

    let one_char = rt.get_item(text, zero).unwrap();
    assert_eq!(rt.to_c_string(one_char).unwrap(), "h");
    rt.decref(one_char);

    for obj in [tuple, text, five, minus_one, zero] {
        rt.decref(obj);
    }
}

#[test]
fn dict_items_and_key_errors() {
    let mut rt = test_runtime();
    let dict = rt.alloc_dict().unwrap();
    let key = rt.alloc_str("x").unwrap();
    let value = rt.alloc_int(1).unwrap();

    assert_eq!(
        rt.get_item(dict, key).unwrap_err().to_string(),
        "KeyError: \"x\""
    );
    rt.set_item(dict, key, value).unwrap();
    let got = rt.get_item(dict, key).unwrap();
    assert_eq!(got, value);
    assert_eq!(value.refcount(), 3);
    rt.decref(got);
    rt.del_item(dict, key).unwrap();
    assert_eq!(
        rt.del_item(dict, key).unwrap_err().to_string(),
        "KeyError: \"x\""
    );

    for obj in [dict, key, value] {
        rt.decref(obj);
    }
}

// ── Length, truth, hashing ──────────────────────────────────────────────

#[test]
fn len_and_truthiness() {
    let mut rt = test_runtime();
    let empty = rt.alloc_str("").unwrap();
    let word = rt.alloc_str("\u{1F600}ok").unwrap();
    let zero = rt.alloc_float(0.0).unwrap();
    let list = rt.alloc_list().unwrap();
    let obj = rt.alloc_instance().unwrap();

    assert_eq!(rt.len(word).unwrap(), 3);
    assert_eq!(rt.len(list).unwrap(), 0);
    assert!(!rt.truthy(empty).unwrap());
    assert!(rt.truthy(word).unwrap());
    assert!(!rt.truthy(zero).unwrap());
    assert!(!rt.truthy(list).unwrap());
    assert!(rt.truthy(obj).unwrap());
    assert_eq!(
        rt.len(zero).unwrap_err().to_string(),
        "TypeError: object of type 'float' has no len()"
    );

    for o in [empty, word, zero, list, obj] {
        rt.decref(o);
    }
}

#[test]
fn hashes_follow_value_rules() {
    let mut rt = test_runtime();
    let minus_one = rt.alloc_int(-1).unwrap();
    let three = rt.alloc_int(3).unwrap();
    let three_f = rt.alloc_float(3.0).unwrap();
    let inf = rt.alloc_float(f64::INFINITY).unwrap();
    let pair = rt.alloc_tuple(&[three, three]).unwrap();

    assert_eq!(rt.hash(minus_one).unwrap(), -2);
    assert_eq!(rt.hash(three_f).unwrap(), rt.hash(three).unwrap());
    assert_eq!(rt.hash(inf).unwrap(), 0x0034_5678);
    assert_eq!(rt.hash(pair).unwrap(), (17 * 31 + 3) * 31 + 3);

    for obj in [pair, minus_one, three, three_f, inf] {
        rt.decref(obj);
    }
}

#[test]
fn instance_hash_and_eq_hooks() {
    fn constant_hash(rt: &mut Runtime, _: ObjRef, _: Option<ObjRef>) -> RtResult<Option<ObjRef>> {
        rt.alloc_int(-1).map(Some)
    }
    fn always_equal(rt: &mut Runtime, _: ObjRef, _: Option<ObjRef>) -> RtResult<Option<ObjRef>> {
        rt.alloc_bool(true).map(Some)
    }

    let mut rt = test_runtime();
    let obj = rt.alloc_instance().unwrap();
    let other = rt.alloc_instance().unwrap();
    assert_eq!(rt.hash(obj).unwrap(), identity_hash(obj.addr()));
    assert!(!rt.equals(obj, other).unwrap());

    let hash = rt.alloc_function("__hash__", 1, 1, Entry::Native(constant_hash)).unwrap();
    let eq = rt.alloc_function("__eq__", 1, 2, Entry::Native(always_equal)).unwrap();
    rt.set_member(obj, rt.name(Name::Hash), hash).unwrap();
    rt.set_member(obj, rt.name(Name::Eq), eq).unwrap();
    assert_eq!(rt.hash(obj).unwrap(), -2);
    assert!(rt.equals(obj, other).unwrap());

    for o in [hash, eq, obj, other] {
        rt.decref(o);
    }
}

// ── Text and casts ──────────────────────────────────────────────────────

#[test]
fn to_string_formats() {
    let mut rt = test_runtime();
    let n = rt.alloc_int(-12).unwrap();
    let t = rt.alloc_bool(true).unwrap();
    let f = rt.alloc_float(2.5).unwrap();
    let nan = rt.alloc_float(f64::NAN).unwrap();
    let s = rt.alloc_str("hi").unwrap();
    let b = rt.alloc_bytes(b"a'\n\x01").unwrap();
    let single = rt.alloc_tuple(&[n]).unwrap();
    let pair = rt.alloc_tuple(&[n, s]).unwrap();
    let list = rt.alloc_list().unwrap();
    rt.list_append(list, s).unwrap();
    rt.list_append(list, f).unwrap();
    let dict = rt.alloc_dict().unwrap();
    rt.dict_set(dict, s, t).unwrap();
    let set = rt.alloc_set().unwrap();
    let empty_set = rt.alloc_set().unwrap();
    rt.set_add(set, n).unwrap();
    let func = rt.list_methods[0];

    let expected = [
        (n, "-12"),
        (t, "True"),
        (f, "2.500000"),
        (nan, "nan"),
        (s, "hi"),
        (b, "b'a\\'\\n\\x01'"),
        (single, "(-12,)"),
        (pair, "(-12, \"hi\")"),
        (list, "[\"hi\", 2.500000]"),
        (dict, "{\"hi\": True}"),
        (set, "{-12}"),
        (empty_set, "set()"),
        (func, "<function append>"),
    ];
    for (obj, text) in expected {
        assert_eq!(render(&mut rt, obj), text);
    }

    let instance = rt.alloc_instance().unwrap();
    assert_eq!(
        render(&mut rt, instance),
        format!("<instance at {:#x}>", instance.addr())
    );

    for obj in [instance, empty_set, set, dict, list, pair, single, b, s, nan, f, t, n] {
        rt.decref(obj);
    }
}

#[test]
fn joined_and_formatted_strings() {
    let mut rt = test_runtime();
    let label = rt.alloc_str("pi=").unwrap();
    let pi = rt.alloc_float(3.14159).unwrap();
    let joined = rt.joined_str(&[label, pi]).unwrap();
    assert_eq!(rt.to_c_string(joined).unwrap(), "pi=3.141590");

    let two = rt.format_value(pi, ".2f").unwrap();
    assert_eq!(rt.to_c_string(two).unwrap(), "3.14");
    let plain = rt.format_value(label, ".2f").unwrap();
    assert_eq!(rt.to_c_string(plain).unwrap(), "pi=");

    for obj in [plain, two, joined, pi, label] {
        rt.decref(obj);
    }
}

#[test]
fn casts() {
    let mut rt = test_runtime();
    let f = rt.alloc_float(-2.7).unwrap();
    let t = rt.alloc_bool(true).unwrap();
    let digits = rt.alloc_str(" 42 ").unwrap();
    let junk = rt.alloc_str("4x").unwrap();
    let list = rt.alloc_list().unwrap();

    let i = rt.cast_to_int(f).unwrap();
    assert_eq!(rt.int_value(i), Some(-2));
    let one = rt.cast_to_int(t).unwrap();
    assert!(!rt.is_bool(one));
    let parsed = rt.cast_to_int(digits).unwrap();
    assert_eq!(rt.int_value(parsed), Some(42));
    let as_float = rt.cast_to_float(digits).unwrap();
    assert_eq!(rt.float_value(as_float), Some(42.0));

    assert_eq!(
        rt.cast_to_int(junk).unwrap_err().to_string(),
        "ValueError: invalid literal for int() with base 10: '4x'"
    );
    assert_eq!(
        rt.cast_to_float(list).unwrap_err().to_string(),
        "TypeError: float() argument must be a string or a number, not 'list'"
    );

    for obj in [as_float, parsed, one, i, list, junk, digits, t, f] {
        rt.decref(obj);
    }
}
