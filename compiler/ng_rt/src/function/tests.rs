//! Tests for function objects and call dispatch.

#![allow(
    clippy::unwrap_used,
    reason = "test code uses unwrap for concise assertions"
)]

use pretty_assertions::assert_eq;

use super::*;
use crate::test_runtime;

/// Sum of the positional ints.
fn native_sum(rt: &mut Runtime, args: ObjRef, _kwargs: Option<ObjRef>) -> RtResult<Option<ObjRef>> {
    let items = rt.tuple_items(args)?.to_vec();
    let mut total = 0;
    for item in items {
        total += rt.int_value(item).unwrap_or_default();
    }
    rt.alloc_int(total).map(Some)
}

/// Number of keyword arguments.
fn native_kwarg_count(
    rt: &mut Runtime,
    _args: ObjRef,
    kwargs: Option<ObjRef>,
) -> RtResult<Option<ObjRef>> {
    let count = match kwargs {
        Some(kwargs) => rt.dict_len(kwargs)?,
        None => 0,
    };
    rt.alloc_int(i64::try_from(count).unwrap()).map(Some)
}

/// Compiled-style entry: returns its first argument.
unsafe extern "C" fn extern_first(
    rt: *mut Runtime,
    args: *mut ObjHeader,
    _kwargs: *mut ObjHeader,
) -> *mut ObjHeader {
    let rt = &mut *rt;
    let args = ObjRef::from_raw(args).unwrap();
    match rt.tuple_items(args).unwrap().first().copied() {
        Some(first) => rt.incref(first).as_ptr(),
        None => ptr::null_mut(),
    }
}

#[test]
fn accessors() {
    let mut rt = test_runtime();
    let f = rt.alloc_function("sum", 12, 2, Entry::Native(native_sum)).unwrap();
    assert_eq!(rt.function_name(f).unwrap(), "sum");
    assert_eq!(rt.function_line(f).unwrap(), 12);
    assert_eq!(rt.function_arity(f).unwrap(), 2);
    rt.decref(f);
}

#[test]
fn native_call_consumes_arguments() {
    let mut rt = test_runtime();
    let baseline = rt.stats().live_objects();
    let f = rt.alloc_function("sum", 1, 2, Entry::Native(native_sum)).unwrap();
    let a = rt.alloc_int(2).unwrap();
    let b = rt.alloc_int(40).unwrap();
    let args = rt.alloc_tuple(&[a, b]).unwrap();
    rt.decref(a);
    rt.decref(b);

    let result = rt.call(f, args, None).unwrap().unwrap();
    assert_eq!(rt.int_value(result), Some(42));
    rt.decref(result);
    rt.decref(f);
    assert_eq!(rt.stats().live_objects(), baseline);
}

#[test]
fn keyword_arguments_reach_the_callee() {
    let mut rt = test_runtime();
    let f = rt
        .alloc_function("kw", 1, 0, Entry::Native(native_kwarg_count))
        .unwrap();
    let kwargs = rt.alloc_dict().unwrap();
    let key = rt.alloc_str("flag").unwrap();
    rt.dict_set(kwargs, key, key).unwrap();
    rt.decref(key);
    let args = rt.alloc_tuple(&[]).unwrap();

    let result = rt.call(f, args, Some(kwargs)).unwrap().unwrap();
    assert_eq!(rt.int_value(result), Some(1));
    rt.decref(result);
    rt.decref(f);
}

#[test]
fn extern_entry_receives_raw_pointers() {
    let mut rt = test_runtime();
    let f = rt.alloc_function("first", 3, 1, Entry::Extern(extern_first)).unwrap();
    let x = rt.alloc_str("x").unwrap();

    let result = rt.call_with(f, &[x]).unwrap();
    assert_eq!(result, Some(x));
    assert_eq!(x.refcount(), 2);
    rt.decref(x);
    rt.decref(x);

    assert_eq!(rt.call_with(f, &[]).unwrap(), None);
    rt.decref(f);
}

#[test]
fn non_callables_are_type_errors() {
    let mut rt = test_runtime();
    let n = rt.alloc_int(1).unwrap();
    let err = rt.call_with(n, &[]).unwrap_err();
    assert_eq!(err.to_string(), "TypeError: 'int' object is not callable");

    let plain = rt.alloc_instance().unwrap();
    let err = rt.call_with(plain, &[]).unwrap_err();
    assert_eq!(err.to_string(), "TypeError: 'instance' object is not callable");

    rt.decref(n);
    rt.decref(plain);
}

#[test]
fn instances_call_through_dunder_call() {
    let mut rt = test_runtime();
    let f = rt.alloc_function("__call__", 1, 2, Entry::Native(native_sum)).unwrap();
    let callable = rt.alloc_instance().unwrap();
    rt.set_member(callable, rt.name(Name::Call), f).unwrap();
    rt.decref(f);

    // `self` is prepended, and an instance counts as 0 in `native_sum`.
    let five = rt.alloc_int(5).unwrap();
    let result = rt.call_with(callable, &[five]).unwrap().unwrap();
    assert_eq!(rt.int_value(result), Some(5));

    for obj in [result, five, callable] {
        rt.decref(obj);
    }
}

#[test]
fn list_methods_exist_for_every_variant() {
    let mut rt = test_runtime();
    for method in ListMethod::ALL {
        let function = rt.list_methods[method as usize];
        assert_eq!(rt.function_name(function).unwrap(), method.name().text());
    }
}
