//! C entry points for generated code.
//!
//! Each `ng_*` function forwards to the [`Runtime`] method of the same name.
//! Object arguments are borrowed; returned objects are new references unless
//! noted. Any error terminates the process through [`fail::terminate`].
//!
//! Generated code passes the runtime pointer from [`ng_runtime_new`] and
//! object pointers it holds a reference to. Null is accepted only where
//! documented.

#![allow(
    clippy::cast_possible_wrap,
    reason = "lengths cross the ABI as i64"
)]

use std::ffi::{c_char, CStr};
use std::ptr::{self, NonNull};

use crate::fail::{or_terminate, terminate};
use crate::{init_tracing, ObjHeader, ObjRef, Runtime, RuntimeConfig, RuntimeError};

fn runtime<'a>(rt: *mut Runtime) -> &'a mut Runtime {
    // SAFETY: generated code only passes pointers from ng_runtime_new.
    match unsafe { rt.as_mut() } {
        Some(rt) => rt,
        None => terminate(&RuntimeError::type_error("NULL runtime pointer")),
    }
}

fn object(ptr: *mut ObjHeader) -> ObjRef {
    // SAFETY: non-null object pointers from generated code are live.
    match unsafe { ObjRef::from_raw(ptr) } {
        Some(obj) => obj,
        None => terminate(&RuntimeError::type_error("NULL object pointer")),
    }
}

fn optional(ptr: *mut ObjHeader) -> Option<ObjRef> {
    // SAFETY: as for `object`.
    unsafe { ObjRef::from_raw(ptr) }
}

fn into_raw(obj: Option<ObjRef>) -> *mut ObjHeader {
    obj.map_or(ptr::null_mut(), ObjRef::as_ptr)
}

/// Bytes at `data`, or an empty slice for a null pointer.
fn byte_slice<'a>(data: *const u8, len: usize) -> &'a [u8] {
    if data.is_null() || len == 0 {
        return &[];
    }
    // SAFETY: the caller passes `len` readable bytes at `data`.
    unsafe { std::slice::from_raw_parts(data, len) }
}

// ── Runtime lifecycle ───────────────────────────────────────────────────

/// Create a runtime configured from the environment.
#[no_mangle]
pub extern "C" fn ng_runtime_new() -> *mut Runtime {
    init_tracing();
    let rt = or_terminate(Runtime::with_config(RuntimeConfig::from_env()));
    Box::into_raw(Box::new(rt))
}

/// Destroy a runtime. Null is ignored.
#[no_mangle]
pub extern "C" fn ng_runtime_free(rt: *mut Runtime) {
    if rt.is_null() {
        return;
    }
    // SAFETY: `rt` came from ng_runtime_new and is freed once.
    drop(unsafe { Box::from_raw(rt) });
}

// ── Memory ──────────────────────────────────────────────────────────────

/// Allocate `size` bytes; the block's origin is stored at `origin_out`
/// (`-1` for a direct allocation).
#[no_mangle]
pub extern "C" fn ng_alloc(
    rt: *mut Runtime,
    size: usize,
    zeroed: bool,
    origin_out: *mut i32,
) -> *mut u8 {
    let allocation = or_terminate(runtime(rt).alloc(size, zeroed));
    if !origin_out.is_null() {
        // SAFETY: non-null `origin_out` points to writable storage.
        unsafe { origin_out.write(allocation.origin.to_raw()) };
    }
    allocation.ptr.as_ptr()
}

/// Return a block from [`ng_alloc`].
#[no_mangle]
pub extern "C" fn ng_free(rt: *mut Runtime, ptr: *mut u8, origin: i32) {
    let rt = runtime(rt);
    let Some(ptr) = NonNull::new(ptr) else {
        return;
    };
    let Some(origin) = rt.decode_origin(origin) else {
        terminate(&RuntimeError::value_error(format!("invalid block origin {origin}")));
    };
    // SAFETY: generated code pairs each ng_alloc with one ng_free.
    unsafe { rt.free(ptr, origin) };
}

/// Add a reference. Returns `obj`; null passes through.
#[no_mangle]
pub extern "C" fn ng_incref(rt: *mut Runtime, obj: *mut ObjHeader) -> *mut ObjHeader {
    if let Some(obj) = optional(obj) {
        runtime(rt).incref(obj);
    }
    obj
}

/// Release a reference. Null is ignored.
#[no_mangle]
pub extern "C" fn ng_decref(rt: *mut Runtime, obj: *mut ObjHeader) {
    if let Some(obj) = optional(obj) {
        runtime(rt).decref(obj);
    }
}

/// Intern a NUL-terminated UTF-8 name.
#[no_mangle]
pub extern "C" fn ng_get_symbol_id(rt: *mut Runtime, name: *const c_char) -> u32 {
    if name.is_null() {
        terminate(&RuntimeError::type_error("NULL symbol name"));
    }
    // SAFETY: non-null `name` is a NUL-terminated string.
    let name = unsafe { CStr::from_ptr(name) }.to_string_lossy();
    or_terminate(runtime(rt).get_symbol_id(&name)).raw()
}

// ── Constructors ────────────────────────────────────────────────────────

#[no_mangle]
pub extern "C" fn ng_alloc_int(rt: *mut Runtime, value: i64) -> *mut ObjHeader {
    or_terminate(runtime(rt).alloc_int(value)).as_ptr()
}

#[no_mangle]
pub extern "C" fn ng_alloc_float(rt: *mut Runtime, value: f64) -> *mut ObjHeader {
    or_terminate(runtime(rt).alloc_float(value)).as_ptr()
}

#[no_mangle]
pub extern "C" fn ng_alloc_bool(rt: *mut Runtime, value: bool) -> *mut ObjHeader {
    or_terminate(runtime(rt).alloc_bool(value)).as_ptr()
}

/// String from `len` bytes of UTF-8; invalid sequences become U+FFFD.
#[no_mangle]
pub extern "C" fn ng_alloc_string(rt: *mut Runtime, data: *const u8, len: usize) -> *mut ObjHeader {
    or_terminate(runtime(rt).alloc_str_lossy(byte_slice(data, len))).as_ptr()
}

#[no_mangle]
pub extern "C" fn ng_alloc_bytes(rt: *mut Runtime, data: *const u8, len: usize) -> *mut ObjHeader {
    or_terminate(runtime(rt).alloc_bytes(byte_slice(data, len))).as_ptr()
}

/// Tuple of the `len` objects at `items`.
#[no_mangle]
pub extern "C" fn ng_alloc_tuple(
    rt: *mut Runtime,
    items: *const *mut ObjHeader,
    len: usize,
) -> *mut ObjHeader {
    let items: Vec<ObjRef> = if items.is_null() || len == 0 {
        Vec::new()
    } else {
        // SAFETY: the caller passes `len` object pointers at `items`.
        unsafe { std::slice::from_raw_parts(items, len) }
            .iter()
            .map(|&item| object(item))
            .collect()
    };
    or_terminate(runtime(rt).alloc_tuple(&items)).as_ptr()
}

#[no_mangle]
pub extern "C" fn ng_alloc_list(rt: *mut Runtime) -> *mut ObjHeader {
    or_terminate(runtime(rt).alloc_list()).as_ptr()
}

#[no_mangle]
pub extern "C" fn ng_alloc_list_with_capacity(rt: *mut Runtime, capacity: usize) -> *mut ObjHeader {
    or_terminate(runtime(rt).alloc_list_with_capacity(capacity)).as_ptr()
}

#[no_mangle]
pub extern "C" fn ng_alloc_instance(rt: *mut Runtime) -> *mut ObjHeader {
    or_terminate(runtime(rt).alloc_instance()).as_ptr()
}

// ── Dicts and lists ─────────────────────────────────────────────────────

#[no_mangle]
pub extern "C" fn ng_dict_create(rt: *mut Runtime) -> *mut ObjHeader {
    or_terminate(runtime(rt).alloc_dict()).as_ptr()
}

#[no_mangle]
pub extern "C" fn ng_dict_set(
    rt: *mut Runtime,
    dict: *mut ObjHeader,
    key: *mut ObjHeader,
    value: *mut ObjHeader,
) {
    or_terminate(runtime(rt).dict_set(object(dict), object(key), object(value)));
}

/// Borrowed value for `key`, or null.
#[no_mangle]
pub extern "C" fn ng_dict_get(
    rt: *mut Runtime,
    dict: *mut ObjHeader,
    key: *mut ObjHeader,
) -> *mut ObjHeader {
    into_raw(or_terminate(runtime(rt).dict_get(object(dict), object(key))))
}

#[no_mangle]
pub extern "C" fn ng_dict_del(rt: *mut Runtime, dict: *mut ObjHeader, key: *mut ObjHeader) -> bool {
    or_terminate(runtime(rt).dict_del(object(dict), object(key)))
}

/// Release the caller's reference to `dict`.
#[no_mangle]
pub extern "C" fn ng_dict_destroy(rt: *mut Runtime, dict: *mut ObjHeader) {
    or_terminate(runtime(rt).dict_destroy(object(dict)));
}

#[no_mangle]
pub extern "C" fn ng_list_append(rt: *mut Runtime, list: *mut ObjHeader, item: *mut ObjHeader) {
    or_terminate(runtime(rt).list_append(object(list), object(item)));
}

/// Pop the last item; the caller receives the list's reference.
#[no_mangle]
pub extern "C" fn ng_list_pop(rt: *mut Runtime, list: *mut ObjHeader) -> *mut ObjHeader {
    or_terminate(runtime(rt).list_pop(object(list), None)).as_ptr()
}

/// Pop the item at `index` (negative counts from the end).
#[no_mangle]
pub extern "C" fn ng_list_pop_at(
    rt: *mut Runtime,
    list: *mut ObjHeader,
    index: i64,
) -> *mut ObjHeader {
    or_terminate(runtime(rt).list_pop(object(list), Some(index))).as_ptr()
}

// ── Operators ───────────────────────────────────────────────────────────

macro_rules! binary_ops {
    ($($name:ident => $method:ident),* $(,)?) => {
        $(
            #[doc = concat!("[`Runtime::", stringify!($method), "`] for generated code.")]
            #[no_mangle]
            pub extern "C" fn $name(
                rt: *mut Runtime,
                a: *mut ObjHeader,
                b: *mut ObjHeader,
            ) -> *mut ObjHeader {
                or_terminate(runtime(rt).$method(object(a), object(b))).as_ptr()
            }
        )*
    };
}

binary_ops! {
    ng_add => add,
    ng_sub => sub,
    ng_mul => mul,
    ng_true_div => true_div,
    ng_floor_div => floor_div,
    ng_mod => modulo,
    ng_pow => pow,
    ng_eq => eq,
    ng_ne => ne,
    ng_lt => lt,
    ng_le => le,
    ng_gt => gt,
    ng_ge => ge,
    ng_get_item => get_item,
}

#[no_mangle]
pub extern "C" fn ng_set_item(
    rt: *mut Runtime,
    container: *mut ObjHeader,
    key: *mut ObjHeader,
    value: *mut ObjHeader,
) {
    or_terminate(runtime(rt).set_item(object(container), object(key), object(value)));
}

#[no_mangle]
pub extern "C" fn ng_del_item(rt: *mut Runtime, container: *mut ObjHeader, key: *mut ObjHeader) {
    or_terminate(runtime(rt).del_item(object(container), object(key)));
}

// ── Members, conversion, calls ──────────────────────────────────────────

/// New reference to the member, or null when unset.
#[no_mangle]
pub extern "C" fn ng_get_member(
    rt: *mut Runtime,
    obj: *mut ObjHeader,
    name: *mut ObjHeader,
) -> *mut ObjHeader {
    into_raw(or_terminate(runtime(rt).get_member(object(obj), object(name))))
}

#[no_mangle]
pub extern "C" fn ng_set_member(
    rt: *mut Runtime,
    obj: *mut ObjHeader,
    name: *mut ObjHeader,
    value: *mut ObjHeader,
) {
    or_terminate(runtime(rt).set_member(object(obj), object(name), object(value)));
}

#[no_mangle]
pub extern "C" fn ng_del_member(
    rt: *mut Runtime,
    obj: *mut ObjHeader,
    name: *mut ObjHeader,
) -> bool {
    or_terminate(runtime(rt).del_member(object(obj), object(name)))
}

#[no_mangle]
pub extern "C" fn ng_to_string(rt: *mut Runtime, obj: *mut ObjHeader) -> *mut ObjHeader {
    or_terminate(runtime(rt).to_string(object(obj))).as_ptr()
}

#[no_mangle]
pub extern "C" fn ng_len(rt: *mut Runtime, obj: *mut ObjHeader) -> i64 {
    or_terminate(runtime(rt).len(object(obj))) as i64
}

#[no_mangle]
pub extern "C" fn ng_truthy(rt: *mut Runtime, obj: *mut ObjHeader) -> bool {
    or_terminate(runtime(rt).truthy(object(obj)))
}

/// Call `callee`. `args` (a tuple) and `kwargs` (a dict or null) are
/// consumed. Returns the result, or null when the callee returned nothing.
#[no_mangle]
pub extern "C" fn ng_call(
    rt: *mut Runtime,
    callee: *mut ObjHeader,
    args: *mut ObjHeader,
    kwargs: *mut ObjHeader,
) -> *mut ObjHeader {
    into_raw(or_terminate(runtime(rt).call(object(callee), object(args), optional(kwargs))))
}
