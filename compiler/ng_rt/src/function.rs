//! Function objects and calls.
//!
//! A function wraps either a Rust [`NativeFn`] (builtins such as the list
//! methods) or an [`ExternFn`] emitted by the code generator. Both receive
//! the positional arguments as a tuple and the keyword arguments as an
//! optional dict, and return a new reference or nothing.

use std::fmt;
use std::ptr;

use smallvec::SmallVec;

use crate::names::Name;
use crate::object::{FunctionObj, ObjHeader, ObjRef, TupleObj, TypeTag};
use crate::{RtResult, Runtime, RuntimeError};

/// Builtin implemented in Rust.
pub type NativeFn = fn(&mut Runtime, ObjRef, Option<ObjRef>) -> RtResult<Option<ObjRef>>;

/// Compiled function: `(runtime, args, kwargs-or-null) -> result-or-null`.
/// Arguments are borrowed; the result is a new reference.
pub type ExternFn =
    unsafe extern "C" fn(*mut Runtime, *mut ObjHeader, *mut ObjHeader) -> *mut ObjHeader;

/// Where a function's code lives.
#[derive(Clone, Copy)]
pub enum Entry {
    Native(NativeFn),
    Extern(ExternFn),
}

impl fmt::Debug for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Entry::Native(entry) => write!(f, "Native({:p})", *entry as *const ()),
            Entry::Extern(entry) => write!(f, "Extern({:p})", *entry as *const ()),
        }
    }
}

impl Runtime {
    pub fn alloc_function(
        &mut self,
        name: &str,
        line: u32,
        arity: u32,
        entry: Entry,
    ) -> RtResult<ObjRef> {
        let name = self.symbols.intern(name)?;
        let symbol = self.tag_symbol(TypeTag::Function);
        let ptr = self.emplace(symbol, 0, |header| FunctionObj {
            header,
            name,
            line,
            arity,
            entry,
        })?;
        Ok(ObjRef::from_object(ptr))
    }

    fn function_obj(&mut self, function: ObjRef) -> RtResult<&FunctionObj> {
        let ptr = self.expect::<FunctionObj>(function, "function")?;
        // SAFETY: tag checked; `&mut self` keeps the function alive.
        Ok(unsafe { &*ptr.as_ptr() })
    }

    pub fn function_name(&mut self, function: ObjRef) -> RtResult<&str> {
        let name = self.function_obj(function)?.name;
        Ok(self.symbols.resolve(name).unwrap_or("<unknown>"))
    }

    pub fn function_arity(&mut self, function: ObjRef) -> RtResult<u32> {
        Ok(self.function_obj(function)?.arity)
    }

    pub fn function_line(&mut self, function: ObjRef) -> RtResult<u32> {
        Ok(self.function_obj(function)?.line)
    }

    /// Call `callee` with the positional tuple `args` and optional keyword
    /// dict `kwargs`. Both are consumed, whatever the outcome.
    pub fn call(
        &mut self,
        callee: ObjRef,
        args: ObjRef,
        kwargs: Option<ObjRef>,
    ) -> RtResult<Option<ObjRef>> {
        let result = self.dispatch(callee, args, kwargs);
        self.decref(args);
        self.decref_opt(kwargs);
        result
    }

    /// Call `callee` with borrowed positional arguments.
    pub fn call_with(&mut self, callee: ObjRef, args: &[ObjRef]) -> RtResult<Option<ObjRef>> {
        let args = self.alloc_tuple(args)?;
        self.call(callee, args, None)
    }

    fn dispatch(
        &mut self,
        callee: ObjRef,
        args: ObjRef,
        kwargs: Option<ObjRef>,
    ) -> RtResult<Option<ObjRef>> {
        self.expect::<TupleObj>(args, "call")?;
        match callee.tag() {
            TypeTag::Function => {
                let entry = self.function_obj(callee)?.entry;
                match entry {
                    Entry::Native(native) => native(self, args, kwargs),
                    Entry::Extern(compiled) => {
                        let kwargs = kwargs.map_or(ptr::null_mut(), ObjRef::as_ptr);
                        // SAFETY: generated code follows the ExternFn contract:
                        // it borrows its arguments and returns a new reference
                        // or null.
                        let result = unsafe { compiled(self, args.as_ptr(), kwargs) };
                        // SAFETY: a non-null result is a live object.
                        Ok(unsafe { ObjRef::from_raw(result) })
                    }
                }
            }
            TypeTag::Instance => {
                let Some(method) = self.get_member(callee, self.name(Name::Call))? else {
                    return Err(self.not_callable(callee));
                };
                let bound = self.prepend_tuple(callee, args);
                let result = match bound {
                    Ok(bound) => {
                        self.incref_opt(kwargs);
                        self.call(method, bound, kwargs)
                    }
                    Err(err) => Err(err),
                };
                self.decref(method);
                result
            }
            _ => Err(self.not_callable(callee)),
        }
    }

    fn not_callable(&mut self, callee: ObjRef) -> RuntimeError {
        RuntimeError::type_error(format!("'{}' object is not callable", self.type_name(callee)))
    }

    #[inline]
    fn incref_opt(&self, obj: Option<ObjRef>) {
        if let Some(obj) = obj {
            self.incref(obj);
        }
    }
}

// ── List methods ────────────────────────────────────────────────────────

/// List operations reachable as members of a list.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ListMethod {
    Append,
    Pop,
    Remove,
    Index,
    Extend,
    Clear,
}

impl ListMethod {
    pub(crate) const ALL: [ListMethod; 6] = [
        ListMethod::Append,
        ListMethod::Pop,
        ListMethod::Remove,
        ListMethod::Index,
        ListMethod::Extend,
        ListMethod::Clear,
    ];

    pub(crate) fn name(self) -> Name {
        match self {
            ListMethod::Append => Name::Append,
            ListMethod::Pop => Name::Pop,
            ListMethod::Remove => Name::Remove,
            ListMethod::Index => Name::Index,
            ListMethod::Extend => Name::Extend,
            ListMethod::Clear => Name::Clear,
        }
    }

    /// Arity counting `self`.
    fn arity(self) -> u32 {
        match self {
            ListMethod::Clear => 1,
            _ => 2,
        }
    }

    fn entry(self) -> NativeFn {
        match self {
            ListMethod::Append => list_append_builtin,
            ListMethod::Pop => list_pop_builtin,
            ListMethod::Remove => list_remove_builtin,
            ListMethod::Index => list_index_builtin,
            ListMethod::Extend => list_extend_builtin,
            ListMethod::Clear => list_clear_builtin,
        }
    }

    /// The function object bound to this method.
    pub(crate) fn materialize(self, rt: &mut Runtime) -> RtResult<ObjRef> {
        rt.alloc_function(self.name().text(), 0, self.arity(), Entry::Native(self.entry()))
    }
}

/// Positional arguments of a builtin, checked against `min..=max`.
fn unpack_args(
    rt: &mut Runtime,
    args: ObjRef,
    name: &str,
    min: usize,
    max: usize,
) -> RtResult<SmallVec<[ObjRef; 8]>> {
    let args: SmallVec<[ObjRef; 8]> = SmallVec::from_slice(rt.tuple_items(args)?);
    if (min..=max).contains(&args.len()) {
        return Ok(args);
    }
    let expected = if min == max {
        format!("exactly {min}")
    } else {
        format!("from {min} to {max}")
    };
    Err(RuntimeError::type_error(format!(
        "{name}() takes {expected} arguments ({} given)",
        args.len()
    )))
}

fn list_append_builtin(
    rt: &mut Runtime,
    args: ObjRef,
    _kwargs: Option<ObjRef>,
) -> RtResult<Option<ObjRef>> {
    let args = unpack_args(rt, args, "append", 2, 2)?;
    rt.list_append(args[0], args[1])?;
    Ok(None)
}

fn list_pop_builtin(
    rt: &mut Runtime,
    args: ObjRef,
    _kwargs: Option<ObjRef>,
) -> RtResult<Option<ObjRef>> {
    let args = unpack_args(rt, args, "pop", 1, 2)?;
    let index = match args.get(1) {
        Some(&index) => Some(rt.int_value(index).ok_or_else(|| {
            RuntimeError::type_error("list indices must be integers")
        })?),
        None => None,
    };
    rt.list_pop(args[0], index).map(Some)
}

fn list_remove_builtin(
    rt: &mut Runtime,
    args: ObjRef,
    _kwargs: Option<ObjRef>,
) -> RtResult<Option<ObjRef>> {
    let args = unpack_args(rt, args, "remove", 2, 2)?;
    rt.list_remove(args[0], args[1])?;
    Ok(None)
}

fn list_index_builtin(
    rt: &mut Runtime,
    args: ObjRef,
    _kwargs: Option<ObjRef>,
) -> RtResult<Option<ObjRef>> {
    let args = unpack_args(rt, args, "index", 2, 2)?;
    let position = rt.list_index(args[0], args[1])?;
    let position = i64::try_from(position).map_err(|_| RuntimeError::overflow("index"))?;
    rt.alloc_int(position).map(Some)
}

fn list_extend_builtin(
    rt: &mut Runtime,
    args: ObjRef,
    _kwargs: Option<ObjRef>,
) -> RtResult<Option<ObjRef>> {
    let args = unpack_args(rt, args, "extend", 2, 2)?;
    rt.list_extend(args[0], args[1])?;
    Ok(None)
}

fn list_clear_builtin(
    rt: &mut Runtime,
    args: ObjRef,
    _kwargs: Option<ObjRef>,
) -> RtResult<Option<ObjRef>> {
    let args = unpack_args(rt, args, "clear", 1, 1)?;
    rt.list_clear(args[0])?;
    Ok(None)
}

#[cfg(test)]
mod tests;
