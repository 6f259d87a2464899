//! Generic operations over any object: arithmetic, comparison, indexing,
//! conversion, hashing, and truth testing.
//!
//! Every operation returns a new reference. Instances take part through
//! their dunder members (`__hash__`, `__len__`, `__str__`, `__int__`,
//! `__float__`, `__eq__`).

mod arith;
mod compare;
mod convert;
mod item;

use smallvec::SmallVec;

use crate::hash::{combine, float_hash, identity_hash, int_hash, TUPLE_HASH_SEED};
use crate::names::Name;
use crate::object::{BytesObj, FloatObj, IntObj, ObjRef, StrObj, TypeTag};
use crate::stack::ensure_sufficient_stack;
use crate::{RtResult, Runtime, RuntimeError};

/// A number operand; bools count as ints.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum Num {
    Int(i64),
    Float(f64),
}

impl Num {
    #[expect(clippy::cast_precision_loss, reason = "mixed arithmetic is float arithmetic")]
    pub(crate) fn as_f64(self) -> f64 {
        match self {
            Num::Int(value) => value as f64,
            Num::Float(value) => value,
        }
    }
}

/// Numeric value of `obj`, if it is an int, bool, or float.
pub(crate) fn num(obj: ObjRef) -> Option<Num> {
    // SAFETY: each downcast checked the tag.
    unsafe {
        if let Some(int) = obj.downcast::<IntObj>() {
            return Some(Num::Int((*int.as_ptr()).value));
        }
        obj.downcast::<FloatObj>()
            .map(|float| Num::Float((*float.as_ptr()).value))
    }
}

impl Runtime {
    /// Hash used for dict and set keys.
    pub fn hash(&mut self, obj: ObjRef) -> RtResult<i64> {
        // SAFETY: the tag selects the layout for each cast.
        unsafe {
            match obj.tag() {
                TypeTag::Int => Ok(int_hash((*obj.as_ptr().cast::<IntObj>()).value)),
                TypeTag::Float => Ok(float_hash((*obj.as_ptr().cast::<FloatObj>()).value)),
                TypeTag::Str => Ok((*obj.as_ptr().cast::<StrObj>()).hash),
                TypeTag::Bytes => Ok((*obj.as_ptr().cast::<BytesObj>()).hash),
                TypeTag::Tuple => ensure_sufficient_stack(|| {
                    let items: SmallVec<[ObjRef; 8]> = SmallVec::from_slice(self.tuple_items(obj)?);
                    let mut hash = TUPLE_HASH_SEED;
                    for item in items {
                        hash = combine(hash, self.hash(item)?);
                    }
                    Ok(hash)
                }),
                TypeTag::Instance => match self.call_hook(obj, Name::Hash, &[])? {
                    Some(result) => {
                        let value = self.int_value(result);
                        self.decref(result);
                        value.map(int_hash).ok_or_else(|| {
                            RuntimeError::type_error("__hash__ method should return an integer")
                        })
                    }
                    None => Ok(identity_hash(obj.addr())),
                },
                TypeTag::Base
                | TypeTag::List
                | TypeTag::Dict
                | TypeTag::Set
                | TypeTag::Function => Ok(identity_hash(obj.addr())),
            }
        }
    }

    /// Number of elements: code points of a string, bytes, items of a
    /// container, or an instance's `__len__`.
    pub fn len(&mut self, obj: ObjRef) -> RtResult<usize> {
        match obj.tag() {
            TypeTag::Str => self.str_len(obj),
            TypeTag::Bytes => Ok(self.bytes_data(obj)?.len()),
            TypeTag::Tuple => self.tuple_len(obj),
            TypeTag::List => self.list_len(obj),
            TypeTag::Dict => self.dict_len(obj),
            TypeTag::Set => self.set_len(obj),
            TypeTag::Instance => {
                let Some(result) = self.call_hook(obj, Name::Len, &[])? else {
                    return Err(self.no_len(obj));
                };
                let value = self.int_value(result);
                self.decref(result);
                let value = value.ok_or_else(|| {
                    RuntimeError::type_error("__len__() should return an integer")
                })?;
                usize::try_from(value)
                    .map_err(|_| RuntimeError::value_error("__len__() should return >= 0"))
            }
            TypeTag::Base | TypeTag::Int | TypeTag::Float | TypeTag::Function => {
                Err(self.no_len(obj))
            }
        }
    }

    fn no_len(&mut self, obj: ObjRef) -> RuntimeError {
        RuntimeError::type_error(format!("object of type '{}' has no len()", self.type_name(obj)))
    }

    /// Truth value: zero numbers and empty containers are false.
    pub fn truthy(&mut self, obj: ObjRef) -> RtResult<bool> {
        match obj.tag() {
            TypeTag::Int | TypeTag::Float => Ok(num(obj).is_some_and(|n| n.as_f64() != 0.0)),
            TypeTag::Str | TypeTag::Bytes | TypeTag::Tuple | TypeTag::List | TypeTag::Dict
            | TypeTag::Set => Ok(self.len(obj)? > 0),
            TypeTag::Instance => match self.call_hook(obj, Name::Len, &[])? {
                Some(result) => {
                    let value = self.int_value(result);
                    self.decref(result);
                    Ok(value.is_some_and(|n| n != 0))
                }
                None => Ok(true),
            },
            TypeTag::Base | TypeTag::Function => Ok(true),
        }
    }

    fn unsupported(&mut self, op: &'static str, left: ObjRef, right: ObjRef) -> RuntimeError {
        RuntimeError::UnsupportedOperands {
            op,
            left: self.type_name(left),
            right: self.type_name(right),
        }
    }
}

#[cfg(test)]
mod tests;
