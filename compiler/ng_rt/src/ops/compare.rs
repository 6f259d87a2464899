//! Comparison operators. Each returns a new bool object.

use std::cmp::Ordering;

use super::{num, Num};
use crate::names::Name;
use crate::object::{keys_equal, ObjRef, StrObj};
use crate::string::code_points;
use crate::{RtResult, Runtime, RuntimeError};

impl Runtime {
    /// Value equality: numbers by value across int and float, instances
    /// through `__eq__`, everything else by key equality.
    pub fn equals(&mut self, a: ObjRef, b: ObjRef) -> RtResult<bool> {
        if let (Some(x), Some(y)) = (num(a), num(b)) {
            return Ok(match (x, y) {
                (Num::Int(x), Num::Int(y)) => x == y,
                _ => x.as_f64() == y.as_f64(),
            });
        }
        if let Some(result) = self.call_hook(a, Name::Eq, &[b])? {
            let equal = self.truthy(result);
            self.decref(result);
            return equal;
        }
        Ok(keys_equal(a, b))
    }

    /// Ordering for `<`-style operators; `None` when unordered (NaN).
    fn order(&mut self, op: &str, a: ObjRef, b: ObjRef) -> RtResult<Option<Ordering>> {
        if let (Some(x), Some(y)) = (num(a), num(b)) {
            return Ok(match (x, y) {
                (Num::Int(x), Num::Int(y)) => Some(x.cmp(&y)),
                _ => x.as_f64().partial_cmp(&y.as_f64()),
            });
        }
        if let (Some(x), Some(y)) = (a.downcast::<StrObj>(), b.downcast::<StrObj>()) {
            // SAFETY: both tags checked.
            return Ok(Some(unsafe { code_points(x).cmp(code_points(y)) }));
        }
        Err(RuntimeError::type_error(format!(
            "'{op}' not supported between instances of '{}' and '{}'",
            self.type_name(a),
            self.type_name(b)
        )))
    }

    pub fn eq(&mut self, a: ObjRef, b: ObjRef) -> RtResult<ObjRef> {
        let equal = self.equals(a, b)?;
        self.alloc_bool(equal)
    }

    pub fn ne(&mut self, a: ObjRef, b: ObjRef) -> RtResult<ObjRef> {
        let equal = self.equals(a, b)?;
        self.alloc_bool(!equal)
    }

    pub fn lt(&mut self, a: ObjRef, b: ObjRef) -> RtResult<ObjRef> {
        let ordering = self.order("<", a, b)?;
        self.alloc_bool(ordering == Some(Ordering::Less))
    }

    pub fn le(&mut self, a: ObjRef, b: ObjRef) -> RtResult<ObjRef> {
        let ordering = self.order("<=", a, b)?;
        self.alloc_bool(matches!(ordering, Some(Ordering::Less | Ordering::Equal)))
    }

    pub fn gt(&mut self, a: ObjRef, b: ObjRef) -> RtResult<ObjRef> {
        let ordering = self.order(">", a, b)?;
        self.alloc_bool(ordering == Some(Ordering::Greater))
    }

    pub fn ge(&mut self, a: ObjRef, b: ObjRef) -> RtResult<ObjRef> {
        let ordering = self.order(">=", a, b)?;
        self.alloc_bool(matches!(ordering, Some(Ordering::Greater | Ordering::Equal)))
    }
}
