//! Ints, bools, and floats.

use crate::object::{FloatObj, IntObj, ObjRef, TypeTag};
use crate::{RtResult, Runtime};

impl Runtime {
    pub fn alloc_int(&mut self, value: i64) -> RtResult<ObjRef> {
        let symbol = self.tag_symbol(TypeTag::Int);
        let ptr = self.emplace(symbol, 0, |header| IntObj { header, value })?;
        Ok(ObjRef::from_object(ptr))
    }

    /// A bool: an int tagged with the `bool` type name.
    pub fn alloc_bool(&mut self, value: bool) -> RtResult<ObjRef> {
        let symbol = self.bool_symbol();
        let ptr = self.emplace(symbol, 0, |mut header| {
            header.flag = value;
            IntObj {
                header,
                value: i64::from(value),
            }
        })?;
        Ok(ObjRef::from_object(ptr))
    }

    pub fn alloc_float(&mut self, value: f64) -> RtResult<ObjRef> {
        let symbol = self.tag_symbol(TypeTag::Float);
        let ptr = self.emplace(symbol, 0, |header| FloatObj { header, value })?;
        Ok(ObjRef::from_object(ptr))
    }

    /// Value of an int or bool.
    pub fn int_value(&self, obj: ObjRef) -> Option<i64> {
        // SAFETY: downcast checked the tag.
        obj.downcast::<IntObj>()
            .map(|ptr| unsafe { (*ptr.as_ptr()).value })
    }

    pub fn float_value(&self, obj: ObjRef) -> Option<f64> {
        // SAFETY: downcast checked the tag.
        obj.downcast::<FloatObj>()
            .map(|ptr| unsafe { (*ptr.as_ptr()).value })
    }

    pub fn is_bool(&self, obj: ObjRef) -> bool {
        obj.tag() == TypeTag::Int && obj.type_name_symbol() == self.bool_symbol()
    }

    /// Truth value of a bool object.
    pub fn bool_value(&self, obj: ObjRef) -> Option<bool> {
        self.is_bool(obj).then(|| obj.flag())
    }
}
