//! Fixed-length tuples.

use std::mem::size_of;

use smallvec::SmallVec;

use crate::object::{trailing, tuple_slice, ObjRef, TupleObj, TypeTag};
use crate::{RtResult, Runtime};

impl Runtime {
    /// A tuple holding a new reference to each of `items`.
    pub fn alloc_tuple(&mut self, items: &[ObjRef]) -> RtResult<ObjRef> {
        let len = items.len();
        let symbol = self.tag_symbol(TypeTag::Tuple);
        let ptr = self.emplace(symbol, len * size_of::<ObjRef>(), |header| TupleObj {
            header,
            len,
        })?;
        for &item in items {
            self.incref(item);
        }
        // SAFETY: room for `len` handles follows the struct.
        unsafe {
            std::ptr::copy_nonoverlapping(items.as_ptr(), trailing::<_, ObjRef>(ptr), len);
        }
        Ok(ObjRef::from_object(ptr))
    }

    pub fn tuple_len(&mut self, tuple: ObjRef) -> RtResult<usize> {
        let ptr = self.expect::<TupleObj>(tuple, "tuple")?;
        // SAFETY: tag checked.
        Ok(unsafe { (*ptr.as_ptr()).len })
    }

    /// Borrowed view of the elements.
    pub fn tuple_items(&mut self, tuple: ObjRef) -> RtResult<&[ObjRef]> {
        let ptr = self.expect::<TupleObj>(tuple, "tuple")?;
        // SAFETY: tag checked; `&mut self` keeps the tuple alive.
        Ok(unsafe { tuple_slice(ptr) })
    }

    /// `a + b` for tuples.
    pub fn cat_tuple(&mut self, a: ObjRef, b: ObjRef) -> RtResult<ObjRef> {
        let mut items: SmallVec<[ObjRef; 8]> = SmallVec::from_slice(self.tuple_items(a)?);
        items.extend_from_slice(self.tuple_items(b)?);
        self.alloc_tuple(&items)
    }

    /// `(item,) + tuple`.
    pub fn prepend_tuple(&mut self, item: ObjRef, tuple: ObjRef) -> RtResult<ObjRef> {
        let mut items: SmallVec<[ObjRef; 8]> = SmallVec::new();
        items.push(item);
        items.extend_from_slice(self.tuple_items(tuple)?);
        self.alloc_tuple(&items)
    }
}
