//! Growable arrays.
//!
//! The item buffer comes from the size-class router and doubles when full.
//! After a removal the buffer halves while the list is at most a quarter
//! full, never below [`MIN_CAPACITY`] (when `list_shrink` is enabled).
//! Lists own a reference to each element.

use std::mem::size_of;
use std::ptr::{self, NonNull};

use ng_alloc::Origin;

use crate::object::{list_slice, tuple_slice, ListObj, ObjRef, TupleObj, TypeTag};
use crate::{RtResult, Runtime, RuntimeError};

/// Smallest item buffer a list ever has.
pub const MIN_CAPACITY: usize = 4;

/// Resolve a possibly negative index against `len`.
pub(crate) fn normalize_index(index: i64, len: usize) -> Option<usize> {
    let len = i64::try_from(len).ok()?;
    let resolved = if index < 0 { index + len } else { index };
    if !(0..len).contains(&resolved) {
        return None;
    }
    usize::try_from(resolved).ok()
}

impl Runtime {
    pub fn alloc_list(&mut self) -> RtResult<ObjRef> {
        self.alloc_list_with_capacity(MIN_CAPACITY)
    }

    /// An empty list with room for `capacity` items (at least
    /// [`MIN_CAPACITY`]).
    pub fn alloc_list_with_capacity(&mut self, capacity: usize) -> RtResult<ObjRef> {
        let cap = capacity.max(MIN_CAPACITY);
        let (items, items_origin) = self.alloc_items(cap)?;
        let symbol = self.tag_symbol(TypeTag::List);
        let list = self.emplace(symbol, 0, |header| ListObj {
            header,
            attrs: None,
            len: 0,
            cap,
            items,
            items_origin,
        });
        match list {
            Ok(list) => Ok(ObjRef::from_object(list)),
            Err(err) => {
                // SAFETY: the buffer was just allocated and never shared.
                unsafe { self.heap.free(items.cast(), items_origin) };
                Err(err)
            }
        }
    }

    fn alloc_items(&mut self, cap: usize) -> RtResult<(NonNull<ObjRef>, Origin)> {
        let size = cap
            .checked_mul(size_of::<ObjRef>())
            .ok_or_else(|| RuntimeError::overflow("list capacity"))?;
        let allocation = self.heap.alloc(size, false)?;
        Ok((allocation.ptr.cast(), allocation.origin))
    }

    fn list_ptr(&mut self, list: ObjRef, op: &str) -> RtResult<NonNull<ListObj>> {
        self.expect::<ListObj>(list, op)
    }

    /// Move the items into a buffer of `new_cap` slots.
    fn list_resize(&mut self, list: NonNull<ListObj>, new_cap: usize) -> RtResult<()> {
        let (items, origin) = self.alloc_items(new_cap)?;
        // SAFETY: `list` is live; the new buffer holds `new_cap >= len`
        // slots and is distinct from the old one.
        unsafe {
            let list = &mut *list.as_ptr();
            debug_assert!(new_cap >= list.len);
            ptr::copy_nonoverlapping(list.items.as_ptr(), items.as_ptr(), list.len);
            self.heap.free(list.items.cast(), list.items_origin);
            list.items = items;
            list.items_origin = origin;
            list.cap = new_cap;
        }
        Ok(())
    }

    /// Double the capacity until `needed` items fit.
    fn list_reserve(&mut self, list: NonNull<ListObj>, needed: usize) -> RtResult<()> {
        // SAFETY: `list` is live.
        let cap = unsafe { (*list.as_ptr()).cap };
        if needed <= cap {
            return Ok(());
        }
        let mut new_cap = cap;
        while new_cap < needed {
            new_cap = new_cap
                .checked_mul(2)
                .ok_or_else(|| RuntimeError::overflow("list capacity"))?;
        }
        self.list_resize(list, new_cap)
    }

    /// Halve the buffer while it is at most a quarter full. A failed
    /// reallocation keeps the current buffer.
    fn list_maybe_shrink(&mut self, list: NonNull<ListObj>) {
        if !self.config.list_shrink {
            return;
        }
        // SAFETY: `list` is live.
        let (len, cap) = unsafe { ((*list.as_ptr()).len, (*list.as_ptr()).cap) };
        let mut new_cap = cap;
        while len <= new_cap / 4 && new_cap / 2 >= MIN_CAPACITY {
            new_cap /= 2;
        }
        if new_cap == cap {
            return;
        }
        if let Err(err) = self.list_resize(list, new_cap) {
            tracing::debug!(cap, new_cap, %err, "list shrink skipped");
        }
    }

    /// Remove the item at `index` without releasing it.
    fn list_take(&mut self, list: NonNull<ListObj>, index: usize) -> ObjRef {
        // SAFETY: `list` is live and `index < len` (checked by callers).
        let item = unsafe {
            let list = &mut *list.as_ptr();
            debug_assert!(index < list.len);
            let base = list.items.as_ptr();
            let item = base.add(index).read();
            ptr::copy(base.add(index + 1), base.add(index), list.len - index - 1);
            list.len -= 1;
            item
        };
        self.list_maybe_shrink(list);
        item
    }

    // ── Operations ──────────────────────────────────────────────────────

    /// Append a new reference to `item`.
    pub fn list_append(&mut self, list: ObjRef, item: ObjRef) -> RtResult<()> {
        let ptr = self.list_ptr(list, "append")?;
        // SAFETY: tag checked.
        let len = unsafe { (*ptr.as_ptr()).len };
        self.list_reserve(ptr, len + 1)?;
        self.incref(item);
        // SAFETY: capacity covers len + 1 after reserve.
        unsafe {
            let list = &mut *ptr.as_ptr();
            list.items.as_ptr().add(len).write(item);
            list.len += 1;
        }
        Ok(())
    }

    /// Remove and return the item at `index` (default: last). The list's
    /// reference passes to the caller.
    pub fn list_pop(&mut self, list: ObjRef, index: Option<i64>) -> RtResult<ObjRef> {
        let ptr = self.list_ptr(list, "pop")?;
        // SAFETY: tag checked.
        let len = unsafe { (*ptr.as_ptr()).len };
        if len == 0 {
            return Err(RuntimeError::Index {
                message: "pop from empty list",
            });
        }
        let position = match index {
            None => len - 1,
            Some(index) => normalize_index(index, len).ok_or(RuntimeError::IndexOutOfRange {
                container: "pop",
                index,
            })?,
        };
        Ok(self.list_take(ptr, position))
    }

    /// Remove the first element identical to `item` and release it.
    pub fn list_remove(&mut self, list: ObjRef, item: ObjRef) -> RtResult<()> {
        let ptr = self.list_ptr(list, "remove")?;
        // SAFETY: tag checked.
        let position = unsafe { list_slice(ptr) }
            .iter()
            .position(|&candidate| candidate == item)
            .ok_or_else(|| RuntimeError::value_error("list.remove(x): x not in list"))?;
        let removed = self.list_take(ptr, position);
        self.decref(removed);
        Ok(())
    }

    /// Position of the first element identical to `item`.
    pub fn list_index(&mut self, list: ObjRef, item: ObjRef) -> RtResult<usize> {
        let ptr = self.list_ptr(list, "index")?;
        // SAFETY: tag checked.
        unsafe { list_slice(ptr) }
            .iter()
            .position(|&candidate| candidate == item)
            .ok_or_else(|| RuntimeError::value_error("list.index(x): x not in list"))
    }

    /// Append every element of `other` (a list or tuple; may be `list`).
    pub fn list_extend(&mut self, list: ObjRef, other: ObjRef) -> RtResult<()> {
        let ptr = self.list_ptr(list, "extend")?;
        // SAFETY: tags checked before each cast.
        let extra = unsafe {
            match other.tag() {
                TypeTag::List => (*other.as_ptr().cast::<ListObj>()).len,
                TypeTag::Tuple => (*other.as_ptr().cast::<TupleObj>()).len,
                _ => {
                    return Err(RuntimeError::type_error(format!(
                        "'{}' object is not iterable",
                        self.type_name(other)
                    )))
                }
            }
        };
        // SAFETY: tag checked.
        let len = unsafe { (*ptr.as_ptr()).len };
        self.list_reserve(ptr, len + extra)?;

        // Read the source after reserving: when extending a list with
        // itself, reserve has just moved its buffer.
        // SAFETY: the source holds `extra` items; the destination has room
        // for them past `len`. `ptr::copy` tolerates the self-extend case.
        unsafe {
            let source = match other.tag() {
                TypeTag::List => (*other.as_ptr().cast::<ListObj>()).items.as_ptr(),
                _ => tuple_slice(NonNull::new_unchecked(other.as_ptr().cast())).as_ptr(),
            };
            let list_obj = &mut *ptr.as_ptr();
            ptr::copy(source, list_obj.items.as_ptr().add(len), extra);
            list_obj.len += extra;
            for &item in &list_slice(ptr)[len..] {
                self.incref(item);
            }
        }
        Ok(())
    }

    /// Release every element. Capacity shrinks back toward the minimum.
    pub fn list_clear(&mut self, list: ObjRef) -> RtResult<()> {
        let ptr = self.list_ptr(list, "clear")?;
        // SAFETY: tag checked; len is zeroed before releasing so a
        // destructor that reaches this list sees it empty.
        let items: Vec<ObjRef> = unsafe {
            let items = list_slice(ptr).to_vec();
            (*ptr.as_ptr()).len = 0;
            items
        };
        for item in items {
            self.decref(item);
        }
        self.list_maybe_shrink(ptr);
        Ok(())
    }

    pub fn list_len(&mut self, list: ObjRef) -> RtResult<usize> {
        let ptr = self.list_ptr(list, "len")?;
        // SAFETY: tag checked.
        Ok(unsafe { (*ptr.as_ptr()).len })
    }

    pub fn list_capacity(&mut self, list: ObjRef) -> RtResult<usize> {
        let ptr = self.list_ptr(list, "capacity")?;
        // SAFETY: tag checked.
        Ok(unsafe { (*ptr.as_ptr()).cap })
    }

    /// Borrowed view of the elements.
    pub fn list_items(&mut self, list: ObjRef) -> RtResult<&[ObjRef]> {
        let ptr = self.list_ptr(list, "items")?;
        // SAFETY: tag checked; `&mut self` keeps the list alive and
        // unmodified while the slice is borrowed.
        Ok(unsafe { list_slice(ptr) })
    }

    /// Element at `index` (negative counts from the end), borrowed.
    pub fn list_get(&mut self, list: ObjRef, index: i64) -> RtResult<ObjRef> {
        let items = self.list_items(list)?;
        normalize_index(index, items.len())
            .map(|i| items[i])
            .ok_or(RuntimeError::IndexOutOfRange {
                container: "list",
                index,
            })
    }

    /// Replace the element at `index`, releasing the old one.
    pub fn list_set(&mut self, list: ObjRef, index: i64, item: ObjRef) -> RtResult<()> {
        let ptr = self.list_ptr(list, "__setitem__")?;
        // SAFETY: tag checked.
        let len = unsafe { (*ptr.as_ptr()).len };
        let position = normalize_index(index, len).ok_or(RuntimeError::IndexOutOfRange {
            container: "list",
            index,
        })?;
        self.incref(item);
        // SAFETY: position < len.
        let old = unsafe { ptr::replace((*ptr.as_ptr()).items.as_ptr().add(position), item) };
        self.decref(old);
        Ok(())
    }

    /// Remove the element at `index` and release it.
    pub fn list_delete(&mut self, list: ObjRef, index: i64) -> RtResult<()> {
        let ptr = self.list_ptr(list, "__delitem__")?;
        // SAFETY: tag checked.
        let len = unsafe { (*ptr.as_ptr()).len };
        let position = normalize_index(index, len).ok_or(RuntimeError::IndexOutOfRange {
            container: "list",
            index,
        })?;
        let removed = self.list_take(ptr, position);
        self.decref(removed);
        Ok(())
    }

    /// A new list holding the elements of `items`.
    pub(crate) fn list_from(&mut self, items: &[ObjRef]) -> RtResult<ObjRef> {
        let list = self.alloc_list_with_capacity(items.len())?;
        for &item in items {
            if let Err(err) = self.list_append(list, item) {
                self.decref(list);
                return Err(err);
            }
        }
        Ok(list)
    }
}
