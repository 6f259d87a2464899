//! Dictionaries and sets.
//!
//! Both are [`RobinHoodTable`]s keyed by object hash with [`keys_equal`] as
//! the key comparison. They start with two slots and double when an insert
//! would push the load past 85%. The table holds one reference to each key
//! and value; lookups hand out borrowed references.

use std::ptr::NonNull;

use crate::object::{keys_equal, DictObj, ObjRef, SetObj, TypeTag};
use crate::table::{Insert, RobinHoodTable};
use crate::{RtResult, Runtime};

/// Table hash for an object hash.
#[inline]
#[expect(clippy::cast_sign_loss, reason = "hash bit pattern")]
pub(crate) fn slot_hash(hash: i64) -> u64 {
    hash as u64
}

impl Runtime {
    pub fn alloc_dict(&mut self) -> RtResult<ObjRef> {
        let symbol = self.tag_symbol(TypeTag::Dict);
        let ptr = self.emplace(symbol, 0, |header| DictObj {
            header,
            table: RobinHoodTable::new(),
        })?;
        Ok(ObjRef::from_object(ptr))
    }

    fn dict_ptr(&mut self, dict: ObjRef, op: &str) -> RtResult<NonNull<DictObj>> {
        self.expect::<DictObj>(dict, op)
    }

    /// Insert or update `key`. The dict takes a reference to both; on
    /// update the previous value and the duplicate key are released.
    pub fn dict_set(&mut self, dict: ObjRef, key: ObjRef, value: ObjRef) -> RtResult<()> {
        let ptr = self.dict_ptr(dict, "dict_set")?;
        let hash = slot_hash(self.hash(key)?);
        self.incref(key);
        self.incref(value);
        // SAFETY: tag checked.
        let table = unsafe { &mut (*ptr.as_ptr()).table };
        if let Insert::Replaced { key, old } =
            table.insert(hash, key, value, |a, b| keys_equal(*a, *b))
        {
            self.decref(key);
            self.decref(old);
        }
        Ok(())
    }

    /// Value stored under `key` (borrowed).
    pub fn dict_get(&mut self, dict: ObjRef, key: ObjRef) -> RtResult<Option<ObjRef>> {
        let ptr = self.dict_ptr(dict, "dict_get")?;
        let hash = slot_hash(self.hash(key)?);
        // SAFETY: tag checked.
        let table = unsafe { &(*ptr.as_ptr()).table };
        Ok(table.get(hash, |k| keys_equal(*k, key)).copied())
    }

    /// Remove `key`, releasing the stored key and value. Returns whether
    /// it was present.
    pub fn dict_del(&mut self, dict: ObjRef, key: ObjRef) -> RtResult<bool> {
        let ptr = self.dict_ptr(dict, "dict_del")?;
        let hash = slot_hash(self.hash(key)?);
        // SAFETY: tag checked.
        let table = unsafe { &mut (*ptr.as_ptr()).table };
        match table.remove(hash, |k| keys_equal(*k, key)) {
            Some((key, value)) => {
                self.decref(key);
                self.decref(value);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Release the caller's reference to `dict`.
    pub fn dict_destroy(&mut self, dict: ObjRef) -> RtResult<()> {
        self.dict_ptr(dict, "dict_destroy")?;
        self.decref(dict);
        Ok(())
    }

    pub fn dict_len(&mut self, dict: ObjRef) -> RtResult<usize> {
        let ptr = self.dict_ptr(dict, "dict_len")?;
        // SAFETY: tag checked.
        Ok(unsafe { (*ptr.as_ptr()).table.len() })
    }

    pub fn dict_capacity(&mut self, dict: ObjRef) -> RtResult<usize> {
        let ptr = self.dict_ptr(dict, "dict_capacity")?;
        // SAFETY: tag checked.
        Ok(unsafe { (*ptr.as_ptr()).table.capacity() })
    }

    /// Borrowed key/value pairs in slot order.
    pub fn dict_items(&mut self, dict: ObjRef) -> RtResult<Vec<(ObjRef, ObjRef)>> {
        let ptr = self.dict_ptr(dict, "dict_items")?;
        // SAFETY: tag checked.
        let table = unsafe { &(*ptr.as_ptr()).table };
        Ok(table.iter().map(|(k, v)| (*k, *v)).collect())
    }

    /// Probe sequence lengths of the dict's slots (0 = empty).
    pub fn dict_probe_lengths(&mut self, dict: ObjRef) -> RtResult<Vec<u32>> {
        let ptr = self.dict_ptr(dict, "dict_probe_lengths")?;
        // SAFETY: tag checked.
        let table = unsafe { &(*ptr.as_ptr()).table };
        Ok(table.probe_lengths().collect())
    }

    // ── Sets ────────────────────────────────────────────────────────────

    pub fn alloc_set(&mut self) -> RtResult<ObjRef> {
        let symbol = self.tag_symbol(TypeTag::Set);
        let ptr = self.emplace(symbol, 0, |header| SetObj {
            header,
            table: RobinHoodTable::new(),
        })?;
        Ok(ObjRef::from_object(ptr))
    }

    fn set_ptr(&mut self, set: ObjRef, op: &str) -> RtResult<NonNull<SetObj>> {
        self.expect::<SetObj>(set, op)
    }

    /// Add `item`. Returns `false` if an equal member was already present.
    pub fn set_add(&mut self, set: ObjRef, item: ObjRef) -> RtResult<bool> {
        let ptr = self.set_ptr(set, "set_add")?;
        let hash = slot_hash(self.hash(item)?);
        // SAFETY: tag checked.
        let table = unsafe { &mut (*ptr.as_ptr()).table };
        if table.find(hash, |k| keys_equal(*k, item)).is_some() {
            return Ok(false);
        }
        self.incref(item);
        table.insert(hash, item, (), |a, b| keys_equal(*a, *b));
        Ok(true)
    }

    pub fn set_contains(&mut self, set: ObjRef, item: ObjRef) -> RtResult<bool> {
        let ptr = self.set_ptr(set, "set_contains")?;
        let hash = slot_hash(self.hash(item)?);
        // SAFETY: tag checked.
        let table = unsafe { &(*ptr.as_ptr()).table };
        Ok(table.find(hash, |k| keys_equal(*k, item)).is_some())
    }

    /// Remove `item` if present.
    pub fn set_discard(&mut self, set: ObjRef, item: ObjRef) -> RtResult<bool> {
        let ptr = self.set_ptr(set, "set_discard")?;
        let hash = slot_hash(self.hash(item)?);
        // SAFETY: tag checked.
        let table = unsafe { &mut (*ptr.as_ptr()).table };
        match table.remove(hash, |k| keys_equal(*k, item)) {
            Some((member, ())) => {
                self.decref(member);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn set_len(&mut self, set: ObjRef) -> RtResult<usize> {
        let ptr = self.set_ptr(set, "set_len")?;
        // SAFETY: tag checked.
        Ok(unsafe { (*ptr.as_ptr()).table.len() })
    }

    /// Borrowed members in slot order.
    pub fn set_items(&mut self, set: ObjRef) -> RtResult<Vec<ObjRef>> {
        let ptr = self.set_ptr(set, "set_items")?;
        // SAFETY: tag checked.
        let table = unsafe { &(*ptr.as_ptr()).table };
        Ok(table.iter().map(|(k, ())| *k).collect())
    }
}
