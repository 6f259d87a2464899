//! Subscript operators: `a[k]`, `a[k] = v`, `del a[k]`.

use crate::list::normalize_index;
use crate::object::{ObjRef, TypeTag};
use crate::{RtResult, Runtime, RuntimeError};

impl Runtime {
    /// Integer subscript of a sequence, or a TypeError naming `container`.
    fn sequence_index(&mut self, container: &str, key: ObjRef) -> RtResult<i64> {
        self.int_value(key).ok_or_else(|| {
            RuntimeError::type_error(format!(
                "{container} indices must be integers, not '{}'",
                self.type_name(key)
            ))
        })
    }

    /// `container[key]` as a new reference.
    pub fn get_item(&mut self, container: ObjRef, key: ObjRef) -> RtResult<ObjRef> {
        match container.tag() {
            TypeTag::List => {
                let index = self.sequence_index("list", key)?;
                let item = self.list_get(container, index)?;
                Ok(self.incref(item))
            }
            TypeTag::Tuple => {
                let index = self.sequence_index("tuple", key)?;
                let items = self.tuple_items(container)?;
                let item = normalize_index(index, items.len())
                    .map(|i| items[i])
                    .ok_or(RuntimeError::IndexOutOfRange {
                        container: "tuple",
                        index,
                    })?;
                Ok(self.incref(item))
            }
            TypeTag::Str => {
                let index = self.sequence_index("string", key)?;
                let len = self.str_len(container)?;
                let ch = normalize_index(index, len)
                    .map(|i| self.str_char_at(container, i))
                    .transpose()?
                    .flatten()
                    .ok_or(RuntimeError::IndexOutOfRange {
                        container: "string",
                        index,
                    })?;
                self.alloc_str(ch.encode_utf8(&mut [0; 4]))
            }
            TypeTag::Dict => match self.dict_get(container, key)? {
                Some(value) => Ok(self.incref(value)),
                None => Err(self.key_error(key)),
            },
            _ => Err(RuntimeError::type_error(format!(
                "'{}' object is not subscriptable",
                self.type_name(container)
            ))),
        }
    }

    /// `container[key] = value`.
    pub fn set_item(&mut self, container: ObjRef, key: ObjRef, value: ObjRef) -> RtResult<()> {
        match container.tag() {
            TypeTag::List => {
                let index = self.sequence_index("list", key)?;
                self.list_set(container, index, value)
            }
            TypeTag::Dict => self.dict_set(container, key, value),
            _ => Err(RuntimeError::type_error(format!(
                "'{}' object does not support item assignment",
                self.type_name(container)
            ))),
        }
    }

    /// `del container[key]`.
    pub fn del_item(&mut self, container: ObjRef, key: ObjRef) -> RtResult<()> {
        match container.tag() {
            TypeTag::List => {
                let index = self.sequence_index("list", key)?;
                self.list_delete(container, index)
            }
            TypeTag::Dict => {
                if self.dict_del(container, key)? {
                    Ok(())
                } else {
                    Err(self.key_error(key))
                }
            }
            _ => Err(RuntimeError::type_error(format!(
                "'{}' object does not support item deletion",
                self.type_name(container)
            ))),
        }
    }

    fn key_error(&mut self, key: ObjRef) -> RuntimeError {
        RuntimeError::KeyNotFound {
            key: self.repr_text(key),
        }
    }
}
