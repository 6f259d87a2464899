//! User objects, attributes, and dunder hooks.
//!
//! Instances and lists carry an optional attribute dict, created by the
//! first `set_member`. Lists additionally expose their builtin methods as
//! members. Any other type has no attributes.
//!
//! An instance's type name comes from `__class__.__typename__` when both
//! are present, so generated classes can name their instances.

use std::ptr::NonNull;

use smallvec::SmallVec;

use crate::function::ListMethod;
use crate::names::Name;
use crate::object::{keys_equal, BaseObj, InstanceObj, ListObj, ObjRef, StrObj, TypeTag};
use crate::string::str_text;
use crate::{RtResult, Runtime, RuntimeError};

impl Runtime {
    /// A plain object whose type name is `type_name`.
    pub fn alloc_object(&mut self, type_name: &str) -> RtResult<ObjRef> {
        let symbol = self.symbols.intern(type_name)?;
        let ptr = self.emplace(symbol, 0, |header| BaseObj { header })?;
        Ok(ObjRef::from_object(ptr))
    }

    /// An instance with no attributes yet.
    pub fn alloc_instance(&mut self) -> RtResult<ObjRef> {
        let symbol = self.tag_symbol(TypeTag::Instance);
        let ptr = self.emplace(symbol, 0, |header| InstanceObj {
            header,
            attrs: None,
        })?;
        Ok(ObjRef::from_object(ptr))
    }

    /// An instance whose `__class__` is `class`.
    pub fn alloc_instance_of(&mut self, class: ObjRef) -> RtResult<ObjRef> {
        let instance = self.alloc_instance()?;
        if let Err(err) = self.set_member(instance, self.name(Name::Class), class) {
            self.decref(instance);
            return Err(err);
        }
        Ok(instance)
    }

    /// Slot holding `obj`'s attribute dict, if its type has one.
    fn attrs_slot(obj: ObjRef) -> Option<NonNull<Option<ObjRef>>> {
        // SAFETY: the tag selects the layout; both fields are live for as
        // long as the object.
        unsafe {
            match obj.tag() {
                TypeTag::Instance => {
                    let ptr = obj.as_ptr().cast::<InstanceObj>();
                    Some(NonNull::from(&mut (*ptr).attrs))
                }
                TypeTag::List => {
                    let ptr = obj.as_ptr().cast::<ListObj>();
                    Some(NonNull::from(&mut (*ptr).attrs))
                }
                _ => None,
            }
        }
    }

    fn no_attribute(&mut self, obj: ObjRef, name: ObjRef) -> RuntimeError {
        let member = self.display_text(name);
        RuntimeError::NoAttribute {
            type_name: self.type_name(obj),
            member,
        }
    }

    /// Borrowed attribute lookup. Fails only when `name` cannot be hashed.
    fn lookup_member(&mut self, obj: ObjRef, name: ObjRef) -> RtResult<Option<ObjRef>> {
        if obj.tag() == TypeTag::List {
            let position = ListMethod::ALL
                .iter()
                .position(|method| keys_equal(self.name(method.name()), name));
            if let Some(position) = position {
                return Ok(Some(self.list_methods[position]));
            }
        }
        let Some(slot) = Self::attrs_slot(obj) else {
            return Ok(None);
        };
        // SAFETY: the slot belongs to `obj`, which is live.
        match unsafe { *slot.as_ptr() } {
            Some(attrs) => self.dict_get(attrs, name),
            None => Ok(None),
        }
    }

    /// Attribute `name` of `obj` as a new reference, `None` when unset.
    pub fn get_member(&mut self, obj: ObjRef, name: ObjRef) -> RtResult<Option<ObjRef>> {
        if Self::attrs_slot(obj).is_none() {
            return Err(self.no_attribute(obj, name));
        }
        let member = self.lookup_member(obj, name)?;
        Ok(member.map(|member| self.incref(member)))
    }

    /// Set attribute `name`, creating the attribute dict on first use.
    pub fn set_member(&mut self, obj: ObjRef, name: ObjRef, value: ObjRef) -> RtResult<()> {
        let Some(slot) = Self::attrs_slot(obj) else {
            return Err(self.no_attribute(obj, name));
        };
        // SAFETY: the slot belongs to `obj`, which is live.
        let attrs = match unsafe { *slot.as_ptr() } {
            Some(attrs) => attrs,
            None => {
                let attrs = self.alloc_dict()?;
                // SAFETY: as above.
                unsafe { *slot.as_ptr() = Some(attrs) };
                attrs
            }
        };
        self.dict_set(attrs, name, value)
    }

    /// Remove attribute `name`. Returns whether it was set.
    pub fn del_member(&mut self, obj: ObjRef, name: ObjRef) -> RtResult<bool> {
        let Some(slot) = Self::attrs_slot(obj) else {
            return Err(self.no_attribute(obj, name));
        };
        // SAFETY: the slot belongs to `obj`, which is live.
        match unsafe { *slot.as_ptr() } {
            Some(attrs) => self.dict_del(attrs, name),
            None => Ok(false),
        }
    }

    /// Language-level type name of `obj`.
    pub fn type_name(&mut self, obj: ObjRef) -> String {
        if obj.tag() == TypeTag::Instance {
            if let Ok(Some(name)) = self.class_type_name(obj) {
                return name;
            }
        }
        self.symbols
            .resolve(obj.type_name_symbol())
            .unwrap_or(obj.tag().name())
            .to_owned()
    }

    fn class_type_name(&mut self, obj: ObjRef) -> RtResult<Option<String>> {
        let Some(class) = self.lookup_member(obj, self.name(Name::Class))? else {
            return Ok(None);
        };
        let type_name = match class.tag() {
            TypeTag::Instance | TypeTag::List => {
                self.lookup_member(class, self.name(Name::TypeName))?
            }
            _ => None,
        };
        let Some(text) = type_name.and_then(ObjRef::downcast::<StrObj>) else {
            return Ok(None);
        };
        // SAFETY: downcast checked the tag.
        Ok(Some(unsafe { str_text(text) }.into_owned()))
    }

    /// Call the instance method `name` as `name(obj, *extra)`.
    ///
    /// `Ok(None)` when `obj` is not an instance or has no such member.
    pub(crate) fn call_hook(
        &mut self,
        obj: ObjRef,
        name: Name,
        extra: &[ObjRef],
    ) -> RtResult<Option<ObjRef>> {
        if obj.tag() != TypeTag::Instance {
            return Ok(None);
        }
        let Some(method) = self.lookup_member(obj, self.name(name))? else {
            return Ok(None);
        };
        let mut args: SmallVec<[ObjRef; 8]> = SmallVec::with_capacity(extra.len() + 1);
        args.push(obj);
        args.extend_from_slice(extra);
        self.incref(method);
        let result = self.call_with(method, &args);
        self.decref(method);
        match result? {
            Some(value) => Ok(Some(value)),
            None => Err(RuntimeError::type_error(format!(
                "{}() returned no value",
                name.text()
            ))),
        }
    }
}
