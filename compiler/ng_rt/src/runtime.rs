//! The runtime context: allocator, symbols, well-known names, and the
//! refcount-driven object lifecycle.

use std::collections::hash_map::RandomState;
use std::hash::BuildHasher;
use std::mem::size_of;
use std::ptr::NonNull;

use ng_alloc::{Allocation, Origin, RouterStats, SizeClassRouter};

use crate::function::ListMethod;
use crate::interner::{SymbolId, SymbolTable};
use crate::names::Name;
use crate::object::{
    list_slice, tuple_slice, DictObj, HeapObject, InstanceObj, ListObj, ObjHeader, ObjRef,
    SetObj, TypeTag,
};
use crate::stack::ensure_sufficient_stack;
use crate::table::{Insert, RobinHoodTable};
use crate::{RtResult, RuntimeConfig, RuntimeError};

/// Per-tag allocation and destruction counters.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ObjectStats {
    allocated: [u64; TypeTag::COUNT],
    destroyed: [u64; TypeTag::COUNT],
}

impl ObjectStats {
    pub fn allocated(&self, tag: TypeTag) -> u64 {
        self.allocated[tag.index()]
    }

    pub fn destroyed(&self, tag: TypeTag) -> u64 {
        self.destroyed[tag.index()]
    }

    pub fn live(&self, tag: TypeTag) -> u64 {
        self.allocated(tag) - self.destroyed(tag)
    }

    /// Objects created and not yet destroyed, over all tags.
    pub fn live_objects(&self) -> u64 {
        self.allocated.iter().sum::<u64>() - self.destroyed.iter().sum::<u64>()
    }
}

/// One isolated object world.
///
/// Every allocation, symbol, and object operation goes through a `Runtime`.
/// Objects must not cross between runtimes.
pub struct Runtime {
    pub(crate) heap: SizeClassRouter,
    pub(crate) symbols: SymbolTable,
    pub(crate) config: RuntimeConfig,
    seed: u64,
    tag_symbols: [SymbolId; TypeTag::COUNT],
    bool_symbol: SymbolId,
    names: Vec<ObjRef>,
    name_symbols: Vec<SymbolId>,
    pub(crate) list_methods: Vec<ObjRef>,
    classes: RobinHoodTable<SymbolId, ObjRef>,
    stats: ObjectStats,
}

impl Runtime {
    /// A runtime with [`RuntimeConfig::default`].
    pub fn new() -> RtResult<Self> {
        Runtime::with_config(RuntimeConfig::default())
    }

    pub fn with_config(config: RuntimeConfig) -> RtResult<Self> {
        let heap = SizeClassRouter::new(&config.size_classes)?;
        let seed = config
            .hash_seed
            .unwrap_or_else(|| RandomState::new().hash_one(0x6e67_u64));

        let mut symbols = SymbolTable::new(seed);
        let mut tag_symbols = [SymbolId::from_raw(0); TypeTag::COUNT];
        for tag in TypeTag::ALL {
            tag_symbols[tag.index()] = symbols.intern(tag.name())?;
        }
        let bool_symbol = symbols.intern("bool")?;

        let mut rt = Runtime {
            heap,
            symbols,
            config,
            seed,
            tag_symbols,
            bool_symbol,
            names: Vec::with_capacity(Name::ALL.len()),
            name_symbols: Vec::with_capacity(Name::ALL.len()),
            list_methods: Vec::with_capacity(ListMethod::ALL.len()),
            classes: RobinHoodTable::new(),
            stats: ObjectStats::default(),
        };

        for name in Name::ALL {
            let symbol = rt.symbols.intern(name.text())?;
            let object = rt.alloc_str(name.text())?;
            rt.name_symbols.push(symbol);
            rt.names.push(object);
        }
        for method in ListMethod::ALL {
            let function = method.materialize(&mut rt)?;
            rt.list_methods.push(function);
        }

        tracing::debug!(
            seed = rt.seed,
            size_classes = rt.heap.class_count(),
            symbols = rt.symbols.len(),
            "runtime initialized"
        );
        Ok(rt)
    }

    #[inline]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub fn stats(&self) -> &ObjectStats {
        &self.stats
    }

    pub fn heap_stats(&self) -> RouterStats {
        self.heap.stats()
    }

    // ── Symbols ─────────────────────────────────────────────────────────

    /// Intern `name`.
    pub fn get_symbol_id(&mut self, name: &str) -> RtResult<SymbolId> {
        self.symbols.intern(name)
    }

    pub fn symbol_name(&self, id: SymbolId) -> Option<&str> {
        self.symbols.resolve(id)
    }

    /// Immortal string object for a well-known name (borrowed).
    #[inline]
    pub fn name(&self, name: Name) -> ObjRef {
        self.names[name.index()]
    }

    #[inline]
    pub fn name_symbol(&self, name: Name) -> SymbolId {
        self.name_symbols[name.index()]
    }

    #[inline]
    pub(crate) fn tag_symbol(&self, tag: TypeTag) -> SymbolId {
        self.tag_symbols[tag.index()]
    }

    #[inline]
    pub(crate) fn bool_symbol(&self) -> SymbolId {
        self.bool_symbol
    }

    // ── Raw allocation ──────────────────────────────────────────────────

    /// Allocate `size` bytes from the size-class router.
    pub fn alloc(&mut self, size: usize, zeroed: bool) -> RtResult<Allocation> {
        Ok(self.heap.alloc(size, zeroed)?)
    }

    /// Decode an origin handed out by [`alloc`](Self::alloc) through the C
    /// ABI. `None` when it names no pool of this runtime.
    pub fn decode_origin(&self, raw: i32) -> Option<Origin> {
        Origin::from_raw(raw).filter(|&origin| self.heap.knows_origin(origin))
    }

    /// Return a block from [`alloc`](Self::alloc).
    ///
    /// # Safety
    ///
    /// `ptr`/`origin` must be one allocation from this runtime, freed once.
    pub unsafe fn free(&mut self, ptr: NonNull<u8>, origin: Origin) {
        self.heap.free(ptr, origin);
    }

    /// Allocate an object of layout `T` plus `extra` trailing bytes and
    /// write the struct built by `init` from a fresh header.
    pub(crate) fn emplace<T: HeapObject>(
        &mut self,
        type_name: SymbolId,
        extra: usize,
        init: impl FnOnce(ObjHeader) -> T,
    ) -> RtResult<NonNull<T>> {
        let size = size_of::<T>()
            .checked_add(extra)
            .ok_or_else(|| RuntimeError::overflow("object size"))?;
        let Allocation { ptr, origin } = self.heap.alloc(size, false)?;
        let object = ptr.cast::<T>();
        // SAFETY: the block holds at least size_of::<T>() bytes, 8-aligned.
        unsafe { object.as_ptr().write(init(ObjHeader::new(T::TAG, type_name, origin))) };
        self.stats.allocated[T::TAG.index()] += 1;
        Ok(object)
    }

    /// Type-checked pointer to `obj`'s layout, or a TypeError naming `op`.
    pub(crate) fn expect<T: HeapObject>(
        &mut self,
        obj: ObjRef,
        op: &str,
    ) -> RtResult<NonNull<T>> {
        match obj.downcast::<T>() {
            Some(ptr) => Ok(ptr),
            None => Err(RuntimeError::type_error(format!(
                "{op}() expected '{}', got '{}'",
                T::TAG.name(),
                self.type_name(obj)
            ))),
        }
    }

    // ── Reference counting ──────────────────────────────────────────────

    /// Add a reference.
    #[inline]
    pub fn incref(&self, obj: ObjRef) -> ObjRef {
        // SAFETY: handles point to live objects.
        unsafe { (*obj.as_ptr()).refcount += 1 };
        obj
    }

    /// Release a reference. Returns the object if it is still alive, `None`
    /// if this was the last reference and the object was destroyed.
    #[inline]
    pub fn decref(&mut self, obj: ObjRef) -> Option<ObjRef> {
        // SAFETY: handles point to live objects.
        let remaining = unsafe {
            let header = obj.as_ptr();
            (*header).refcount -= 1;
            (*header).refcount
        };
        debug_assert!(remaining >= 0, "refcount underflow on {obj:?}");
        if remaining == 0 {
            self.destroy(obj);
            None
        } else {
            Some(obj)
        }
    }

    #[inline]
    pub fn decref_opt(&mut self, obj: Option<ObjRef>) {
        if let Some(obj) = obj {
            self.decref(obj);
        }
    }

    /// Release everything `obj` owns, then its block.
    fn destroy(&mut self, obj: ObjRef) {
        ensure_sufficient_stack(|| {
            let tag = obj.tag();
            let origin = obj.origin();
            // SAFETY: the refcount just reached zero, so this is the only
            // access to `obj`; each arm casts to the layout its tag names.
            unsafe {
                match tag {
                    TypeTag::Base
                    | TypeTag::Int
                    | TypeTag::Float
                    | TypeTag::Str
                    | TypeTag::Bytes
                    | TypeTag::Function => {}
                    TypeTag::Instance => {
                        let attrs = (*obj.as_ptr().cast::<InstanceObj>()).attrs.take();
                        self.decref_opt(attrs);
                    }
                    TypeTag::Tuple => {
                        for &item in tuple_slice(NonNull::new_unchecked(obj.as_ptr().cast())) {
                            self.decref(item);
                        }
                    }
                    TypeTag::List => {
                        let list = NonNull::new_unchecked(obj.as_ptr().cast::<ListObj>());
                        for &item in list_slice(list) {
                            self.decref(item);
                        }
                        let list = &mut *list.as_ptr();
                        self.heap.free(list.items.cast(), list.items_origin);
                        let attrs = list.attrs.take();
                        self.decref_opt(attrs);
                    }
                    TypeTag::Dict => {
                        let table = std::ptr::read(&(*obj.as_ptr().cast::<DictObj>()).table);
                        for (key, value) in table.into_entries() {
                            self.decref(key);
                            self.decref(value);
                        }
                    }
                    TypeTag::Set => {
                        let table = std::ptr::read(&(*obj.as_ptr().cast::<SetObj>()).table);
                        for (key, ()) in table.into_entries() {
                            self.decref(key);
                        }
                    }
                }
                self.stats.destroyed[tag.index()] += 1;
                self.heap.free(NonNull::new_unchecked(obj.as_ptr().cast()), origin);
            }
        });
    }

    // ── Classes ─────────────────────────────────────────────────────────

    /// Register `class` under `name`, replacing any previous class.
    pub fn register_class(&mut self, name: &str, class: ObjRef) -> RtResult<SymbolId> {
        let symbol = self.symbols.intern(name)?;
        self.incref(class);
        let replaced = self
            .classes
            .insert(symbol.table_hash(), symbol, class, |a, b| a == b);
        if let Insert::Replaced { old, .. } = replaced {
            self.decref(old);
        }
        Ok(symbol)
    }

    /// Class registered under `name` (borrowed).
    pub fn lookup_class(&self, name: SymbolId) -> Option<ObjRef> {
        self.classes.get(name.table_hash(), |k| *k == name).copied()
    }
}

impl Drop for Runtime {
    fn drop(&mut self) {
        let classes = std::mem::take(&mut self.classes);
        for (_, class) in classes.into_entries() {
            self.decref(class);
        }
        for method in std::mem::take(&mut self.list_methods) {
            self.decref(method);
        }
        for name in std::mem::take(&mut self.names) {
            self.decref(name);
        }
        tracing::debug!(
            leaked = self.stats.live_objects(),
            pages = self.heap.stats().pages,
            "runtime dropped"
        );
    }
}

impl std::fmt::Debug for Runtime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runtime")
            .field("heap", &self.heap)
            .field("symbols", &self.symbols.len())
            .field("live_objects", &self.stats.live_objects())
            .finish_non_exhaustive()
    }
}
