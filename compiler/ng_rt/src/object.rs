//! Object header, handles, and heap layouts.
//!
//! Every heap value starts with an [`ObjHeader`]:
//!
//! ```text
//!   +─────+──────+──────+────────+───────+─────+───────────+──────────+
//!   | tag | flag | kind | direct | class | pad | type_name | refcount |
//!   +─────+──────+──────+────────+───────+─────+───────────+──────────+
//!    u8    u8     u8     u8       u8      3     u32         i32
//! ```
//!
//! `flag` means "all ASCII" for strings and the truth value for bools.
//! `kind` is the code-unit width of a string. `direct`/`class` record the
//! allocation [`Origin`] so the block can be freed without knowing its size.
//!
//! The per-type structs below are `#[repr(C)]` with the header first, so a
//! header pointer can be cast to the struct its tag names. Strings, bytes,
//! and tuples store their elements directly after the struct.

use std::fmt;
use std::ptr::NonNull;

use ng_alloc::Origin;

use crate::function::Entry;
use crate::interner::SymbolId;
use crate::stack::ensure_sufficient_stack;
use crate::table::RobinHoodTable;

/// The closed set of heap object types.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TypeTag {
    Base = 0,
    Instance = 1,
    Int = 2,
    Float = 3,
    Bytes = 4,
    Str = 5,
    Tuple = 6,
    List = 7,
    Dict = 8,
    Set = 9,
    Function = 10,
}

impl TypeTag {
    pub const COUNT: usize = 11;

    pub const ALL: [TypeTag; TypeTag::COUNT] = [
        TypeTag::Base,
        TypeTag::Instance,
        TypeTag::Int,
        TypeTag::Float,
        TypeTag::Bytes,
        TypeTag::Str,
        TypeTag::Tuple,
        TypeTag::List,
        TypeTag::Dict,
        TypeTag::Set,
        TypeTag::Function,
    ];

    /// Language-level type name.
    pub const fn name(self) -> &'static str {
        match self {
            TypeTag::Base => "object",
            TypeTag::Instance => "instance",
            TypeTag::Int => "int",
            TypeTag::Float => "float",
            TypeTag::Bytes => "bytes",
            TypeTag::Str => "str",
            TypeTag::Tuple => "tuple",
            TypeTag::List => "list",
            TypeTag::Dict => "dict",
            TypeTag::Set => "set",
            TypeTag::Function => "function",
        }
    }

    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }
}

/// Shared prefix of every heap object.
#[repr(C)]
#[derive(Debug)]
pub struct ObjHeader {
    pub(crate) tag: TypeTag,
    pub(crate) flag: bool,
    pub(crate) kind: u8,
    direct: bool,
    class: u8,
    pub(crate) type_name: SymbolId,
    pub(crate) refcount: i32,
}

impl ObjHeader {
    pub(crate) fn new(tag: TypeTag, type_name: SymbolId, origin: Origin) -> Self {
        let (direct, class) = match origin {
            Origin::Pool(class) => (false, class),
            Origin::Direct => (true, 0),
        };
        ObjHeader {
            tag,
            flag: false,
            kind: 0,
            direct,
            class,
            type_name,
            refcount: 1,
        }
    }

    #[inline]
    pub(crate) fn origin(&self) -> Origin {
        if self.direct {
            Origin::Direct
        } else {
            Origin::Pool(self.class)
        }
    }
}

/// Handle to a live heap object.
///
/// A handle is valid while the object's refcount is positive. Every method
/// that reads through it relies on that; handing a handle to the runtime
/// after its last reference was released is undefined behavior, exactly as
/// for generated code.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct ObjRef(NonNull<ObjHeader>);

impl ObjRef {
    /// Wrap a raw header pointer; null yields `None`.
    ///
    /// # Safety
    ///
    /// A non-null `ptr` must point to a live object created by this runtime.
    #[inline]
    pub unsafe fn from_raw(ptr: *mut ObjHeader) -> Option<Self> {
        NonNull::new(ptr).map(ObjRef)
    }

    #[inline]
    pub(crate) fn from_object<T: HeapObject>(ptr: NonNull<T>) -> Self {
        ObjRef(ptr.cast())
    }

    #[inline]
    pub fn as_ptr(self) -> *mut ObjHeader {
        self.0.as_ptr()
    }

    #[inline]
    pub fn addr(self) -> usize {
        self.0.as_ptr() as usize
    }

    #[inline]
    pub(crate) fn header(&self) -> &ObjHeader {
        // SAFETY: handles point to live objects (type invariant).
        unsafe { self.0.as_ref() }
    }

    #[inline]
    pub fn tag(self) -> TypeTag {
        self.header().tag
    }

    #[inline]
    pub fn refcount(self) -> i32 {
        self.header().refcount
    }

    #[inline]
    pub fn type_name_symbol(self) -> SymbolId {
        self.header().type_name
    }

    #[inline]
    pub fn origin(self) -> Origin {
        self.header().origin()
    }

    #[inline]
    pub(crate) fn flag(self) -> bool {
        self.header().flag
    }

    /// Typed pointer if the tag matches `T`.
    #[inline]
    pub(crate) fn downcast<T: HeapObject>(self) -> Option<NonNull<T>> {
        (self.tag() == T::TAG).then(|| self.0.cast())
    }
}

impl fmt::Debug for ObjRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjRef({} @ {:#x})", self.tag().name(), self.addr())
    }
}

// ── Layouts ─────────────────────────────────────────────────────────────

/// A `#[repr(C)]` struct beginning with an [`ObjHeader`].
///
/// # Safety
///
/// Implementors must be `#[repr(C)]`, have `ObjHeader` as their first field,
/// and be the only layout used for objects tagged `TAG`.
pub(crate) unsafe trait HeapObject {
    const TAG: TypeTag;
}

macro_rules! heap_object {
    ($($ty:ident => $tag:ident),* $(,)?) => {
        $(
            // SAFETY: each listed struct is repr(C) with the header first.
            unsafe impl HeapObject for $ty {
                const TAG: TypeTag = TypeTag::$tag;
            }
        )*
    };
}

heap_object! {
    BaseObj => Base,
    InstanceObj => Instance,
    IntObj => Int,
    FloatObj => Float,
    BytesObj => Bytes,
    StrObj => Str,
    TupleObj => Tuple,
    ListObj => List,
    DictObj => Dict,
    SetObj => Set,
    FunctionObj => Function,
}

#[repr(C)]
pub(crate) struct BaseObj {
    pub header: ObjHeader,
}

#[repr(C)]
pub(crate) struct InstanceObj {
    pub header: ObjHeader,
    /// Attribute dict, created on first `set_member`.
    pub attrs: Option<ObjRef>,
}

/// Ints and bools. A bool has the `bool` type name and its value in `flag`.
#[repr(C)]
pub(crate) struct IntObj {
    pub header: ObjHeader,
    pub value: i64,
}

#[repr(C)]
pub(crate) struct FloatObj {
    pub header: ObjHeader,
    pub value: f64,
}

/// Followed by `len` bytes.
#[repr(C)]
pub(crate) struct BytesObj {
    pub header: ObjHeader,
    pub hash: i64,
    pub len: usize,
}

/// Followed by `len` code units of width `1 << header.kind`; Latin-1
/// strings carry one extra NUL.
#[repr(C)]
pub(crate) struct StrObj {
    pub header: ObjHeader,
    pub hash: i64,
    pub len: usize,
}

/// Followed by `len` handles.
#[repr(C)]
pub(crate) struct TupleObj {
    pub header: ObjHeader,
    pub len: usize,
}

#[repr(C)]
pub(crate) struct ListObj {
    pub header: ObjHeader,
    pub attrs: Option<ObjRef>,
    pub len: usize,
    pub cap: usize,
    pub items: NonNull<ObjRef>,
    pub items_origin: Origin,
}

#[repr(C)]
pub(crate) struct DictObj {
    pub header: ObjHeader,
    pub table: RobinHoodTable<ObjRef, ObjRef>,
}

#[repr(C)]
pub(crate) struct SetObj {
    pub header: ObjHeader,
    pub table: RobinHoodTable<ObjRef, ()>,
}

#[repr(C)]
pub(crate) struct FunctionObj {
    pub header: ObjHeader,
    pub name: SymbolId,
    pub line: u32,
    pub arity: u32,
    pub entry: Entry,
}

/// First byte after `T`, where trailing elements start.
///
/// # Safety
///
/// `obj` must point to an allocation extending past `size_of::<T>()`.
#[inline]
pub(crate) unsafe fn trailing<T, U>(obj: NonNull<T>) -> *mut U {
    obj.as_ptr().add(1).cast()
}

/// # Safety
///
/// `tuple` must point to a live tuple.
#[inline]
pub(crate) unsafe fn tuple_slice<'a>(tuple: NonNull<TupleObj>) -> &'a [ObjRef] {
    std::slice::from_raw_parts(trailing::<_, ObjRef>(tuple), (*tuple.as_ptr()).len)
}

/// # Safety
///
/// `list` must point to a live list.
#[inline]
pub(crate) unsafe fn list_slice<'a>(list: NonNull<ListObj>) -> &'a [ObjRef] {
    let list = &*list.as_ptr();
    std::slice::from_raw_parts(list.items.as_ptr(), list.len)
}

/// # Safety
///
/// `bytes` must point to a live bytes object.
#[inline]
pub(crate) unsafe fn bytes_slice<'a>(bytes: NonNull<BytesObj>) -> &'a [u8] {
    std::slice::from_raw_parts(trailing::<_, u8>(bytes), (*bytes.as_ptr()).len)
}

/// Raw code units of a string, `len << kind` bytes.
///
/// # Safety
///
/// `s` must point to a live string.
#[inline]
pub(crate) unsafe fn str_units<'a>(s: NonNull<StrObj>) -> &'a [u8] {
    let obj = &*s.as_ptr();
    std::slice::from_raw_parts(trailing::<_, u8>(s), obj.len << obj.header.kind)
}

// ── Key equality ────────────────────────────────────────────────────────

/// Equality used by dict and set keys.
///
/// Tags must match. Numbers compare by value, strings and bytes by hash and
/// then content, tuples element-wise; everything else by identity.
pub fn keys_equal(a: ObjRef, b: ObjRef) -> bool {
    if a == b {
        return true;
    }
    if a.tag() != b.tag() {
        return false;
    }
    // SAFETY: both tags were checked, so each cast matches the layout.
    unsafe {
        match a.tag() {
            TypeTag::Int => {
                (*a.0.cast::<IntObj>().as_ptr()).value == (*b.0.cast::<IntObj>().as_ptr()).value
            }
            TypeTag::Float => {
                (*a.0.cast::<FloatObj>().as_ptr()).value
                    == (*b.0.cast::<FloatObj>().as_ptr()).value
            }
            TypeTag::Str => {
                let (x, y) = (a.0.cast::<StrObj>(), b.0.cast::<StrObj>());
                (*x.as_ptr()).hash == (*y.as_ptr()).hash
                    && a.header().kind == b.header().kind
                    && str_units(x) == str_units(y)
            }
            TypeTag::Bytes => {
                let (x, y) = (a.0.cast::<BytesObj>(), b.0.cast::<BytesObj>());
                (*x.as_ptr()).hash == (*y.as_ptr()).hash && bytes_slice(x) == bytes_slice(y)
            }
            TypeTag::Tuple => {
                let (x, y) = (tuple_slice(a.0.cast()), tuple_slice(b.0.cast()));
                x.len() == y.len()
                    && ensure_sufficient_stack(|| {
                        x.iter().zip(y).all(|(p, q)| keys_equal(*p, *q))
                    })
            }
            TypeTag::Base
            | TypeTag::Instance
            | TypeTag::List
            | TypeTag::Dict
            | TypeTag::Set
            | TypeTag::Function => false,
        }
    }
}
