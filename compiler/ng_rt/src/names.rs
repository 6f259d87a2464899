//! Names the runtime interns at startup.
//!
//! Each name exists both as a [`SymbolId`](crate::SymbolId) and as an
//! immortal string object, so member lookups by well-known name need neither
//! hashing nor allocation.

macro_rules! well_known_names {
    ($($variant:ident => $text:literal),* $(,)?) => {
        /// A pre-interned name.
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
        pub enum Name {
            $($variant,)*
        }

        impl Name {
            pub const ALL: &'static [Name] = &[$(Name::$variant,)*];

            pub const fn text(self) -> &'static str {
                match self {
                    $(Name::$variant => $text,)*
                }
            }
        }
    };
}

well_known_names! {
    None => "None",
    TypeName => "__typename__",
    Class => "__class__",
    Dict => "__dict__",
    Init => "__init__",
    Str => "__str__",
    Repr => "__repr__",
    Hash => "__hash__",
    Len => "__len__",
    Int => "__int__",
    Float => "__float__",
    Call => "__call__",
    Eq => "__eq__",
    Append => "append",
    Pop => "pop",
    Remove => "remove",
    Index => "index",
    Extend => "extend",
    Clear => "clear",
}

impl Name {
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }
}
