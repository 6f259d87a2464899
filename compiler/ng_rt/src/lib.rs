//! Nagini Runtime Library (`libng_rt`)
//!
//! Object runtime for compiled Nagini programs: pooled allocation,
//! reference-counted objects, interned symbols, and the builtin types.
//!
//! # Build Modes
//!
//! - **rlib**: For Rust consumers and tests
//! - **staticlib**: For linking generated code (`libng_rt.a`)
//!
//! # Layers
//!
//! - **Allocation**: every object comes from the [`ng_alloc`] size-class
//!   router and records its [`Origin`](ng_alloc::Origin) in its header.
//! - **Objects**: [`ObjHeader`] with a type tag, type-name symbol, and
//!   refcount. The object is destroyed, and everything it owns released,
//!   when the count reaches zero.
//! - **Tables**: one Robin-Hood hash table ([`RobinHoodTable`]) backs the
//!   symbol interner, dicts, sets, and the class registry.
//! - **Types**: int, bool, float, str, bytes, tuple, list, dict, set,
//!   function, instance, and plain objects.
//! - **Operations**: arithmetic, comparison, subscripts, conversions, calls.
//! - **C ABI**: `ng_*` entry points in [`abi`] for generated code.
//!
//! # Errors
//!
//! The Rust API returns [`RtResult`]. The C entry points are fail-fast:
//! any error prints its diagnostic and exits the process (see [`fail`]).
//!
//! # Safety
//!
//! [`ObjRef`] is a raw handle. It stays valid while the object's refcount
//! is positive; using it afterwards is undefined behavior. Reference cycles
//! are never collected.

pub mod abi;
mod config;
mod dict;
mod error;
pub mod fail;
mod function;
mod hash;
mod instance;
mod interner;
mod list;
mod names;
mod object;
mod ops;
mod runtime;
mod scalar;
mod stack;
mod string;
mod table;
mod tuple;

use std::sync::Once;

pub use config::{RuntimeConfig, HASH_SEED_ENV};
pub use error::{RtResult, RuntimeError};
pub use function::{Entry, ExternFn, NativeFn};
pub use hash::{content_hash, float_hash, identity_hash, int_hash, splitmix64};
pub use interner::{SymbolId, SymbolTable};
pub use list::MIN_CAPACITY as LIST_MIN_CAPACITY;
pub use names::Name;
pub use object::{keys_equal, ObjHeader, ObjRef, TypeTag};
pub use runtime::{ObjectStats, Runtime};
pub use stack::ensure_sufficient_stack;
pub use string::StrKind;
pub use table::{Insert, RobinHoodTable, INITIAL_CAPACITY, LOAD_FACTOR_PERCENT};

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for runtime diagnostics.
///
/// Does nothing unless `RUST_LOG` is set. Safe to call more than once.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        if std::env::var("RUST_LOG").is_ok() {
            let filter = EnvFilter::from_default_env();
            tracing_subscriber::registry()
                .with(fmt::layer().with_target(true).with_level(true))
                .with(filter)
                .init();
        }
    });
}

/// Runtime with a fixed hash seed, for reproducible tests.
#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "test helper")]
pub(crate) fn test_runtime() -> Runtime {
    Runtime::with_config(RuntimeConfig::default().with_hash_seed(0x5eed)).unwrap()
}
