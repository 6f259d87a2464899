//! Pool allocators backing the Nagini object runtime.
//!
//! Three layers, leaves first:
//!
//! - [`FixedPool`]: one preallocated buffer, capacity-bounded. Exhaustion is
//!   reported as `None`, never retried.
//! - [`GrowablePool`]: pages of `blocks_per_page` equal blocks. Pages move
//!   between a partial list and a full list; a page whose last block is freed
//!   goes straight back to the system allocator.
//! - [`SizeClassRouter`]: an ordered table of growable pools. A request goes
//!   to the first class large enough, or to the system allocator directly.
//!   The returned [`Origin`] tells `free` where the block came from.
//!
//! # Safety
//!
//! All three pools hand out raw blocks. Allocation is safe; returning a block
//! is `unsafe` because the pool cannot verify that the pointer came from it
//! or that it is not freed twice. The object runtime upholds this by freeing
//! each object exactly once, when its refcount reaches zero.
//!
//! None of the pools are `Send` or `Sync`. A runtime instance is owned by one
//! thread of execution.

#![allow(
    clippy::cast_possible_truncation,
    reason = "size-class indices are validated to fit in u8 at construction"
)]

mod error;
mod fixed;
mod growable;
mod router;
mod size_class;

pub use error::AllocError;
pub use fixed::FixedPool;
pub use growable::GrowablePool;
pub use router::{Allocation, Origin, RouterStats, SizeClassRouter};
pub use size_class::{SizeClass, DEFAULT_SIZE_CLASSES};

/// Alignment of every block handed out by the growable pools and the router.
pub const BLOCK_ALIGN: usize = 8;

/// Round `size` up to the next multiple of [`BLOCK_ALIGN`].
#[inline]
pub(crate) const fn align_up(size: usize) -> usize {
    (size + BLOCK_ALIGN - 1) & !(BLOCK_ALIGN - 1)
}
