//! Allocation errors.

use thiserror::Error;

/// Failure to obtain memory from a pool or from the system allocator.
///
/// Fixed pool exhaustion is not an error: [`FixedPool::alloc`](crate::FixedPool::alloc)
/// returns `None` for it.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum AllocError {
    /// The system allocator returned null.
    #[error("out of memory allocating {size} bytes")]
    OutOfMemory { size: usize },

    /// Size/alignment pair rejected by `Layout` (overflow past `isize::MAX`).
    #[error("invalid layout: {size} bytes aligned to {align}")]
    InvalidLayout { size: usize, align: usize },

    /// A size-class table that cannot drive a router.
    #[error("invalid size-class table: {reason}")]
    InvalidSizeClasses { reason: &'static str },

    /// A pool asked to hold zero blocks.
    #[error("pool capacity must be non-zero")]
    EmptyPool,
}
