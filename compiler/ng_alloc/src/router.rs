//! Size-class routing over a table of growable pools.

use std::alloc::{self, Layout};
use std::mem::size_of;
use std::ptr::NonNull;

use crate::{AllocError, GrowablePool, SizeClass, BLOCK_ALIGN};

/// Where a block came from, recorded by the caller so `free` needs no size.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Origin {
    /// Index into the router's class table.
    Pool(u8),
    /// Straight from the system allocator.
    Direct,
}

impl Origin {
    /// Encode for C callers: the class index, or `-1` for direct.
    pub fn to_raw(self) -> i32 {
        match self {
            Origin::Pool(class) => i32::from(class),
            Origin::Direct => -1,
        }
    }

    /// Inverse of [`to_raw`](Self::to_raw).
    pub fn from_raw(raw: i32) -> Option<Self> {
        match raw {
            -1 => Some(Origin::Direct),
            _ => u8::try_from(raw).ok().map(Origin::Pool),
        }
    }
}

/// A block together with its origin.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Allocation {
    pub ptr: NonNull<u8>,
    pub origin: Origin,
}

/// Snapshot of router occupancy.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RouterStats {
    pub pages: usize,
    pub pooled_blocks: usize,
    pub direct_blocks: usize,
}

/// Direct allocations carry their total size in front of the payload.
const DIRECT_HEADER_SIZE: usize = size_of::<usize>();

/// Routes each request to the smallest size class that fits it.
pub struct SizeClassRouter {
    classes: Vec<GrowablePool>,
    direct_blocks: usize,
}

impl SizeClassRouter {
    /// Build one growable pool per class.
    ///
    /// The table must be non-empty, strictly ascending by block size, have no
    /// zero-sized pages, and hold at most 255 classes.
    pub fn new(table: &[SizeClass]) -> Result<Self, AllocError> {
        if table.is_empty() {
            return Err(AllocError::InvalidSizeClasses {
                reason: "table is empty",
            });
        }
        if table.len() > usize::from(u8::MAX) {
            return Err(AllocError::InvalidSizeClasses {
                reason: "more than 255 classes",
            });
        }
        if table.windows(2).any(|w| w[0].block_size >= w[1].block_size) {
            return Err(AllocError::InvalidSizeClasses {
                reason: "block sizes must be strictly ascending",
            });
        }

        let classes = table
            .iter()
            .map(|class| GrowablePool::new(class.block_size, class.blocks_per_page))
            .collect::<Result<Vec<_>, _>>()?;

        tracing::debug!(
            classes = classes.len(),
            largest = table[table.len() - 1].block_size,
            "built size-class router"
        );
        Ok(SizeClassRouter {
            classes,
            direct_blocks: 0,
        })
    }

    /// Index of the first class whose blocks hold `size` bytes.
    pub fn class_for(&self, size: usize) -> Option<usize> {
        let index = self.classes.partition_point(|pool| pool.block_size() < size);
        (index < self.classes.len()).then_some(index)
    }

    /// Allocate `size` bytes, optionally zeroed.
    pub fn alloc(&mut self, size: usize, zeroed: bool) -> Result<Allocation, AllocError> {
        let allocation = match self.class_for(size) {
            Some(index) => Allocation {
                ptr: self.classes[index].alloc()?,
                origin: Origin::Pool(index as u8),
            },
            None => Allocation {
                ptr: self.alloc_direct(size)?,
                origin: Origin::Direct,
            },
        };
        if zeroed {
            // SAFETY: the block holds at least `size` bytes.
            unsafe { allocation.ptr.as_ptr().write_bytes(0, size) };
        }
        Ok(allocation)
    }

    /// Return a block to wherever `origin` says it came from.
    ///
    /// # Safety
    ///
    /// `ptr` and `origin` must come from one [`alloc`](Self::alloc) call on
    /// this router, and the block must not have been freed since.
    pub unsafe fn free(&mut self, ptr: NonNull<u8>, origin: Origin) {
        match origin {
            Origin::Pool(index) => self.classes[usize::from(index)].free(ptr),
            Origin::Direct => self.free_direct(ptr),
        }
    }

    fn alloc_direct(&mut self, size: usize) -> Result<NonNull<u8>, AllocError> {
        let total = size
            .checked_add(DIRECT_HEADER_SIZE)
            .ok_or(AllocError::InvalidLayout {
                size,
                align: BLOCK_ALIGN,
            })?;
        let layout = Layout::from_size_align(total, BLOCK_ALIGN).map_err(|_| {
            AllocError::InvalidLayout {
                size: total,
                align: BLOCK_ALIGN,
            }
        })?;

        // SAFETY: total > 0 because it includes the header.
        let raw = unsafe { alloc::alloc(layout) };
        let base = NonNull::new(raw).ok_or(AllocError::OutOfMemory { size: total })?;
        // SAFETY: the header fits at the front of the block and is aligned.
        unsafe { base.as_ptr().cast::<usize>().write(total) };
        self.direct_blocks += 1;
        tracing::trace!(size, "direct allocation");

        // SAFETY: the payload starts right after the header, inside the block.
        Ok(unsafe { NonNull::new_unchecked(base.as_ptr().add(DIRECT_HEADER_SIZE)) })
    }

    /// # Safety
    ///
    /// `ptr` must come from `alloc_direct` and not have been freed since.
    unsafe fn free_direct(&mut self, ptr: NonNull<u8>) {
        let base = ptr.as_ptr().sub(DIRECT_HEADER_SIZE);
        let total = base.cast::<usize>().read();
        alloc::dealloc(base, Layout::from_size_align_unchecked(total, BLOCK_ALIGN));
        self.direct_blocks -= 1;
    }

    /// The pool serving class `index`.
    pub fn class(&self, index: usize) -> Option<&GrowablePool> {
        self.classes.get(index)
    }

    pub fn class_count(&self) -> usize {
        self.classes.len()
    }

    /// Whether `origin` names a class of this router (or direct memory).
    pub fn knows_origin(&self, origin: Origin) -> bool {
        match origin {
            Origin::Pool(index) => usize::from(index) < self.classes.len(),
            Origin::Direct => true,
        }
    }

    pub fn stats(&self) -> RouterStats {
        RouterStats {
            pages: self.classes.iter().map(GrowablePool::page_count).sum(),
            pooled_blocks: self.classes.iter().map(GrowablePool::live_blocks).sum(),
            direct_blocks: self.direct_blocks,
        }
    }
}

impl std::fmt::Debug for SizeClassRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SizeClassRouter")
            .field("classes", &self.classes.len())
            .field("stats", &self.stats())
            .finish()
    }
}
