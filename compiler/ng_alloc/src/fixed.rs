//! Capacity-bounded pool over one preallocated buffer.

use std::alloc::{self, Layout};
use std::ptr::{self, NonNull};

use crate::AllocError;

const LINK_SIZE: usize = std::mem::size_of::<*mut u8>();

/// A pool of `capacity` blocks of `block_size` bytes carved from one buffer.
///
/// Free blocks form a singly-linked list: the first pointer-width bytes of
/// each free block hold the address of the next one. Blocks are not padded,
/// so links are read and written unaligned.
pub struct FixedPool {
    buffer: NonNull<u8>,
    layout: Layout,
    block_size: usize,
    capacity: usize,
    free_head: *mut u8,
    available: usize,
}

impl FixedPool {
    /// Allocate the backing buffer and thread the free list through it.
    ///
    /// `block_size` is raised to pointer width if smaller.
    pub fn new(block_size: usize, capacity: usize) -> Result<Self, AllocError> {
        if capacity == 0 {
            return Err(AllocError::EmptyPool);
        }
        let block_size = block_size.max(LINK_SIZE);
        let size = block_size
            .checked_mul(capacity)
            .ok_or(AllocError::InvalidLayout {
                size: usize::MAX,
                align: LINK_SIZE,
            })?;
        let layout = Layout::from_size_align(size, LINK_SIZE)
            .map_err(|_| AllocError::InvalidLayout {
                size,
                align: LINK_SIZE,
            })?;

        // SAFETY: layout has non-zero size (capacity > 0, block_size >= 8).
        let raw = unsafe { alloc::alloc(layout) };
        let buffer = NonNull::new(raw).ok_or(AllocError::OutOfMemory { size })?;

        let base = buffer.as_ptr();
        for i in 0..capacity {
            // SAFETY: i < capacity, so both offsets stay inside the buffer.
            unsafe {
                let block = base.add(i * block_size);
                let next = if i + 1 < capacity {
                    base.add((i + 1) * block_size)
                } else {
                    ptr::null_mut()
                };
                block.cast::<*mut u8>().write_unaligned(next);
            }
        }

        Ok(FixedPool {
            buffer,
            layout,
            block_size,
            capacity,
            free_head: base,
            available: capacity,
        })
    }

    /// Pop a block off the free list, or `None` when every block is in use.
    #[inline]
    pub fn alloc(&mut self) -> Option<NonNull<u8>> {
        let block = NonNull::new(self.free_head)?;
        // SAFETY: blocks on the free list hold a link in their first bytes.
        self.free_head = unsafe { block.as_ptr().cast::<*mut u8>().read_unaligned() };
        self.available -= 1;
        Some(block)
    }

    /// Push `block` back onto the free list.
    ///
    /// # Safety
    ///
    /// `block` must have been returned by [`alloc`](Self::alloc) on this pool
    /// and not freed since.
    #[inline]
    pub unsafe fn free(&mut self, block: NonNull<u8>) {
        debug_assert!(self.owns(block), "block does not belong to this pool");
        block.as_ptr().cast::<*mut u8>().write_unaligned(self.free_head);
        self.free_head = block.as_ptr();
        self.available += 1;
    }

    /// Whether `block` is the start of one of this pool's blocks.
    pub fn owns(&self, block: NonNull<u8>) -> bool {
        let start = self.buffer.as_ptr() as usize;
        let addr = block.as_ptr() as usize;
        addr >= start
            && addr < start + self.layout.size()
            && (addr - start) % self.block_size == 0
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Blocks currently on the free list.
    pub fn available(&self) -> usize {
        self.available
    }
}

impl Drop for FixedPool {
    fn drop(&mut self) {
        // SAFETY: buffer was allocated in `new` with this exact layout.
        unsafe { alloc::dealloc(self.buffer.as_ptr(), self.layout) }
    }
}

impl std::fmt::Debug for FixedPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FixedPool")
            .field("block_size", &self.block_size)
            .field("capacity", &self.capacity)
            .field("available", &self.available)
            .finish_non_exhaustive()
    }
}
