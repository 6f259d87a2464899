//! Page-based pool that grows on demand and returns empty pages.
//!
//! Page layout:
//!
//! ```text
//!   +────────────+──────────────────────+──────────────────────+───
//!   | PageHeader | page* | payload ...  | page* | payload ...  | ...
//!   +────────────+──────────────────────+──────────────────────+───
//!                ^       ^
//!                block   pointer handed out by `alloc`
//! ```
//!
//! Every block starts with a hidden back-pointer to its page, so `free` finds
//! the page in O(1). While a block is free, the first word of its payload
//! links to the next free block of the same page.

use std::alloc::{self, Layout};
use std::mem::size_of;
use std::ptr::{self, NonNull};

use crate::{align_up, AllocError, BLOCK_ALIGN};

#[repr(C)]
struct PageHeader {
    next: Option<NonNull<PageHeader>>,
    prev: Option<NonNull<PageHeader>>,
    used: usize,
    /// Start of the first free block (its hidden header, not its payload).
    free_head: *mut u8,
}

const PAGE_HEADER_SIZE: usize = align_up(size_of::<PageHeader>());
const BLOCK_HEADER_SIZE: usize = size_of::<NonNull<PageHeader>>();

/// A pool of equal-size blocks allocated from the system one page at a time.
///
/// Pages with at least one free block sit on the partial list; pages without
/// one sit on the full list. Allocation always takes from the head of the
/// partial list.
pub struct GrowablePool {
    block_size: usize,
    stride: usize,
    blocks_per_page: usize,
    page_layout: Layout,
    partial: Option<NonNull<PageHeader>>,
    full: Option<NonNull<PageHeader>>,
    pages: usize,
    live: usize,
}

impl GrowablePool {
    /// Create an empty pool. No page is mapped until the first `alloc`.
    pub fn new(block_size: usize, blocks_per_page: usize) -> Result<Self, AllocError> {
        if blocks_per_page == 0 {
            return Err(AllocError::EmptyPool);
        }
        let stride = BLOCK_HEADER_SIZE + align_up(block_size.max(size_of::<*mut u8>()));
        let size = stride
            .checked_mul(blocks_per_page)
            .and_then(|blocks| blocks.checked_add(PAGE_HEADER_SIZE))
            .ok_or(AllocError::InvalidLayout {
                size: usize::MAX,
                align: BLOCK_ALIGN,
            })?;
        let page_layout = Layout::from_size_align(size, BLOCK_ALIGN).map_err(|_| {
            AllocError::InvalidLayout {
                size,
                align: BLOCK_ALIGN,
            }
        })?;

        Ok(GrowablePool {
            block_size,
            stride,
            blocks_per_page,
            page_layout,
            partial: None,
            full: None,
            pages: 0,
            live: 0,
        })
    }

    /// Hand out one block of at least `block_size` bytes, aligned to 8.
    pub fn alloc(&mut self) -> Result<NonNull<u8>, AllocError> {
        let page = match self.partial {
            Some(page) => page,
            None => self.expand()?,
        };

        // SAFETY: pages on the partial list are live and have a free block;
        // every free block carries a link in the first word of its payload.
        unsafe {
            let header = page.as_ptr();
            let block = (*header).free_head;
            debug_assert!(!block.is_null(), "partial page without a free block");
            let payload = block.add(BLOCK_HEADER_SIZE);
            (*header).free_head = payload.cast::<*mut u8>().read();
            (*header).used += 1;

            if (*header).free_head.is_null() {
                unlink(&mut self.partial, page);
                push(&mut self.full, page);
            }

            self.live += 1;
            Ok(NonNull::new_unchecked(payload))
        }
    }

    /// Return a block to its page, releasing the page if it becomes empty.
    ///
    /// # Safety
    ///
    /// `ptr` must have been returned by [`alloc`](Self::alloc) on this pool
    /// and not freed since.
    pub unsafe fn free(&mut self, ptr: NonNull<u8>) {
        let block = ptr.as_ptr().sub(BLOCK_HEADER_SIZE);
        let page = block.cast::<NonNull<PageHeader>>().read();
        let header = page.as_ptr();

        if (*header).free_head.is_null() {
            unlink(&mut self.full, page);
            push(&mut self.partial, page);
        }

        ptr.as_ptr().cast::<*mut u8>().write((*header).free_head);
        (*header).free_head = block;
        (*header).used -= 1;
        self.live -= 1;

        if (*header).used == 0 {
            unlink(&mut self.partial, page);
            self.release(page);
        }
    }

    /// Map a fresh page, thread its free list, and push it onto the partial
    /// list.
    fn expand(&mut self) -> Result<NonNull<PageHeader>, AllocError> {
        // SAFETY: page_layout has non-zero size (validated in `new`).
        let raw = unsafe { alloc::alloc(self.page_layout) };
        let Some(base) = NonNull::new(raw) else {
            return Err(AllocError::OutOfMemory {
                size: self.page_layout.size(),
            });
        };
        let page = base.cast::<PageHeader>();

        // SAFETY: every offset below stays within the page just allocated;
        // block headers and payloads are 8-aligned because the page header
        // size and the stride are multiples of 8.
        unsafe {
            let first = base.as_ptr().add(PAGE_HEADER_SIZE);
            for i in 0..self.blocks_per_page {
                let block = first.add(i * self.stride);
                block.cast::<NonNull<PageHeader>>().write(page);
                let next = if i + 1 < self.blocks_per_page {
                    first.add((i + 1) * self.stride)
                } else {
                    ptr::null_mut()
                };
                block.add(BLOCK_HEADER_SIZE).cast::<*mut u8>().write(next);
            }
            page.as_ptr().write(PageHeader {
                next: None,
                prev: None,
                used: 0,
                free_head: first,
            });
            push(&mut self.partial, page);
        }

        self.pages += 1;
        tracing::debug!(
            block_size = self.block_size,
            blocks_per_page = self.blocks_per_page,
            pages = self.pages,
            "mapped pool page"
        );
        Ok(page)
    }

    /// # Safety
    ///
    /// `page` must belong to this pool and already be unlinked.
    unsafe fn release(&mut self, page: NonNull<PageHeader>) {
        alloc::dealloc(page.as_ptr().cast(), self.page_layout);
        self.pages -= 1;
        tracing::debug!(
            block_size = self.block_size,
            pages = self.pages,
            "released pool page"
        );
    }

    /// Payload size requested at construction.
    pub fn block_size(&self) -> usize {
        self.block_size
    }

    pub fn blocks_per_page(&self) -> usize {
        self.blocks_per_page
    }

    /// Pages currently mapped.
    pub fn page_count(&self) -> usize {
        self.pages
    }

    /// Blocks currently handed out.
    pub fn live_blocks(&self) -> usize {
        self.live
    }

    /// Pages with no free block left.
    pub fn full_page_count(&self) -> usize {
        count(self.full)
    }

    /// Pages with at least one free block.
    pub fn partial_page_count(&self) -> usize {
        count(self.partial)
    }
}

impl Drop for GrowablePool {
    fn drop(&mut self) {
        for head in [self.partial.take(), self.full.take()] {
            let mut cursor = head;
            while let Some(page) = cursor {
                // SAFETY: every listed page was allocated by `expand` with
                // `page_layout`; `next` is read before the page is released.
                unsafe {
                    cursor = (*page.as_ptr()).next;
                    alloc::dealloc(page.as_ptr().cast(), self.page_layout);
                }
            }
        }
        self.pages = 0;
    }
}

impl std::fmt::Debug for GrowablePool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GrowablePool")
            .field("block_size", &self.block_size)
            .field("blocks_per_page", &self.blocks_per_page)
            .field("pages", &self.pages)
            .field("live", &self.live)
            .finish_non_exhaustive()
    }
}

// ── Page lists ──────────────────────────────────────────────────────────

/// # Safety
///
/// `page` must be live and not on any list.
unsafe fn push(head: &mut Option<NonNull<PageHeader>>, page: NonNull<PageHeader>) {
    let header = page.as_ptr();
    (*header).prev = None;
    (*header).next = *head;
    if let Some(old) = *head {
        (*old.as_ptr()).prev = Some(page);
    }
    *head = Some(page);
}

/// # Safety
///
/// `page` must be live and on the list starting at `head`.
unsafe fn unlink(head: &mut Option<NonNull<PageHeader>>, page: NonNull<PageHeader>) {
    let header = page.as_ptr();
    match (*header).prev {
        Some(prev) => (*prev.as_ptr()).next = (*header).next,
        None => *head = (*header).next,
    }
    if let Some(next) = (*header).next {
        (*next.as_ptr()).prev = (*header).prev;
    }
    (*header).next = None;
    (*header).prev = None;
}

fn count(head: Option<NonNull<PageHeader>>) -> usize {
    let mut n = 0;
    let mut cursor = head;
    while let Some(page) = cursor {
        n += 1;
        // SAFETY: pages on a pool list are live until released.
        cursor = unsafe { (*page.as_ptr()).next };
    }
    n
}

#[cfg(test)]
mod tests;
