//! Tests for the growable pool.

#![allow(
    clippy::unwrap_used,
    reason = "test code uses unwrap for concise assertions"
)]

use pretty_assertions::assert_eq;

use super::*;

fn alloc_n(pool: &mut GrowablePool, n: usize) -> Vec<NonNull<u8>> {
    (0..n).map(|_| pool.alloc().unwrap()).collect()
}

// ── Page lifecycle ──────────────────────────────────────────────────────

#[test]
fn no_page_is_mapped_before_first_alloc() {
    let pool = GrowablePool::new(32, 4).unwrap();
    assert_eq!(pool.page_count(), 0);
}

#[test]
fn filling_a_page_moves_it_to_the_full_list() {
    let mut pool = GrowablePool::new(16, 4).unwrap();
    let blocks = alloc_n(&mut pool, 4);
    assert_eq!(pool.page_count(), 1);
    assert_eq!(pool.full_page_count(), 1);
    assert_eq!(pool.partial_page_count(), 0);

    // SAFETY: block came from this pool.
    unsafe { pool.free(blocks[0]) };
    assert_eq!(pool.full_page_count(), 0);
    assert_eq!(pool.partial_page_count(), 1);
}

#[test]
fn emptied_page_is_released_while_other_page_survives() {
    let mut pool = GrowablePool::new(8, 4).unwrap();
    let blocks = alloc_n(&mut pool, 5);
    assert_eq!(pool.page_count(), 2);

    let survivor = blocks[4];
    // SAFETY: survivor is a live 8-byte block.
    unsafe { survivor.as_ptr().cast::<u64>().write(0xDEAD_BEEF) };

    for block in &blocks[..4] {
        // SAFETY: each block came from this pool and is freed once.
        unsafe { pool.free(*block) };
    }

    assert_eq!(pool.page_count(), 1);
    assert_eq!(pool.live_blocks(), 1);
    // SAFETY: survivor's page was not released.
    assert_eq!(unsafe { survivor.as_ptr().cast::<u64>().read() }, 0xDEAD_BEEF);

    // SAFETY: last live block.
    unsafe { pool.free(survivor) };
    assert_eq!(pool.page_count(), 0);
}

#[test]
fn single_block_pages_are_released_on_every_free() {
    let mut pool = GrowablePool::new(64, 1).unwrap();
    let a = pool.alloc().unwrap();
    let b = pool.alloc().unwrap();
    assert_eq!(pool.page_count(), 2);
    assert_eq!(pool.full_page_count(), 2);
    // SAFETY: both blocks came from this pool.
    unsafe {
        pool.free(a);
        assert_eq!(pool.page_count(), 1);
        pool.free(b);
    }
    assert_eq!(pool.page_count(), 0);
}

#[test]
fn blocks_are_aligned_and_sized() {
    let mut pool = GrowablePool::new(12, 8).unwrap();
    let blocks = alloc_n(&mut pool, 8);
    for pair in blocks.windows(2) {
        let (a, b) = (pair[0].as_ptr() as usize, pair[1].as_ptr() as usize);
        assert_eq!(a % BLOCK_ALIGN, 0);
        assert!(a.abs_diff(b) >= 12 + BLOCK_HEADER_SIZE);
    }
    for block in blocks {
        // SAFETY: writes stay within the 12 requested bytes.
        unsafe {
            block.as_ptr().write_bytes(0xFF, 12);
            pool.free(block);
        }
    }
    assert_eq!(pool.page_count(), 0);
}

#[test]
fn drop_releases_pages_with_live_blocks() {
    let mut pool = GrowablePool::new(32, 2).unwrap();
    let _blocks = alloc_n(&mut pool, 7);
    assert_eq!(pool.page_count(), 4);
    drop(pool);
}

#[test]
fn zero_blocks_per_page_is_rejected() {
    assert_eq!(GrowablePool::new(16, 0).unwrap_err(), AllocError::EmptyPool);
}

// ── Round trip ──────────────────────────────────────────────────────────

mod proptest_round_trip {
    use proptest::prelude::*;

    use super::*;

    proptest! {
        #[test]
        fn any_free_order_releases_every_page(
            (n, order) in (1usize..200).prop_flat_map(|n| {
                (Just(n), Just((0..n).collect::<Vec<_>>()).prop_shuffle())
            }),
            per_page in 1usize..9,
        ) {
            let mut pool = GrowablePool::new(24, per_page).unwrap();
            let blocks = alloc_n(&mut pool, n);
            prop_assert_eq!(pool.page_count(), n.div_ceil(per_page));

            for i in order {
                // SAFETY: each index appears once in the permutation.
                unsafe { pool.free(blocks[i]) };
            }
            prop_assert_eq!(pool.page_count(), 0);
            prop_assert_eq!(pool.live_blocks(), 0);

            let again = pool.alloc().unwrap();
            prop_assert_eq!(pool.page_count(), 1);
            // SAFETY: freshly allocated.
            unsafe { pool.free(again) };
        }
    }
}
