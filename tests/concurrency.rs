//! Várias threads martelando instâncias locais das duas camadas.

mod common;

use common::Arena;
use kmem::mm::config::FREE_BLOCK_BUDGET;
use kmem::mm::heap::MAX_PAYLOAD;
use kmem::mm::{BlockAllocator, PageAllocator};
use std::thread;

/// Blocos vivos por thread; threads * LIVE_PER_THREAD cabe nas arenas
const LIVE_PER_THREAD: usize = 8;

fn xorshift(x: &mut u32) -> u32 {
    *x ^= *x << 13;
    *x ^= *x >> 17;
    *x ^= *x << 5;
    *x
}

fn hammer(heap: &BlockAllocator<'_>, threads: u8, rounds: usize) {
    thread::scope(|s| {
        for t in 0..threads {
            s.spawn(move || {
                let mut seed = 0x9E37_79B9u32 ^ (t as u32 + 1);
                let mut live = Vec::new();

                for _ in 0..rounds {
                    let r = xorshift(&mut seed);
                    if live.is_empty() || (live.len() < LIVE_PER_THREAD && r % 2 == 0) {
                        let size = 1 + (r as usize % MAX_PAYLOAD);
                        if let Some(p) = heap.allocate(size) {
                            unsafe { p.as_ptr().write_bytes(t, size) };
                            live.push((p, size));
                        }
                    } else {
                        let (p, size) = live.swap_remove(r as usize % live.len());
                        let bytes = unsafe { std::slice::from_raw_parts(p.as_ptr(), size) };
                        assert!(bytes.iter().all(|&b| b == t), "bloco compartilhado entre threads");
                        heap.free(p.as_ptr()).expect("free");
                    }
                }

                for (p, _) in live {
                    heap.free(p.as_ptr()).expect("free");
                }
            });
        }
    });
}

#[test]
fn concurrent_blocks_keep_invariants() {
    let arena = Arena::new(96);
    let pmm = PageAllocator::new();
    unsafe { pmm.init(arena.start(), arena.end()) }.expect("init");
    let heap = BlockAllocator::new(&pmm);

    hammer(&heap, 8, 2_000);

    let stats = heap.stats();
    assert!(stats.is_consistent(), "{:?}", stats);
    assert_eq!(heap.audit(), stats);
    assert_eq!(stats.allocated_blocks, 0);
    assert!(stats.free_blocks <= FREE_BLOCK_BUDGET);
    assert_eq!(pmm.stats().used_pages(), stats.pages_held);
}

#[test]
fn concurrent_blocks_with_zero_budget_return_every_page() {
    let arena = Arena::new(32);
    let pmm = PageAllocator::new();
    unsafe { pmm.init(arena.start(), arena.end()) }.expect("init");
    let heap = BlockAllocator::with_budget(&pmm, 0);

    hammer(&heap, 4, 1_000);

    assert_eq!(heap.stats().total_blocks, 0);
    let pages = pmm.stats();
    assert_eq!(pages.free_pages, 32);
    assert_eq!(pages.allocs, pages.frees);
}
