use core::sync::atomic::{AtomicUsize, Ordering};

/// Contadores de eventos do PMM.
///
/// Atualizados fora do lock da free list, por isso atômicos. O número de
/// páginas livres fica dentro da free list (sempre coerente com ela).
#[derive(Debug, Default)]
pub struct PmmStats {
    pub allocs: AtomicUsize,
    pub frees: AtomicUsize,
    pub failed_allocs: AtomicUsize,
}

impl PmmStats {
    pub const fn new() -> Self {
        Self {
            allocs: AtomicUsize::new(0),
            frees: AtomicUsize::new(0),
            failed_allocs: AtomicUsize::new(0),
        }
    }

    pub fn inc_alloc(&self) {
        self.allocs.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_free(&self) {
        self.frees.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_failed(&self) {
        self.failed_allocs.fetch_add(1, Ordering::Relaxed);
    }
}

/// Fotografia do estado do PMM
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PageStats {
    /// Páginas inteiras na região gerenciada
    pub total_pages: usize,
    /// Páginas atualmente na free list
    pub free_pages: usize,
    pub allocs: usize,
    pub frees: usize,
    pub failed_allocs: usize,
}

impl PageStats {
    /// Páginas atualmente entregues a alguém
    pub fn used_pages(&self) -> usize {
        self.total_pages - self.free_pages
    }
}
