//! # Page Free List
//!
//! Alocador de páginas físicas baseado em uma free list intrusiva LIFO.
//!
//! Cada página livre guarda, nos seus primeiros bytes, um `Run` com o
//! ponteiro para a próxima página livre. Não existe nenhuma estrutura fora da
//! própria memória gerenciada: o custo de metadados é zero e push/pop são O(1).
//!
//! ```text
//! head ─▶ [Run|lixo 0x01...] ─▶ [Run|lixo 0x01...] ─▶ None
//! ```
//!
//! ## Preenchimento de debug
//! - `allocate_page` entrega a página preenchida com `ALLOC_FILL_BYTE`
//! - `free_page` sobrescreve a página com `FREE_FILL_BYTE`
//!
//! Os dois preenchimentos rodam FORA do lock da lista.
//!
//! ## Condição fatal
//! `free_page` com endereço desalinhado ou fora da região gerenciada
//! significa que a contabilidade de alguém já está corrompida. O alocador não
//! tenta se recuperar: `panic!`.

use super::frame::PhysPage;
use super::stats::{PageStats, PmmStats};
use crate::mm::config::{
    checked_align_up, is_page_aligned, ALLOC_FILL_BYTE, FREE_FILL_BYTE, PAGE_SIZE,
};
use crate::mm::error::{MmError, MmResult};
use crate::mm::ops;
use core::ops::Range;
use core::ptr::NonNull;
use core::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use spin::Mutex;

/// Registro gravado no início de cada página livre
struct Run {
    next: Option<NonNull<Run>>,
}

/// Free list protegida pelo lock do PMM
struct FreeList {
    head: Option<NonNull<Run>>,
    free_pages: usize,
}

// SAFETY: os ponteiros apontam para páginas da região gerenciada, que só são
// acessadas com o lock adquirido.
unsafe impl Send for FreeList {}

impl FreeList {
    const fn new() -> Self {
        Self {
            head: None,
            free_pages: 0,
        }
    }

    /// Empilha uma página livre.
    ///
    /// # Safety
    /// `page` deve ser uma página da região gerenciada, alinhada, e que
    /// ninguém mais está usando.
    unsafe fn push(&mut self, page: NonNull<u8>) {
        let run = page.cast::<Run>();
        run.as_ptr().write(Run { next: self.head });
        self.head = Some(run);
        self.free_pages += 1;
    }

    /// Desempilha a última página liberada
    fn pop(&mut self) -> Option<NonNull<u8>> {
        let run = self.head?;
        // SAFETY: toda entrada da lista foi escrita por `push`
        self.head = unsafe { run.as_ptr().read().next };
        self.free_pages -= 1;
        Some(run.cast())
    }
}

/// PageAllocator - entrega e recolhe páginas de tamanho fixo.
pub struct PageAllocator {
    /// Primeiro endereço gerenciado (alinhado). Zero antes do init.
    start: AtomicUsize,
    /// Fim exclusivo da última página inteira
    end: AtomicUsize,
    ready: AtomicBool,
    list: Mutex<FreeList>,
    stats: PmmStats,
}

impl Default for PageAllocator {
    fn default() -> Self {
        Self::new()
    }
}

impl PageAllocator {
    /// Construtor em tempo de compilação - sem região gerenciada
    pub const fn new() -> Self {
        Self {
            start: AtomicUsize::new(0),
            end: AtomicUsize::new(0),
            ready: AtomicBool::new(false),
            list: Mutex::new(FreeList::new()),
            stats: PmmStats::new(),
        }
    }

    /// Particiona `[align_up(range_start), range_end)` em páginas e coloca
    /// todas na free list.
    ///
    /// Só páginas inteiras entram: uma sobra no fim da região é ignorada.
    /// Retorna o número de páginas disponibilizadas.
    ///
    /// # Safety
    /// - A região deve ser memória válida, acessível para escrita e de uso
    ///   exclusivo deste alocador daqui em diante
    /// - Bootstrap single-threaded: nenhuma outra operação pode rodar em
    ///   paralelo com o init
    pub unsafe fn init(&self, range_start: usize, range_end: usize) -> MmResult<usize> {
        crate::kinfo!("(PMM) Inicializando free list de páginas...");

        let start = match checked_align_up(range_start, PAGE_SIZE) {
            Some(s) if s != 0 => s,
            _ => {
                crate::kerror!("(PMM) init: início de região inválido=", range_start);
                return Err(MmError::InvalidAddress);
            }
        };

        if range_end < start || range_end - start < PAGE_SIZE {
            crate::kerror!("(PMM) init: região menor que uma página, fim=", range_end);
            return Err(MmError::InvalidSize);
        }

        let pages = (range_end - start) / PAGE_SIZE;
        let end = start + pages * PAGE_SIZE;

        if self
            .ready
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            crate::kerror!("(PMM) init chamado mais de uma vez!");
            return Err(MmError::AlreadyInitialized);
        }

        self.start.store(start, Ordering::Release);
        self.end.store(end, Ordering::Release);

        let mut list = self.list.lock();
        let mut addr = start;
        while addr < end {
            let page = NonNull::new_unchecked(addr as *mut u8);
            ops::fill_page(page, FREE_FILL_BYTE);
            list.push(page);
            addr += PAGE_SIZE;
        }
        drop(list);

        crate::kinfo!("(PMM) Região gerenciada:");
        crate::klog!("  início=", start, " fim=", end);
        crate::knl!();
        crate::kstat!("(PMM) Páginas livres: ", pages);
        Ok(pages)
    }

    /// Aloca uma página.
    ///
    /// `None` é o sinal esperado de falta de memória, não uma falha.
    pub fn allocate_page(&self) -> Option<PhysPage> {
        let popped = self.list.lock().pop();

        match popped {
            Some(page) => {
                // SAFETY: a página acabou de sair da free list; é nossa.
                unsafe { ops::fill_page(page, ALLOC_FILL_BYTE) };
                self.stats.inc_alloc();
                crate::ktrace!("(PMM) allocate_page=", page.as_ptr() as usize);
                Some(PhysPage::from_ptr(page))
            }
            None => {
                self.stats.inc_failed();
                crate::kwarn!("(PMM) allocate_page: sem páginas livres");
                None
            }
        }
    }

    /// Devolve uma página à free list.
    ///
    /// Endereço desalinhado ou fora da região gerenciada é FATAL (panic).
    ///
    /// # Safety
    /// `addr` deve ter vindo de `allocate_page` e não pode estar livre nem
    /// em uso por mais ninguém: a página é sobrescrita imediatamente.
    pub unsafe fn free_page(&self, addr: usize) {
        if !is_page_aligned(addr) || !self.contains(addr) {
            crate::kerror!("(PMM) free_page: endereço inválido=", addr);
            panic!("(PMM) free_page: endereço desalinhado ou fora da região gerenciada");
        }

        // `contains` garante addr >= start > 0
        let page = NonNull::new_unchecked(addr as *mut u8);
        ops::fill_page(page, FREE_FILL_BYTE);

        self.list.lock().push(page);
        self.stats.inc_free();
        crate::ktrace!("(PMM) free_page=", addr);
    }

    /// Verifica se `addr` cai dentro da região gerenciada
    #[inline]
    pub fn contains(&self, addr: usize) -> bool {
        let start = self.start.load(Ordering::Acquire);
        let end = self.end.load(Ordering::Acquire);
        start != 0 && addr >= start && addr < end
    }

    /// Região gerenciada (vazia antes do init)
    pub fn managed_range(&self) -> Range<usize> {
        self.start.load(Ordering::Acquire)..self.end.load(Ordering::Acquire)
    }

    /// Número de páginas atualmente livres
    pub fn free_pages(&self) -> usize {
        self.list.lock().free_pages
    }

    /// Fotografia dos contadores do PMM
    pub fn stats(&self) -> PageStats {
        let free_pages = self.free_pages();
        let range = self.managed_range();

        PageStats {
            total_pages: range.len() / PAGE_SIZE,
            free_pages,
            allocs: self.stats.allocs.load(Ordering::Relaxed),
            frees: self.stats.frees.load(Ordering::Relaxed),
            failed_allocs: self.stats.failed_allocs.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use crate::mm::config::is_aligned;
    use crate::mm::testing::Arena;
    use std::collections::BTreeSet;
    use std::vec::Vec;

    #[test]
    fn test_init_partitions_aligned_range() {
        let arena = Arena::new(8);
        let pmm = PageAllocator::new();

        // Início desalinhado: a primeira página parcial é descartada
        let pages = unsafe { pmm.init(arena.start() + 1, arena.end()) }.expect("init");
        assert_eq!(pages, 7);

        let stats = pmm.stats();
        assert_eq!(stats.total_pages, 7);
        assert_eq!(stats.free_pages, 7);
        assert_eq!(stats.used_pages(), 0);
        assert_eq!(pmm.managed_range(), arena.start() + PAGE_SIZE..arena.end());
    }

    #[test]
    fn test_init_ignores_partial_tail() {
        let arena = Arena::new(4);
        let pmm = PageAllocator::new();

        let pages = unsafe { pmm.init(arena.start(), arena.end() - 1) }.expect("init");
        assert_eq!(pages, 3);
        assert!(!pmm.contains(arena.end() - PAGE_SIZE));
    }

    #[test]
    fn test_init_rejects_bad_ranges() {
        let arena = Arena::new(2);

        let pmm = PageAllocator::new();
        assert_eq!(
            unsafe { pmm.init(arena.start(), arena.start() + 100) },
            Err(MmError::InvalidSize)
        );
        assert_eq!(
            unsafe { pmm.init(usize::MAX - 10, usize::MAX) },
            Err(MmError::InvalidAddress)
        );
        assert_eq!(unsafe { pmm.init(0, arena.end()) }, Err(MmError::InvalidAddress));

        // Falhas de validação não consomem o init
        assert_eq!(unsafe { pmm.init(arena.start(), arena.end()) }, Ok(2));
        assert_eq!(
            unsafe { pmm.init(arena.start(), arena.end()) },
            Err(MmError::AlreadyInitialized)
        );
    }

    #[test]
    fn test_uninitialized_allocator_is_empty() {
        let pmm = PageAllocator::new();
        assert!(pmm.allocate_page().is_none());
        assert!(!pmm.contains(0x1000));
        assert_eq!(pmm.stats().total_pages, 0);
        assert_eq!(pmm.stats().failed_allocs, 1);
    }

    #[test]
    fn test_free_then_allocate_is_lifo() {
        let arena = Arena::new(4);
        let pmm = PageAllocator::new();
        unsafe { pmm.init(arena.start(), arena.end()) }.expect("init");

        // Init empilha em ordem crescente: a última página sai primeiro
        let a = pmm.allocate_page().expect("página");
        assert_eq!(a.addr(), arena.end() - PAGE_SIZE);
        let b = pmm.allocate_page().expect("página");

        unsafe { pmm.free_page(a.addr()) };
        let again = pmm.allocate_page().expect("página");
        assert_eq!(again.addr(), a.addr());

        unsafe {
            pmm.free_page(again.addr());
            pmm.free_page(b.addr());
        }
        assert_eq!(pmm.allocate_page().map(|p| p.addr()), Some(b.addr()));
    }

    #[test]
    fn test_exhaustion_returns_none() {
        let arena = Arena::new(5);
        let pmm = PageAllocator::new();
        unsafe { pmm.init(arena.start(), arena.end()) }.expect("init");

        let mut seen = BTreeSet::new();
        while let Some(page) = pmm.allocate_page() {
            assert!(is_aligned(page.addr(), PAGE_SIZE));
            assert!(pmm.contains(page.addr()));
            assert!(seen.insert(page.addr()), "página entregue duas vezes");
        }

        assert_eq!(seen.len(), 5);
        let stats = pmm.stats();
        assert_eq!(stats.free_pages, 0);
        assert_eq!(stats.allocs, 5);
        assert_eq!(stats.failed_allocs, 1);
    }

    #[test]
    fn test_fill_bytes_on_alloc_and_free() {
        let arena = Arena::new(2);
        let pmm = PageAllocator::new();
        unsafe { pmm.init(arena.start(), arena.end()) }.expect("init");

        let page = pmm.allocate_page().expect("página");
        unsafe {
            assert!(ops::page_is_filled(page.as_non_null(), ALLOC_FILL_BYTE));

            page.as_mut_ptr::<u8>().write_bytes(0x77, PAGE_SIZE);
            pmm.free_page(page.addr());

            // Os primeiros bytes guardam o link da free list
            let link = core::mem::size_of::<Run>();
            assert!(ops::page_filled_from(page.as_non_null(), link, FREE_FILL_BYTE));
        }
    }

    #[test]
    #[should_panic(expected = "free_page")]
    fn test_free_unaligned_is_fatal() {
        let arena = Arena::new(2);
        let pmm = PageAllocator::new();
        unsafe { pmm.init(arena.start(), arena.end()) }.expect("init");

        unsafe { pmm.free_page(arena.start() + 8) };
    }

    #[test]
    #[should_panic(expected = "free_page")]
    fn test_free_out_of_range_is_fatal() {
        let arena = Arena::new(2);
        let pmm = PageAllocator::new();
        unsafe { pmm.init(arena.start(), arena.end()) }.expect("init");

        unsafe { pmm.free_page(arena.end()) };
    }

    #[test]
    fn test_concurrent_alloc_free_keeps_every_page() {
        let arena = Arena::new(64);
        let pmm = PageAllocator::new();
        unsafe { pmm.init(arena.start(), arena.end()) }.expect("init");

        std::thread::scope(|s| {
            for t in 0..4u8 {
                let pmm = &pmm;
                s.spawn(move || {
                    for _ in 0..200 {
                        let mut held = Vec::new();
                        for _ in 0..8 {
                            if let Some(p) = pmm.allocate_page() {
                                unsafe { p.as_mut_ptr::<u8>().write(t) };
                                held.push(p);
                            }
                        }
                        for p in held {
                            // Ninguém mais pode ter escrito na nossa página
                            assert_eq!(unsafe { p.as_mut_ptr::<u8>().read() }, t);
                            unsafe { pmm.free_page(p.addr()) };
                        }
                    }
                });
            }
        });

        let stats = pmm.stats();
        assert_eq!(stats.free_pages, 64);
        assert_eq!(stats.allocs, stats.frees);
    }
}
