//! # Memory Management Subsystem (MM)
//!
//! Alocador de memória do kernel em duas camadas.
//!
//! | Módulo  | Responsabilidade |
//! |---------|------------------|
//! | `pmm`   | Páginas de 4 KiB via free list LIFO intrusiva |
//! | `heap`  | Blocos sub-página: first-fit, header com magic, orçamento de livres |
//! | `stats` | Fotografia e relatório dos contadores |
//! | `ops`   | Preenchimento de páginas com bytes de debug |
//! | `test`  | Self test de boot (feature `self_test`) |
//!
//! ```text
//! BLOCKS (heap) ──▶ PAGES (pmm) ──▶ região [start, end) entregue no boot
//! ```
//!
//! ---------------------------------------------------------------------
//! LOCKS
//! ---------------------------------------------------------------------
//!
//! Cada camada tem seu próprio `spin::Mutex`. O único aninhamento permitido
//! é heap → pmm, nunca o contrário. Preenchimento de páginas roda fora do
//! lock do PMM.
//!
//! ---------------------------------------------------------------------
//! GARANTIAS
//! ---------------------------------------------------------------------
//!
//! Após `mm::init()`:
//! - `PAGES` gerencia todas as páginas inteiras da região
//! - `BLOCKS` está vazio e pronto para `allocate`/`free`
//! - `HEAP` pode ser registrado como `#[global_allocator]`
//!
//! Se algo falhar aqui, o kernel NÃO deve continuar.

pub mod config;
pub mod error;
pub mod heap;
pub mod ops;
pub mod pmm;
pub mod stats;
pub mod test;

#[cfg(test)]
pub(crate) mod testing;

pub use error::{MmError, MmResult};
pub use heap::{BlockAllocator, HeapStats, KernelHeap};
pub use pmm::{PageAllocator, PageStats, PhysPage};
pub use test::run_memory_tests;

/// PMM global
pub static PAGES: PageAllocator = PageAllocator::new();

/// Alocador de blocos global, sobre `PAGES`
pub static BLOCKS: BlockAllocator<'static> = BlockAllocator::new(&PAGES);

/// Adaptador `GlobalAlloc` sobre `BLOCKS`
pub static HEAP: KernelHeap<'static> = KernelHeap::new(&BLOCKS);

/// Inicializa o subsistema de memória sobre `[range_start, range_end)`.
///
/// Ponto único de inicialização. Retorna o número de páginas gerenciadas.
/// Qualquer falha é fatal.
///
/// # Safety
/// - Deve ser chamada apenas uma vez, em early-kernel (single core)
/// - A região deve ser memória válida e de uso exclusivo do alocador
pub unsafe fn init(range_start: usize, range_end: usize) -> usize {
    crate::kinfo!("(MM) Inicializando subsistema de memória...");

    let pages = match PAGES.init(range_start, range_end) {
        Ok(pages) => pages,
        Err(e) => {
            crate::kerror!("(MM) Falha ao inicializar PMM:");
            crate::kerror!(e.as_str());
            panic!("(MM) Falha crítica ao inicializar PMM: {}", e);
        }
    };

    crate::kinfo!("(MM) PMM OK, iniciando Heap...");
    BLOCKS.init();

    #[cfg(feature = "self_test")]
    {
        let report = run_memory_tests();
        if !report.all_passed() {
            panic!("(MM) Self test de memória falhou!");
        }
    }

    crate::kok!("(MM) Subsistema de memória inicializado");
    pages
}
