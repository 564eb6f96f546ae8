//! # Memory Statistics
//!
//! Visão só de leitura sobre os contadores das duas camadas.

use crate::mm::heap::{BlockAllocator, HeapStats};
use crate::mm::pmm::PageStats;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemoryStats {
    pub heap: HeapStats,
    pub pages: PageStats,
}

impl MemoryStats {
    /// Porcentagem de páginas do PMM em uso (inclui as do heap)
    pub fn usage_percent(&self) -> usize {
        if self.pages.total_pages == 0 {
            return 0;
        }
        (self.pages.used_pages() * 100) / self.pages.total_pages
    }
}

/// Fotografia de um par heap + PMM
pub fn snapshot_of(blocks: &BlockAllocator<'_>) -> MemoryStats {
    MemoryStats {
        heap: blocks.stats(),
        pages: blocks.pages().stats(),
    }
}

/// Fotografia da instância global
pub fn snapshot() -> MemoryStats {
    snapshot_of(&crate::mm::BLOCKS)
}

/// Loga os contadores de `blocks` e retorna o número de blocos alocados
pub fn report_of(blocks: &BlockAllocator<'_>) -> usize {
    let stats = snapshot_of(blocks);

    crate::kinfo!("(Stats) Memória:");
    crate::kstat!("  Blocos alocados: ", stats.heap.allocated_blocks);
    crate::kstat!("  Blocos livres:   ", stats.heap.free_blocks);
    crate::kstat!("  Blocos totais:   ", stats.heap.total_blocks);
    crate::kstat!("  Bytes alocados:  ", stats.heap.allocated_bytes);
    crate::kstat!("  Páginas no heap: ", stats.heap.pages_held);
    crate::kstat!("  Páginas livres:  ", stats.pages.free_pages);
    crate::kstat!("  Páginas totais:  ", stats.pages.total_pages);
    crate::kstat!("  Uso (%):         ", stats.usage_percent());
    if stats.pages.failed_allocs > 0 {
        crate::kwarn!("(Stats) Falhas de alocação de página=", stats.pages.failed_allocs);
    }

    stats.heap.allocated_blocks
}

/// `report_of` sobre a instância global
pub fn report() -> usize {
    report_of(&crate::mm::BLOCKS)
}
