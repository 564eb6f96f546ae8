//! # Block Allocator
//!
//! Camada superior: alocações menores que uma página, servidas a partir de
//! páginas pedidas ao PMM.
//!
//! ## Algoritmo
//! - Cada página vira UM bloco (header + payload de `MAX_PAYLOAD` bytes)
//! - Todos os blocos ficam numa lista única, novos blocos entram na frente
//! - `allocate` faz first-fit na lista, sem split
//! - Sem bloco livre que sirva, pede uma página nova ao PMM
//!
//! ## Orçamento de blocos livres
//! Blocos liberados continuam na lista para reuso. Quando já existem
//! `budget` blocos livres, o próximo bloco liberado sai da lista e sua página
//! volta ao PMM. Assim `free_blocks <= budget` sempre.
//!
//! ## Locks
//! Ordem única: lock de blocos → lock do PMM. A devolução de página no
//! caminho do orçamento acontece depois de soltar o lock de blocos.

use super::header::{header_of, payload_of, BlockHeader, MAX_PAYLOAD};
use crate::mm::config::{align_up, is_page_aligned, BLOCK_ALIGN, FREE_BLOCK_BUDGET};
use crate::mm::error::{MmError, MmResult};
use crate::mm::pmm::PageAllocator;
use core::ptr::NonNull;
use spin::Mutex;

/// Fotografia dos contadores do heap
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HeapStats {
    /// Soma de `size` dos blocos alocados
    pub allocated_bytes: usize,
    pub allocated_blocks: usize,
    /// Blocos livres ainda rastreados (nunca acima do orçamento)
    pub free_blocks: usize,
    pub total_blocks: usize,
    /// Páginas emprestadas do PMM (uma por bloco)
    pub pages_held: usize,
}

impl HeapStats {
    pub const fn empty() -> Self {
        Self {
            allocated_bytes: 0,
            allocated_blocks: 0,
            free_blocks: 0,
            total_blocks: 0,
            pages_held: 0,
        }
    }

    /// Relações que valem em qualquer ponto observável
    pub fn is_consistent(&self) -> bool {
        self.allocated_blocks + self.free_blocks == self.total_blocks
            && self.total_blocks == self.pages_held
            && self.allocated_bytes <= self.allocated_blocks * MAX_PAYLOAD
    }
}

/// Lista rastreada + contadores, tudo sob o mesmo lock
struct BlockList {
    head: Option<NonNull<BlockHeader>>,
    stats: HeapStats,
}

// SAFETY: os headers vivem em páginas emprestadas do PMM e só são tocados
// com o lock adquirido.
unsafe impl Send for BlockList {}

impl BlockList {
    const fn new() -> Self {
        Self {
            head: None,
            stats: HeapStats::empty(),
        }
    }

    /// Primeiro bloco livre com `size >= wanted`, da frente para trás
    fn first_fit(&self, wanted: usize) -> Option<NonNull<BlockHeader>> {
        let mut cursor = self.head;
        while let Some(block) = cursor {
            // SAFETY: a lista só contém headers instalados por `allocate`
            let header = unsafe { block.as_ref() };
            if header.is_free() && header.size >= wanted {
                return Some(block);
            }
            cursor = header.next;
        }
        None
    }

    /// Verifica se `target` está na lista
    fn contains(&self, target: NonNull<BlockHeader>) -> bool {
        let mut cursor = self.head;
        while let Some(block) = cursor {
            if block == target {
                return true;
            }
            // SAFETY: a lista só contém headers instalados por `allocate`
            cursor = unsafe { block.as_ref().next };
        }
        false
    }

    /// Remove `target` da lista. Retorna `false` se ele não estava nela.
    fn unlink(&mut self, target: NonNull<BlockHeader>) -> bool {
        let mut link: *mut Option<NonNull<BlockHeader>> = &mut self.head;

        // SAFETY: `link` aponta sempre para `head` ou para o `next` de um
        // header da lista; temos o lock.
        unsafe {
            while let Some(block) = *link {
                if block == target {
                    *link = (*block.as_ptr()).next;
                    (*block.as_ptr()).next = None;
                    return true;
                }
                link = &mut (*block.as_ptr()).next;
            }
        }
        false
    }
}

/// BlockAllocator - first-fit sobre páginas do PMM.
pub struct BlockAllocator<'p> {
    pages: &'p PageAllocator,
    budget: usize,
    list: Mutex<BlockList>,
}

impl<'p> BlockAllocator<'p> {
    /// Alocador vazio sobre `pages`, com o orçamento padrão
    pub const fn new(pages: &'p PageAllocator) -> Self {
        Self::with_budget(pages, FREE_BLOCK_BUDGET)
    }

    /// Como `new`, com orçamento de blocos livres explícito.
    ///
    /// `budget == 0` devolve toda página no primeiro free.
    pub const fn with_budget(pages: &'p PageAllocator, budget: usize) -> Self {
        Self {
            pages,
            budget,
            list: Mutex::new(BlockList::new()),
        }
    }

    /// Zera a lista e os contadores.
    ///
    /// Blocos que ainda existissem são esquecidos (suas páginas não voltam ao
    /// PMM), então só faz sentido no boot, depois do `PageAllocator::init`.
    pub fn init(&self) {
        let mut list = self.list.lock();
        *list = BlockList::new();
        drop(list);

        crate::kinfo!("(Heap) Alocador de blocos pronto, orçamento=", self.budget);
    }

    /// PMM de onde vêm as páginas
    pub fn pages(&self) -> &'p PageAllocator {
        self.pages
    }

    pub fn budget(&self) -> usize {
        self.budget
    }

    /// Aloca `size` bytes.
    ///
    /// `None` para `size == 0`, para pedidos maiores que `MAX_PAYLOAD` e
    /// quando o PMM está sem páginas.
    pub fn allocate(&self, size: usize) -> Option<NonNull<u8>> {
        if size == 0 {
            return None;
        }
        if size > MAX_PAYLOAD {
            crate::kwarn!("(Heap) allocate: pedido maior que uma página, size=", size);
            return None;
        }

        let wanted = align_up(size, BLOCK_ALIGN);
        let mut list = self.list.lock();

        if let Some(block) = list.first_fit(wanted) {
            // SAFETY: bloco da lista, lock adquirido
            let granted = unsafe {
                let header = &mut *block.as_ptr();
                header.mark_allocated();
                header.size
            };
            list.stats.free_blocks -= 1;
            list.stats.allocated_blocks += 1;
            list.stats.allocated_bytes += granted;
            drop(list);

            crate::ktrace!("(Heap) allocate: reuso first-fit=", block.as_ptr() as usize);
            return Some(payload_of(block));
        }

        // Block → Page: única ordem de aninhamento permitida
        let Some(page) = self.pages.allocate_page() else {
            drop(list);
            crate::kwarn!("(Heap) sem páginas para novo bloco, size=", size);
            return None;
        };

        let block = page.as_non_null().cast::<BlockHeader>();
        // SAFETY: página recém-entregue pelo PMM, alinhada e exclusiva
        unsafe {
            block.as_ptr().write(BlockHeader {
                next: list.head,
                ..BlockHeader::fresh()
            });
        }
        list.head = Some(block);
        list.stats.total_blocks += 1;
        list.stats.pages_held += 1;
        list.stats.allocated_blocks += 1;
        list.stats.allocated_bytes += MAX_PAYLOAD;
        drop(list);

        crate::ktrace!("(Heap) allocate: bloco novo=", block.as_ptr() as usize);
        Some(payload_of(block))
    }

    /// Libera um ponteiro devolvido por `allocate`.
    ///
    /// Ponteiro nulo é no-op. Qualquer erro é detectado antes de mexer em
    /// estado: o bloco fica exatamente como estava.
    pub fn free(&self, ptr: *mut u8) -> MmResult<()> {
        let Some(payload) = NonNull::new(ptr) else {
            return Ok(());
        };
        let block = self.locate(payload)?;

        let mut list = self.list.lock();

        // SAFETY: `locate` garantiu que o header está numa página gerenciada
        let (valid, allocated, size) = unsafe {
            let header = &*block.as_ptr();
            (header.is_valid(), header.is_allocated(), header.size)
        };

        if !valid {
            drop(list);
            crate::kerror!("(Heap) free: magic inválido, ptr=", ptr as usize);
            return Err(MmError::BadMagic);
        }
        if !allocated {
            drop(list);
            crate::kerror!("(Heap) free: double free, ptr=", ptr as usize);
            return Err(MmError::DoubleFree);
        }
        // Todo bloco cobre a página inteira
        if size != MAX_PAYLOAD {
            drop(list);
            crate::kerror!("(Heap) free: header corrompido, size=", size);
            return Err(MmError::BadMagic);
        }

        let keep = list.stats.free_blocks < self.budget;

        // Só blocos da lista podem ser liberados, nos dois caminhos
        let tracked = if keep { list.contains(block) } else { list.unlink(block) };
        if !tracked {
            drop(list);
            crate::kerror!("(Heap) free: bloco fora da lista, ptr=", ptr as usize);
            return Err(MmError::InvalidPointer);
        }

        if keep {
            // SAFETY: header validado acima, lock adquirido
            unsafe { (*block.as_ptr()).mark_free() };
            list.stats.allocated_blocks -= 1;
            list.stats.allocated_bytes -= size;
            list.stats.free_blocks += 1;
            drop(list);

            crate::ktrace!("(Heap) free: bloco mantido para reuso=", block.as_ptr() as usize);
            return Ok(());
        }

        // Orçamento cheio: o bloco já saiu da lista e a página volta ao PMM
        list.stats.allocated_blocks -= 1;
        list.stats.allocated_bytes -= size;
        list.stats.total_blocks -= 1;
        list.stats.pages_held -= 1;
        drop(list);

        crate::kdebug!("(Heap) free: orçamento cheio, devolvendo página=", block.as_ptr() as usize);
        // SAFETY: a página saiu da lista; ninguém mais a referencia
        unsafe { self.pages.free_page(block.as_ptr() as usize) };
        Ok(())
    }

    /// Capacidade real do bloco por trás de `ptr` (>= tamanho pedido)
    pub fn usable_size(&self, ptr: NonNull<u8>) -> MmResult<usize> {
        let block = self.locate(ptr)?;
        let list = self.list.lock();

        // SAFETY: mesmas garantias de `free`
        let header = unsafe { &*block.as_ptr() };
        if !header.is_valid() || header.size != MAX_PAYLOAD {
            return Err(MmError::BadMagic);
        }
        if header.is_free() || !list.contains(block) {
            return Err(MmError::InvalidPointer);
        }
        Ok(header.size)
    }

    /// Fotografia dos contadores (só leitura)
    pub fn stats(&self) -> HeapStats {
        self.list.lock().stats
    }

    /// Recalcula os contadores percorrendo a lista.
    ///
    /// Deve bater com `stats()`; usado pelos testes e pelo self test.
    pub fn audit(&self) -> HeapStats {
        let list = self.list.lock();
        let mut counted = HeapStats::empty();

        let mut cursor = list.head;
        while let Some(block) = cursor {
            // SAFETY: lista íntegra sob lock
            let header = unsafe { block.as_ref() };
            counted.total_blocks += 1;
            counted.pages_held += 1;
            if header.is_allocated() {
                counted.allocated_blocks += 1;
                counted.allocated_bytes += header.size;
            } else {
                counted.free_blocks += 1;
            }
            cursor = header.next;
        }
        counted
    }

    /// Header de `payload`, se o endereço puder ser um header nosso.
    ///
    /// Só olha o endereço; nenhum byte é lido aqui.
    fn locate(&self, payload: NonNull<u8>) -> MmResult<NonNull<BlockHeader>> {
        match header_of(payload) {
            Some(block)
                if is_page_aligned(block.as_ptr() as usize)
                    && self.pages.contains(block.as_ptr() as usize) =>
            {
                Ok(block)
            }
            _ => {
                crate::kerror!("(Heap) ponteiro inválido=", payload.as_ptr() as usize);
                Err(MmError::InvalidPointer)
            }
        }
    }
}
