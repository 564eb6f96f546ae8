//! # Kernel Heap
//!
//! Alocador de blocos sub-página sobre o PMM.
//!
//! - `header`: layout do cabeçalho e a conversão payload ⇄ header
//! - `block`: `BlockAllocator` (first-fit, orçamento de blocos livres)
//! - `KernelHeap`: adaptador `GlobalAlloc` para `Box`/`Vec` no kernel
//!
//! A biblioteca não registra `#[global_allocator]`; o kernel decide:
//!
//! ```text
//! #[global_allocator]
//! static ALLOCATOR: KernelHeap<'static> = KernelHeap::new(&kmem::mm::BLOCKS);
//! ```

pub mod block;
pub mod header;

pub use block::{BlockAllocator, HeapStats};
pub use header::{BlockFlags, BlockHeader, HEADER_ALIGN, HEADER_SIZE, MAX_PAYLOAD};

use core::alloc::{GlobalAlloc, Layout};
use core::ptr::{self, NonNull};

/// Adaptador `GlobalAlloc` sobre um `BlockAllocator`.
///
/// Atende layouts com `align <= HEADER_ALIGN` e `size <= MAX_PAYLOAD`;
/// o resto recebe null.
pub struct KernelHeap<'a> {
    blocks: &'a BlockAllocator<'a>,
}

impl<'a> KernelHeap<'a> {
    pub const fn new(blocks: &'a BlockAllocator<'a>) -> Self {
        Self { blocks }
    }
}

unsafe impl GlobalAlloc for KernelHeap<'_> {
    /// Retorna `null_mut` em caso de OOM ou layout não suportado.
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        if layout.align() > HEADER_ALIGN {
            crate::kwarn!("(Heap) alloc: alinhamento não suportado=", layout.align());
            return ptr::null_mut();
        }

        match self.blocks.allocate(layout.size()) {
            Some(p) => p.as_ptr(),
            None => ptr::null_mut(),
        }
    }

    unsafe fn dealloc(&self, ptr: *mut u8, _layout: Layout) {
        // O BlockAllocator já registrou o motivo
        let _ = self.blocks.free(ptr);
    }

    /// Blocos nunca são divididos: se o novo tamanho cabe, o ponteiro fica.
    unsafe fn realloc(&self, ptr: *mut u8, layout: Layout, new_size: usize) -> *mut u8 {
        let Some(old) = NonNull::new(ptr) else {
            return ptr::null_mut();
        };

        if let Ok(capacity) = self.blocks.usable_size(old) {
            if new_size <= capacity {
                return ptr;
            }
        }

        let Ok(new_layout) = Layout::from_size_align(new_size, layout.align()) else {
            return ptr::null_mut();
        };
        let fresh = self.alloc(new_layout);
        if !fresh.is_null() {
            ptr::copy_nonoverlapping(ptr, fresh, layout.size().min(new_size));
            self.dealloc(ptr, layout);
        }
        fresh
    }
}
