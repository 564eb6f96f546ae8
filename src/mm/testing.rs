//! Utilitários dos testes de host: arenas alinhadas a página que fazem o
//! papel da RAM física.

extern crate std;

use crate::mm::config::PAGE_SIZE;
use core::ptr::NonNull;
use std::alloc::{alloc, dealloc, Layout};

/// Região de `pages` páginas alinhada a `PAGE_SIZE`, liberada no drop.
pub(crate) struct Arena {
    base: NonNull<u8>,
    layout: Layout,
}

impl Arena {
    pub(crate) fn new(pages: usize) -> Self {
        let layout = Layout::from_size_align(pages * PAGE_SIZE, PAGE_SIZE)
            .expect("layout da arena");
        let base = NonNull::new(unsafe { alloc(layout) }).expect("arena OOM");
        Self { base, layout }
    }

    pub(crate) fn start(&self) -> usize {
        self.base.as_ptr() as usize
    }

    pub(crate) fn end(&self) -> usize {
        self.start() + self.layout.size()
    }

    pub(crate) fn page(&self, index: usize) -> NonNull<u8> {
        assert!(index * PAGE_SIZE < self.layout.size());
        unsafe { NonNull::new_unchecked(self.base.as_ptr().add(index * PAGE_SIZE)) }
    }
}

impl Drop for Arena {
    fn drop(&mut self) {
        unsafe { dealloc(self.base.as_ptr(), self.layout) }
    }
}
