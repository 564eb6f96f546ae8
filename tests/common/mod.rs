//! Utilitários compartilhados pelos testes de integração.

#![allow(dead_code)]

use kmem::core::LogSink;
use kmem::mm::config::PAGE_SIZE;
use std::alloc::{alloc, dealloc, Layout};

/// Região alinhada a página que faz o papel da RAM física
pub struct Arena {
    base: *mut u8,
    layout: Layout,
}

impl Arena {
    pub fn new(pages: usize) -> Self {
        let layout = Layout::from_size_align(pages * PAGE_SIZE, PAGE_SIZE).expect("layout");
        let base = unsafe { alloc(layout) };
        assert!(!base.is_null(), "arena OOM");
        Self { base, layout }
    }

    pub fn start(&self) -> usize {
        self.base as usize
    }

    pub fn end(&self) -> usize {
        self.start() + self.layout.size()
    }
}

impl Drop for Arena {
    fn drop(&mut self) {
        unsafe { dealloc(self.base, self.layout) }
    }
}

/// Sink que acumula tudo o que foi logado
pub struct Capture {
    buf: spin::Mutex<String>,
}

impl Capture {
    pub const fn new() -> Self {
        Self {
            buf: spin::Mutex::new(String::new()),
        }
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.buf.lock().contains(needle)
    }
}

impl LogSink for Capture {
    fn write_str(&self, s: &str) {
        self.buf.lock().push_str(s);
    }
}
