//! # Operações de Memória
//!
//! Preenchimento de páginas inteiras com bytes de debug.
//!
//! Escritas e leituras passam por `VolatilePtr`: o preenchimento não pode
//! ser eliminado como dead store.

use crate::mm::config::PAGE_SIZE;
use core::ptr::NonNull;
use volatile::VolatilePtr;

/// Palavras de 64 bits por página
const WORDS_PER_PAGE: usize = PAGE_SIZE / core::mem::size_of::<u64>();

/// Preenche uma página inteira com `byte`.
///
/// # Safety
/// - `page` deve apontar para uma página de `PAGE_SIZE` bytes, alinhada a
///   página e acessível para escrita
/// - Nenhuma outra referência viva pode apontar para essa página
pub unsafe fn fill_page(page: NonNull<u8>, byte: u8) {
    let pattern = u64::from_ne_bytes([byte; 8]);
    let base = page.cast::<u64>();

    let mut i = 0;
    while i < WORDS_PER_PAGE {
        VolatilePtr::new(NonNull::new_unchecked(base.as_ptr().add(i))).write(pattern);
        i += 1;
    }
}

/// Verifica se todos os bytes da página valem `byte`.
///
/// Usado pelos testes para detectar escrita após free.
///
/// # Safety
/// Mesmas condições de `fill_page`, exceto que apenas leitura é necessária.
pub unsafe fn page_is_filled(page: NonNull<u8>, byte: u8) -> bool {
    page_filled_from(page, 0, byte)
}

/// Como `page_is_filled`, mas ignora os primeiros `skip` bytes
/// (ex.: o link da free list ou um header de bloco).
///
/// # Safety
/// Mesmas condições de `page_is_filled`.
pub unsafe fn page_filled_from(page: NonNull<u8>, skip: usize, byte: u8) -> bool {
    let mut i = skip;
    while i < PAGE_SIZE {
        if VolatilePtr::new(NonNull::new_unchecked(page.as_ptr().add(i))).read() != byte {
            return false;
        }
        i += 1;
    }
    true
}
