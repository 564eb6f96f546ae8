//! # Block Header
//!
//! Cabeçalho gravado imediatamente antes do payload de cada bloco.
//!
//! ```text
//! página ─▶ +-------------+------------------------------+
//!           | BlockHeader |  payload (size bytes)        |
//!           +-------------+------------------------------+
//!           ^ header_of(p)  ^ p = payload_of(h)
//! ```
//!
//! A conversão payload ⇄ header é aritmética de ponteiro pura e vive
//! SOMENTE aqui. Quem recebe um header de `header_of` ainda precisa validar
//! o endereço antes de ler qualquer campo.

use crate::mm::config::{BLOCK_MAGIC, PAGE_SIZE};
use bitflags::bitflags;
use core::mem::{align_of, size_of};
use core::ptr::NonNull;

bitflags! {
    /// Estado de um bloco
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct BlockFlags: u32 {
        const ALLOCATED = 1 << 0;
    }
}

/// Cabeçalho de bloco.
#[repr(C)]
#[derive(Debug)]
pub struct BlockHeader {
    /// Bytes de payload disponíveis
    pub size: usize,
    /// Deve valer `BLOCK_MAGIC`
    pub magic: u32,
    pub flags: BlockFlags,
    /// Próximo bloco na lista rastreada
    pub next: Option<NonNull<BlockHeader>>,
}

/// Tamanho do header em bytes
pub const HEADER_SIZE: usize = size_of::<BlockHeader>();

/// Alinhamento garantido de todo payload
pub const HEADER_ALIGN: usize = align_of::<BlockHeader>();

/// Maior payload possível: uma página inteira menos o header
pub const MAX_PAYLOAD: usize = PAGE_SIZE - HEADER_SIZE;

const _: () = assert!(HEADER_SIZE < PAGE_SIZE);
const _: () = assert!(PAGE_SIZE % HEADER_ALIGN == 0);

impl BlockHeader {
    /// Header recém-criado para uma página inteira
    pub const fn fresh() -> Self {
        Self {
            size: MAX_PAYLOAD,
            magic: BLOCK_MAGIC,
            flags: BlockFlags::ALLOCATED,
            next: None,
        }
    }

    #[inline]
    pub fn is_valid(&self) -> bool {
        self.magic == BLOCK_MAGIC
    }

    #[inline]
    pub fn is_allocated(&self) -> bool {
        self.flags.contains(BlockFlags::ALLOCATED)
    }

    #[inline]
    pub fn is_free(&self) -> bool {
        !self.is_allocated()
    }

    #[inline]
    pub fn mark_allocated(&mut self) {
        self.flags.insert(BlockFlags::ALLOCATED);
    }

    #[inline]
    pub fn mark_free(&mut self) {
        self.flags.remove(BlockFlags::ALLOCATED);
    }
}

/// Recupera o endereço do header a partir de um ponteiro de payload.
///
/// Não lê memória. Retorna `None` se o ponteiro for baixo demais para ter
/// um header antes dele.
#[inline]
pub fn header_of(payload: NonNull<u8>) -> Option<NonNull<BlockHeader>> {
    let addr = payload.as_ptr() as usize;
    if addr < HEADER_SIZE {
        return None;
    }
    NonNull::new(payload.as_ptr().wrapping_sub(HEADER_SIZE) as *mut BlockHeader)
}

/// Ponteiro de payload de um header
#[inline]
pub fn payload_of(header: NonNull<BlockHeader>) -> NonNull<u8> {
    // SAFETY: header + HEADER_SIZE continua dentro da mesma página e não é nulo
    unsafe { NonNull::new_unchecked((header.as_ptr() as *mut u8).add(HEADER_SIZE)) }
}
