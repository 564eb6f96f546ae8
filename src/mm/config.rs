//! # Configuração do Módulo de Memória
//!
//! Define constantes e parâmetros globais das duas camadas de alocação.

// =============================================================================
// CONSTANTES DE TAMANHO
// =============================================================================

/// Tamanho de uma página (4 KiB)
pub const PAGE_SIZE: usize = 4096;

/// Máscara para alinhar endereços a página
pub const PAGE_MASK: usize = !(PAGE_SIZE - 1);

// =============================================================================
// PREENCHIMENTO DE DEBUG
// =============================================================================

/// Byte escrito em toda página entregue por `allocate_page`.
/// Leitura de memória não inicializada aparece como 0x05 0x05 ...
pub const ALLOC_FILL_BYTE: u8 = 0x05;

/// Byte escrito em toda página devolvida por `free_page`.
/// Distinto do anterior para separar "fresca" de "liberada" no debugger.
pub const FREE_FILL_BYTE: u8 = 0x01;

// =============================================================================
// CONFIGURAÇÃO DO ALOCADOR DE BLOCOS
// =============================================================================

/// Granularidade dos tamanhos pedidos (potência de 2)
pub const BLOCK_ALIGN: usize = 2;

/// Tag gravada em todo header de bloco
pub const BLOCK_MAGIC: u32 = 34;

/// Máximo de blocos livres mantidos na lista antes de devolver páginas ao PMM
pub const FREE_BLOCK_BUDGET: usize = 13;

// =============================================================================
// FUNÇÕES UTILITÁRIAS
// =============================================================================

pub use crate::klib::align::{align_up, checked_align_up, is_aligned};

/// Verifica se o endereço está alinhado a página
#[inline(always)]
pub const fn is_page_aligned(addr: usize) -> bool {
    addr & !PAGE_MASK == 0
}
