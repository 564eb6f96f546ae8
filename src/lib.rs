//! Forge KMem.
//!
//! Alocador de memória do kernel Redstone em duas camadas:
//! páginas de 4 KiB (`mm::pmm`) e blocos sub-página (`mm::heap`).
//!
//! O ambiente fornece a região de memória (`mm::init`) e, opcionalmente, o
//! destino dos logs (`core::logging::set_sink`).

#![cfg_attr(not(test), no_std)]

// --- Infraestrutura ---
pub mod core; // Logging
pub mod klib; // Alinhamento, framework de testes

// --- Alocador ---
pub mod mm; // PMM, Heap, Stats
