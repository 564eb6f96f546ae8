//! # Testes do Subsistema de Memória
//!
//! Self test que roda no boot sobre as instâncias globais (`PAGES`/`BLOCKS`):
//! - `pmm_test.rs` - Testes do PMM
//! - `heap_test.rs` - Testes do alocador de blocos
//!
//! Cada caso desfaz o que alocou e compara contadores por diferença, então
//! a suíte pode rodar com o heap já em uso.


pub use test::run_memory_tests;
