//! # PMM - Page Memory Manager
//!
//! Camada inferior do alocador: entrega páginas de `PAGE_SIZE` bytes a partir
//! de uma região contígua entregue no boot.
//!
//! | Arquivo    | Conteúdo |
//! |------------|----------|
//! | `freelist` | `PageAllocator` (free list LIFO intrusiva) |
//! | `frame`    | `PhysPage`, handle de uma página entregue |
//! | `stats`    | contadores de alocação/liberação |

pub mod frame;
pub mod freelist;
pub mod stats;

pub use frame::PhysPage;
pub use freelist::PageAllocator;
pub use stats::{PageStats, PmmStats};
