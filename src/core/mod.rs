//! Core Module
//!
//! Infraestrutura comum do alocador que não pertence a nenhuma das camadas
//! de memória: hoje, apenas o sistema de logging.

pub mod logging;

pub use logging::{set_sink, LogSink};
