//! Tipos de Erro do Subsistema de Memória
//!
//! Erros *recuperáveis*: a operação é abortada antes de qualquer mutação e o
//! alocador continua utilizável. Condições fatais (endereço inválido em
//! `free_page`) não passam por aqui, viram `panic!`.

/// Erros do subsistema de memória
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MmError {
    /// `init` chamado mais de uma vez
    AlreadyInitialized,
    /// Endereço inválido (nulo, overflow ou fora da região gerenciada)
    InvalidAddress,
    /// Região pequena demais para conter uma página inteira
    InvalidSize,
    /// Ponteiro não pode ter vindo do alocador de blocos
    InvalidPointer,
    /// Header com magic diferente de `BLOCK_MAGIC` (corrupção ou ponteiro estranho)
    BadMagic,
    /// Double free detectado
    DoubleFree,
}

impl MmError {
    /// Retorna descrição legível do erro
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AlreadyInitialized => "Alocador já inicializado",
            Self::InvalidAddress => "Endereço inválido",
            Self::InvalidSize => "Região menor que uma página",
            Self::InvalidPointer => "Ponteiro não pertence ao heap",
            Self::BadMagic => "Magic inválido: header corrompido",
            Self::DoubleFree => "Double free detectado",
        }
    }
}

impl core::fmt::Display for MmError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Tipo Result específico para operações de memória
pub type MmResult<T> = Result<T, MmError>;
