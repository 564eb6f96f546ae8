//! # Funções de Alinhamento de Memória
//!
//! Funções utilitárias para alinhamento de endereços e tamanhos.
//! `align` deve ser sempre potência de 2.

/// Alinha um valor para cima ao próximo múltiplo de `align`.
///
/// Pode estourar perto de `usize::MAX`; use `checked_align_up` para
/// valores vindos de fora (ex.: limites de região).
#[inline(always)]
pub const fn align_up(val: usize, align: usize) -> usize {
    (val + align - 1) & !(align - 1)
}

/// `align_up` que retorna `None` em caso de overflow.
#[inline(always)]
pub const fn checked_align_up(val: usize, align: usize) -> Option<usize> {
    match val.checked_add(align - 1) {
        Some(v) => Some(v & !(align - 1)),
        None => None,
    }
}

/// Verifica se um valor está alinhado a `align`.
#[inline(always)]
pub const fn is_aligned(val: usize, align: usize) -> bool {
    val & (align - 1) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_align_up() {
        assert_eq!(align_up(10, 4), 12);
        assert_eq!(align_up(16, 4), 16);
        assert_eq!(align_up(33, 2), 34);
    }

    #[test]
    fn test_is_aligned() {
        assert!(is_aligned(16, 4));
        assert!(!is_aligned(10, 4));
        assert!(is_aligned(0x2000, 4096));
    }

    #[test]
    fn test_checked_align_up_overflow() {
        assert_eq!(checked_align_up(4095, 4096), Some(4096));
        assert_eq!(checked_align_up(usize::MAX - 1, 4096), None);
    }
}
