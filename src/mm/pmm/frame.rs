use core::fmt;
use core::ptr::NonNull;

/// Uma página física entregue pelo PMM (tamanho fixo PAGE_SIZE = 4KiB)
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct PhysPage {
    start: NonNull<u8>,
}

// SAFETY: uma PhysPage representa posse exclusiva da página; pode migrar
// entre CPUs como qualquer outro recurso possuído.
unsafe impl Send for PhysPage {}

impl PhysPage {
    /// Cria uma página a partir de um ponteiro já validado
    #[inline]
    pub(crate) const fn from_ptr(start: NonNull<u8>) -> Self {
        Self { start }
    }

    /// Retorna o endereço inicial da página
    #[inline]
    pub fn addr(&self) -> usize {
        self.start.as_ptr() as usize
    }

    /// Ponteiro para o início da página
    #[inline]
    pub const fn as_non_null(&self) -> NonNull<u8> {
        self.start
    }

    /// Ponteiro tipado para o início da página
    #[inline]
    pub const fn as_mut_ptr<T>(&self) -> *mut T {
        self.start.as_ptr() as *mut T
    }
}

impl fmt::Debug for PhysPage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PhysPage({:#x})", self.addr())
    }
}
