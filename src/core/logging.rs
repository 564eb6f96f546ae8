// =============================================================================
// KMEM LOGGING SYSTEM - ZERO OVERHEAD
// =============================================================================
//
// Sistema de logging do alocador com custo ZERO em release.
//
// ARQUITETURA:
// - Usa features do Cargo para compile-time filtering
// - Com feature "no_logs", TODOS os macros viram expressões vazias
// - SEM core::fmt - apenas strings e valores hex/decimais
// - SEM alocação - o alocador não pode depender de si mesmo para logar
// - A saída física (serial, console, buffer) é fornecida pelo ambiente
//   através de um `LogSink` instalado uma única vez no boot
//
// NÍVEIS DE LOG (do mais crítico ao menos):
// - ERROR: Erros fatais ou críticos (double free, magic corrompido)
// - WARN:  Situações suspeitas mas recuperáveis (OOM)
// - INFO:  Fluxo normal de execução (init, relatórios)
// - DEBUG: Informações de debugging (páginas devolvidas)
// - TRACE: Detalhes extremos (cada alocação)
//
// COMO USAR:
//   kinfo!("(PMM) Inicializando...");          // Apenas string
//   kinfo!("(PMM) Addr=", 0x1000);             // String + hex
//   klog!("Start=", start, " End=", end);      // Múltiplos valores
//   knl!();                                    // Fecha a linha do klog!
//
// =============================================================================

use spin::Once;

// =============================================================================
// PREFIXOS COM CORES ANSI
// =============================================================================

pub const P_ERROR: &str = "\x1b[1;31m[ERRO]\x1b[0m ";
pub const P_WARN: &str = "\x1b[1;33m[WARN]\x1b[0m ";
pub const P_INFO: &str = "\x1b[32m[INFO]\x1b[0m ";
pub const P_DEBUG: &str = "\x1b[36m[DEBG]\x1b[0m ";
pub const P_TRACE: &str = "\x1b[35m[TRAC]\x1b[0m ";
pub const P_OK: &str = "\x1b[32m[OK]\x1b[0m ";
pub const P_FAIL: &str = "\x1b[1;31m[FAIL]\x1b[0m ";

// =============================================================================
// SINK DE SAÍDA
// =============================================================================

/// Destino dos bytes de log (UART, framebuffer, ring buffer...).
///
/// Implementações devem ser não-bloqueantes na medida do possível: os macros
/// são chamados de dentro das seções críticas dos alocadores.
pub trait LogSink: Sync {
    fn write_str(&self, s: &str);
}

static SINK: Once<&'static dyn LogSink> = Once::new();

/// Instala o sink global de log.
///
/// Retorna `false` se um sink já estava instalado (o primeiro vence).
pub fn set_sink(sink: &'static dyn LogSink) -> bool {
    let mut installed = false;
    SINK.call_once(|| {
        installed = true;
        sink
    });
    installed
}

/// Emite uma string crua no sink (descartada se não houver sink)
#[inline]
pub fn emit_str(s: &str) {
    if let Some(sink) = SINK.get() {
        sink.write_str(s);
    }
}

/// Emite fim de linha
#[inline]
pub fn emit_nl() {
    emit_str("\n");
}

/// Emite um valor em hexadecimal com prefixo `0x` (16 dígitos)
pub fn emit_hex(value: u64) {
    let mut buf = [0u8; 18];
    emit_str(format_hex(value, &mut buf));
}

/// Emite um valor em decimal
pub fn emit_dec(value: usize) {
    let mut buf = [0u8; 20];
    emit_str(format_dec(value, &mut buf));
}

/// Formata `value` como `0x` + 16 dígitos hex dentro de `buf`
fn format_hex(value: u64, buf: &mut [u8; 18]) -> &str {
    buf[0] = b'0';
    buf[1] = b'x';
    let mut i = 0;
    while i < 16 {
        let nibble = ((value >> ((15 - i) * 4)) & 0xF) as u8;
        buf[2 + i] = nibble_to_ascii(nibble);
        i += 1;
    }
    core::str::from_utf8(&buf[..]).unwrap_or("0x????????????????")
}

/// Formata `value` em decimal no fim de `buf` (max 20 dígitos para u64)
fn format_dec(mut value: usize, buf: &mut [u8; 20]) -> &str {
    let mut pos = buf.len();

    if value == 0 {
        pos -= 1;
        buf[pos] = b'0';
    }

    while value > 0 {
        pos -= 1;
        buf[pos] = b'0' + (value % 10) as u8;
        value /= 10;
    }

    core::str::from_utf8(&buf[pos..]).unwrap_or("?")
}

#[inline(always)]
const fn nibble_to_ascii(n: u8) -> u8 {
    if n < 10 {
        b'0' + n
    } else {
        b'a' + (n - 10)
    }
}

// =============================================================================
// MACROS DE LOG - NÍVEL ERROR
// =============================================================================
//
// kerror! - Sempre ativo (exceto com no_logs)
//

#[cfg(not(feature = "no_logs"))]
#[macro_export]
macro_rules! kerror {
    // Apenas string
    ($msg:expr) => {{
        $crate::core::logging::emit_str($crate::core::logging::P_ERROR);
        $crate::core::logging::emit_str($msg);
        $crate::core::logging::emit_nl();
    }};
    // String + valor hex
    ($msg:expr, $val:expr) => {{
        $crate::core::logging::emit_str($crate::core::logging::P_ERROR);
        $crate::core::logging::emit_str($msg);
        $crate::core::logging::emit_hex($val as u64);
        $crate::core::logging::emit_nl();
    }};
}

#[cfg(feature = "no_logs")]
#[macro_export]
macro_rules! kerror {
    ($($t:tt)*) => {{}};
}

// =============================================================================
// MACROS DE LOG - NÍVEL WARN
// =============================================================================

#[cfg(not(feature = "no_logs"))]
#[macro_export]
macro_rules! kwarn {
    ($msg:expr) => {{
        $crate::core::logging::emit_str($crate::core::logging::P_WARN);
        $crate::core::logging::emit_str($msg);
        $crate::core::logging::emit_nl();
    }};
    ($msg:expr, $val:expr) => {{
        $crate::core::logging::emit_str($crate::core::logging::P_WARN);
        $crate::core::logging::emit_str($msg);
        $crate::core::logging::emit_hex($val as u64);
        $crate::core::logging::emit_nl();
    }};
}

#[cfg(feature = "no_logs")]
#[macro_export]
macro_rules! kwarn {
    ($($t:tt)*) => {{}};
}

// =============================================================================
// MACROS DE LOG - NÍVEL INFO
// =============================================================================
//
// kinfo! - Ativo com log_info, log_debug ou log_trace
//

#[cfg(all(
    not(feature = "no_logs"),
    any(feature = "log_info", feature = "log_debug", feature = "log_trace")
))]
#[macro_export]
macro_rules! kinfo {
    ($msg:expr) => {{
        $crate::core::logging::emit_str($crate::core::logging::P_INFO);
        $crate::core::logging::emit_str($msg);
        $crate::core::logging::emit_nl();
    }};
    ($msg:expr, $val:expr) => {{
        $crate::core::logging::emit_str($crate::core::logging::P_INFO);
        $crate::core::logging::emit_str($msg);
        $crate::core::logging::emit_hex($val as u64);
        $crate::core::logging::emit_nl();
    }};
}

#[cfg(not(all(
    not(feature = "no_logs"),
    any(feature = "log_info", feature = "log_debug", feature = "log_trace")
)))]
#[macro_export]
macro_rules! kinfo {
    ($($t:tt)*) => {{}};
}

// =============================================================================
// MACROS DE LOG - NÍVEL DEBUG
// =============================================================================
//
// kdebug! - Ativo apenas com log_debug ou log_trace
//

#[cfg(all(
    not(feature = "no_logs"),
    any(feature = "log_debug", feature = "log_trace")
))]
#[macro_export]
macro_rules! kdebug {
    ($msg:expr) => {{
        $crate::core::logging::emit_str($crate::core::logging::P_DEBUG);
        $crate::core::logging::emit_str($msg);
        $crate::core::logging::emit_nl();
    }};
    ($msg:expr, $val:expr) => {{
        $crate::core::logging::emit_str($crate::core::logging::P_DEBUG);
        $crate::core::logging::emit_str($msg);
        $crate::core::logging::emit_hex($val as u64);
        $crate::core::logging::emit_nl();
    }};
}

#[cfg(not(all(
    not(feature = "no_logs"),
    any(feature = "log_debug", feature = "log_trace")
)))]
#[macro_export]
macro_rules! kdebug {
    ($($t:tt)*) => {{}};
}

// =============================================================================
// MACROS DE LOG - NÍVEL TRACE
// =============================================================================
//
// ktrace! - Ativo apenas com log_trace
// Cuidado: gera uma linha por alocação.
//

#[cfg(all(not(feature = "no_logs"), feature = "log_trace"))]
#[macro_export]
macro_rules! ktrace {
    ($msg:expr) => {{
        $crate::core::logging::emit_str($crate::core::logging::P_TRACE);
        $crate::core::logging::emit_str($msg);
        $crate::core::logging::emit_nl();
    }};
    ($msg:expr, $val:expr) => {{
        $crate::core::logging::emit_str($crate::core::logging::P_TRACE);
        $crate::core::logging::emit_str($msg);
        $crate::core::logging::emit_hex($val as u64);
        $crate::core::logging::emit_nl();
    }};
}

#[cfg(not(all(not(feature = "no_logs"), feature = "log_trace")))]
#[macro_export]
macro_rules! ktrace {
    ($($t:tt)*) => {{}};
}

// =============================================================================
// MACROS AUXILIARES
// =============================================================================

/// klog! - Log genérico sem prefixo de nível.
///
/// Útil para construir linhas com múltiplos valores.
#[cfg(not(feature = "no_logs"))]
#[macro_export]
macro_rules! klog {
    // Apenas string
    ($msg:expr) => {{
        $crate::core::logging::emit_str($msg);
    }};
    // String + hex
    ($msg:expr, $val:expr) => {{
        $crate::core::logging::emit_str($msg);
        $crate::core::logging::emit_hex($val as u64);
    }};
    // String + hex + string + hex
    ($msg1:expr, $val1:expr, $msg2:expr, $val2:expr) => {{
        $crate::core::logging::emit_str($msg1);
        $crate::core::logging::emit_hex($val1 as u64);
        $crate::core::logging::emit_str($msg2);
        $crate::core::logging::emit_hex($val2 as u64);
    }};
}

#[cfg(feature = "no_logs")]
#[macro_export]
macro_rules! klog {
    ($($t:tt)*) => {{}};
}

/// knl! - Fecha uma linha montada com `klog!`.
#[cfg(not(feature = "no_logs"))]
#[macro_export]
macro_rules! knl {
    () => {{
        $crate::core::logging::emit_nl();
    }};
}

#[cfg(feature = "no_logs")]
#[macro_export]
macro_rules! knl {
    () => {{}};
}

/// kstat! - Linha de estatística: rótulo + valor decimal.
#[cfg(all(
    not(feature = "no_logs"),
    any(feature = "log_info", feature = "log_debug", feature = "log_trace")
))]
#[macro_export]
macro_rules! kstat {
    ($label:expr, $val:expr) => {{
        $crate::core::logging::emit_str($crate::core::logging::P_INFO);
        $crate::core::logging::emit_str($label);
        $crate::core::logging::emit_dec($val as usize);
        $crate::core::logging::emit_nl();
    }};
}

#[cfg(not(all(
    not(feature = "no_logs"),
    any(feature = "log_info", feature = "log_debug", feature = "log_trace")
)))]
#[macro_export]
macro_rules! kstat {
    ($($t:tt)*) => {{}};
}

// =============================================================================
// MACROS DE STATUS (OK/FAIL)
// =============================================================================

/// kok! - Log de sucesso (prefixo verde [OK]).
#[cfg(not(feature = "no_logs"))]
#[macro_export]
macro_rules! kok {
    ($msg:expr) => {{
        $crate::core::logging::emit_str($crate::core::logging::P_OK);
        $crate::core::logging::emit_str($msg);
        $crate::core::logging::emit_nl();
    }};
}

#[cfg(feature = "no_logs")]
#[macro_export]
macro_rules! kok {
    ($($t:tt)*) => {{}};
}

/// kfail! - Log de falha (prefixo vermelho [FAIL]).
#[cfg(not(feature = "no_logs"))]
#[macro_export]
macro_rules! kfail {
    ($msg:expr) => {{
        $crate::core::logging::emit_str($crate::core::logging::P_FAIL);
        $crate::core::logging::emit_str($msg);
        $crate::core::logging::emit_nl();
    }};
}

#[cfg(feature = "no_logs")]
#[macro_export]
macro_rules! kfail {
    ($($t:tt)*) => {{}};
}
