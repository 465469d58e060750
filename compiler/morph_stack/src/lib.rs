//! Stack safety utilities for deep recursion.
//!
//! Mapping plans recurse twice: once while the graph builder descends into
//! member sub-mappings, and again at run time when a compiled function maps a
//! long chain of nested objects (a linked list of ten thousand nodes is a
//! perfectly ordinary input). Both paths wrap their recursive step in
//! [`ensure_sufficient_stack`].
//!
//! # Platform Support
//!
//! - **Native targets**: Uses the `stacker` crate to grow the stack on demand.
//! - **WASM targets**: No-op passthrough (WASM has its own stack management).
//!
//! # Configuration
//!
//! - **Red zone**: 100KB - If less than this remains, we grow the stack
//! - **Growth size**: 1MB - Each growth allocates this much additional space

/// Minimum stack space to keep available (100KB red zone).
const RED_ZONE: usize = 100 * 1024;

/// Stack space to allocate when growing (1MB).
const STACK_PER_RECURSION: usize = 1024 * 1024;

/// Ensure sufficient stack space is available before executing `f`.
///
/// If the remaining stack is below the red zone threshold, additional stack
/// space is allocated before calling `f`.
///
/// ```text
/// fn map_node(&self, value: &Value, ctx: &mut MapContext<'_>) -> EvalResult {
///     ensure_sufficient_stack(|| self.root.call(value, ctx))
/// }
/// ```
#[inline]
#[cfg(not(target_arch = "wasm32"))]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, STACK_PER_RECURSION, f)
}

/// WASM version - just call directly.
#[inline]
#[cfg(target_arch = "wasm32")]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    f()
}
