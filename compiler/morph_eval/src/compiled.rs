//! Executable mapping functions.

use std::fmt;
use std::sync::Arc;

use morph_ir::{EvalResult, LocalId, MapKind, TypePair, Value};
use morph_stack::ensure_sufficient_stack;

use crate::context::MapContext;

/// A lowered node: evaluates against the current frame.
pub(crate) type Thunk = Arc<dyn for<'f, 't> Fn(&mut Frame<'f, 't>) -> EvalResult + Send + Sync>;

/// Wrap a closure as a [`Thunk`], fixing its higher-ranked signature.
#[inline]
pub(crate) fn thunk<F>(f: F) -> Thunk
where
    F: for<'f, 't> Fn(&mut Frame<'f, 't>) -> EvalResult + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Activation record of one compiled function call.
pub struct Frame<'f, 't> {
    pub(crate) source: Value,
    pub(crate) destination: Value,
    locals: Vec<Value>,
    pub(crate) ctx: &'f mut MapContext<'t>,
}

impl Frame<'_, '_> {
    #[inline]
    pub(crate) fn local(&self, local: LocalId) -> Value {
        self.locals
            .get(local.index())
            .cloned()
            .unwrap_or(Value::Null)
    }

    #[inline]
    pub(crate) fn set_local(&mut self, local: LocalId, value: Value) {
        if let Some(slot) = self.locals.get_mut(local.index()) {
            *slot = value;
        }
    }
}

/// A compiled mapping function for one `(TypePair, MapKind)`.
pub struct CompiledMap {
    pair: TypePair,
    kind: MapKind,
    locals: usize,
    root: Thunk,
}

impl CompiledMap {
    pub(crate) fn new(pair: TypePair, kind: MapKind, locals: usize, root: Thunk) -> Self {
        CompiledMap {
            pair,
            kind,
            locals,
            root,
        }
    }

    pub fn pair(&self) -> TypePair {
        self.pair
    }

    pub fn kind(&self) -> MapKind {
        self.kind
    }

    /// Run the function. `destination` is only read by `MapToTarget`
    /// functions; pass `Value::Null` otherwise.
    pub fn call(&self, source: Value, destination: Value, ctx: &mut MapContext<'_>) -> EvalResult {
        let mut frame = Frame {
            source,
            destination,
            locals: vec![Value::Null; self.locals],
            ctx,
        };
        ensure_sufficient_stack(|| (self.root)(&mut frame))
    }
}

impl fmt::Debug for CompiledMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledMap")
            .field("pair", &self.pair)
            .field("kind", &self.kind)
            .field("locals", &self.locals)
            .finish_non_exhaustive()
    }
}
