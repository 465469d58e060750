//! Per-call mapping state and the function table seam.

use std::sync::Arc;

use morph_ir::{EvalError, MapKind, TypePair, Value};
use rustc_hash::FxHashMap;

use crate::compiled::CompiledMap;

/// Supplies compiled functions for by-reference and runtime-dispatched
/// calls. The mapper implements this over its cache, compiling on demand.
pub trait FunctionTable: Sync {
    /// The function for `pair` and `kind`. Failures surface as
    /// [`EvalError::Dispatch`].
    fn function(&self, pair: TypePair, kind: MapKind) -> Result<Arc<CompiledMap>, EvalError>;
}

/// State of one top-level mapping call, passed explicitly through every
/// nested invocation.
pub struct MapContext<'t> {
    pub(crate) table: &'t dyn FunctionTable,
    /// `(source identity, pair)` to the destination produced for it.
    pub(crate) references: FxHashMap<(usize, TypePair), Value>,
}

impl<'t> MapContext<'t> {
    pub fn new(table: &'t dyn FunctionTable) -> Self {
        MapContext {
            table,
            references: FxHashMap::default(),
        }
    }

    /// Number of destinations registered for reference preservation.
    pub fn preserved(&self) -> usize {
        self.references.len()
    }
}
