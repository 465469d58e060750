//! Per-request compile state.

use std::sync::Arc;

use morph_config::Fork;
use morph_ir::{MapKind, TypePair};
use rustc_hash::FxHashMap;

/// Tracks the pairs currently being built for one top-level request.
///
/// A pair found in the running set while building its own members is a
/// cyclic type reference: the builder emits a by-reference call (or, with
/// `max_depth`, inlines up to the limit) instead of recursing forever.
#[derive(Debug)]
pub struct CompileContext {
    kind: MapKind,
    /// Pair -> number of in-progress builds of that pair.
    running: FxHashMap<TypePair, u32>,
    /// Fork overlays of enclosing pairs, innermost last.
    forks: Vec<Arc<Fork>>,
}

impl CompileContext {
    pub fn new(kind: MapKind) -> Self {
        CompileContext {
            kind,
            running: FxHashMap::default(),
            forks: Vec::new(),
        }
    }

    /// Kind of the top-level request.
    #[inline]
    pub fn kind(&self) -> MapKind {
        self.kind
    }

    pub fn push(&mut self, pair: TypePair) {
        *self.running.entry(pair).or_insert(0) += 1;
    }

    pub fn pop(&mut self, pair: TypePair) {
        if let Some(depth) = self.running.get_mut(&pair) {
            *depth -= 1;
            if *depth == 0 {
                self.running.remove(&pair);
            }
        }
    }

    #[inline]
    pub fn is_running(&self, pair: TypePair) -> bool {
        self.running.contains_key(&pair)
    }

    /// Number of enclosing builds of `pair`.
    #[inline]
    pub fn depth(&self, pair: TypePair) -> u32 {
        self.running.get(&pair).copied().unwrap_or(0)
    }

    pub fn push_fork(&mut self, fork: Arc<Fork>) {
        self.forks.push(fork);
    }

    pub fn pop_fork(&mut self) {
        self.forks.pop();
    }

    /// Innermost active fork overlay.
    pub fn fork(&self) -> Option<&Arc<Fork>> {
        self.forks.last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use morph_ir::TypeId;

    #[test]
    fn depth_counts_nested_pushes() {
        let pair = TypePair::new(TypeId::new(8), TypeId::new(9));
        let mut ctx = CompileContext::new(MapKind::Map);
        assert!(!ctx.is_running(pair));

        ctx.push(pair);
        ctx.push(pair);
        assert_eq!(ctx.depth(pair), 2);

        ctx.pop(pair);
        assert!(ctx.is_running(pair));
        ctx.pop(pair);
        assert!(!ctx.is_running(pair));
        assert_eq!(ctx.depth(pair), 0);
    }

    #[test]
    fn innermost_fork_is_active() {
        let mut ctx = CompileContext::new(MapKind::Map);
        let outer = Arc::new(Fork::default());
        let mut inner_fork = Fork::default();
        inner_fork.rule_mut(TypePair::new(TypeId::INT, TypeId::STR));
        let inner = Arc::new(inner_fork);

        ctx.push_fork(Arc::clone(&outer));
        ctx.push_fork(Arc::clone(&inner));
        assert!(Arc::ptr_eq(ctx.fork().expect("fork"), &inner));
        ctx.pop_fork();
        assert!(Arc::ptr_eq(ctx.fork().expect("fork"), &outer));
    }
}
