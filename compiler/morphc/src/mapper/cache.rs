//! Per-kind function caches and the settings cache.

use std::sync::Arc;

use dashmap::DashMap;
use morph_config::Resolution;
use morph_eval::CompiledMap;
use morph_ir::{MapGraph, MapKind, TypePair};

/// A cached compilation: the graph (kept for projections), its lowered
/// function, and the pairs whose settings were inlined into it.
pub(super) struct Compiled {
    pub(super) graph: Arc<MapGraph>,
    pub(super) function: Arc<CompiledMap>,
    pub(super) consulted: Vec<TypePair>,
}

/// One concurrent map per [`MapKind`], indexed by [`MapKind::index`].
#[derive(Default)]
pub(super) struct FunctionCache {
    kinds: [DashMap<TypePair, Arc<Compiled>>; 3],
}

impl FunctionCache {
    pub(super) fn get(&self, pair: TypePair, kind: MapKind) -> Option<Arc<Compiled>> {
        self.kinds[kind.index()]
            .get(&pair)
            .map(|entry| Arc::clone(entry.value()))
    }

    /// Store `compiled` unless another thread got there first; either way
    /// return the stored entry.
    pub(super) fn insert(&self, pair: TypePair, kind: MapKind, compiled: Compiled) -> Arc<Compiled> {
        let entry = self.kinds[kind.index()]
            .entry(pair)
            .or_insert_with(|| Arc::new(compiled));
        Arc::clone(entry.value())
    }

    /// Drop the functions of `pair` and of every pair that inlined it.
    pub(super) fn remove_pair(&self, pair: TypePair) {
        for cache in &self.kinds {
            cache.retain(|key, compiled| *key != pair && !compiled.consulted.contains(&pair));
        }
    }

    pub(super) fn clear(&self) {
        for cache in &self.kinds {
            cache.clear();
        }
    }

    pub(super) fn len(&self) -> usize {
        self.kinds.iter().map(DashMap::len).sum()
    }
}

/// Effective settings resolved outside any fork.
#[derive(Default)]
pub(super) struct SettingsCache {
    resolved: DashMap<(TypePair, MapKind), Arc<Resolution>>,
}

impl SettingsCache {
    pub(super) fn get(&self, pair: TypePair, kind: MapKind) -> Option<Arc<Resolution>> {
        self.resolved
            .get(&(pair, kind))
            .map(|entry| Arc::clone(entry.value()))
    }

    pub(super) fn insert(&self, pair: TypePair, kind: MapKind, resolution: Resolution) -> Arc<Resolution> {
        let entry = self
            .resolved
            .entry((pair, kind))
            .or_insert_with(|| Arc::new(resolution));
        Arc::clone(entry.value())
    }

    pub(super) fn clear(&self) {
        self.resolved.clear();
    }
}
