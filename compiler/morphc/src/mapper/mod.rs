//! The mapper: rule table, caches, and the mapping entry points.

mod cache;

use std::sync::Arc;

use morph_build::{build_graph, BuildOutput, CompileError, SettingsProvider};
use morph_config::{
    display_pair, snapshot_global_defaults, ConfigError, Fork, KindSet, MapperOptions, Resolution,
    Resolver, RuleContext, RuleOrigin, RuleTable, ValueExpr,
};
use morph_eval::{CompiledMap, FunctionTable, MapContext};
use morph_ir::{EvalError, MapGraph, MapKind, TypeId, TypePair, Value};
use morph_types::TypeRegistry;

use crate::errors::MapError;
use crate::setter::TypeAdapterSetter;

use cache::{Compiled, FunctionCache, SettingsCache};

/// Compiles and runs mappings between registered types.
///
/// `Mapper` is `Send + Sync`: cached functions run in parallel without
/// locks, and concurrent first requests for the same pair race to store
/// their function (the first one stored wins). Rules must be registered
/// before the pairs they affect are compiled; a rule consumed by a compiled
/// function is frozen until its pair is invalidated.
pub struct Mapper {
    registry: Arc<TypeRegistry>,
    options: MapperOptions,
    table: RuleTable,
    functions: FunctionCache,
    settings: SettingsCache,
}

impl Mapper {
    /// A mapper with default options, seeded from the process-wide default
    /// settings.
    pub fn new(registry: impl Into<Arc<TypeRegistry>>) -> Self {
        Self::with_options(registry, MapperOptions::default())
    }

    pub fn with_options(registry: impl Into<Arc<TypeRegistry>>, options: MapperOptions) -> Self {
        let defaults = options
            .default_settings
            .clone()
            .unwrap_or_else(snapshot_global_defaults);
        Mapper {
            registry: registry.into(),
            options,
            table: RuleTable::new(defaults),
            functions: FunctionCache::default(),
            settings: SettingsCache::default(),
        }
    }

    #[inline]
    pub fn registry(&self) -> &Arc<TypeRegistry> {
        &self.registry
    }

    #[inline]
    pub fn options(&self) -> &MapperOptions {
        &self.options
    }

    /// A member path from the source: `path("Address.City")`.
    pub fn path(&self, dotted: &str) -> ValueExpr {
        dotted
            .split('.')
            .filter(|segment| !segment.is_empty())
            .fold(ValueExpr::Source, |expr, segment| {
                expr.member(self.registry.name(segment))
            })
    }

    // === Mapping ===

    /// Map `source` to a new instance of `pair.destination`.
    ///
    /// A null source yields the destination's default without compiling.
    pub fn adapt(&self, source: &Value, pair: TypePair) -> Result<Value, MapError> {
        if source.is_null() {
            return Ok(self.registry.default_value(pair.destination));
        }
        self.run(pair, MapKind::Map, source.clone(), Value::Null)
    }

    /// Map `source` by its runtime type.
    pub fn adapt_dynamic(&self, source: &Value, destination: TypeId) -> Result<Value, MapError> {
        self.adapt(source, TypePair::new(source.runtime_type(), destination))
    }

    /// Populate `destination` from `source` in place and return it. A null
    /// destination is replaced by a fresh instance; a null source returns
    /// the destination untouched.
    pub fn adapt_to_target(
        &self,
        source: &Value,
        destination: Value,
        pair: TypePair,
    ) -> Result<Value, MapError> {
        self.run(pair, MapKind::MapToTarget, source.clone(), destination)
    }

    /// The projection graph for `pair`, for translation by an external
    /// query provider.
    pub fn project(&self, pair: TypePair) -> Result<Arc<MapGraph>, MapError> {
        Ok(Arc::clone(&self.get_or_compile(pair, MapKind::Projection)?.graph))
    }

    /// Run the projection for `pair` in-process.
    pub fn project_value(&self, source: &Value, pair: TypePair) -> Result<Value, MapError> {
        if source.is_null() {
            return Ok(Value::Null);
        }
        self.run(pair, MapKind::Projection, source.clone(), Value::Null)
    }

    fn run(
        &self,
        pair: TypePair,
        kind: MapKind,
        source: Value,
        destination: Value,
    ) -> Result<Value, MapError> {
        let compiled = self.get_or_compile(pair, kind)?;
        let mut ctx = MapContext::new(self);
        Ok(compiled.function.call(source, destination, &mut ctx)?)
    }

    // === Compilation ===

    /// The compiled function for `pair` and `kind`, compiling on a miss.
    pub fn compiled(&self, pair: TypePair, kind: MapKind) -> Result<Arc<CompiledMap>, MapError> {
        Ok(Arc::clone(&self.get_or_compile(pair, kind)?.function))
    }

    #[tracing::instrument(level = "debug", skip(self))]
    fn get_or_compile(&self, pair: TypePair, kind: MapKind) -> Result<Arc<Compiled>, CompileError> {
        if let Some(hit) = self.functions.get(pair, kind) {
            return Ok(hit);
        }
        tracing::debug!(pair = %display_pair(&self.registry, pair), "cache miss");

        let BuildOutput { graph, resolutions } = build_graph(&self.registry, self, pair, kind)?;
        let function = morph_eval::lower(&graph, &self.registry).map_err(|err| {
            CompileError::lowering(&self.registry, pair, kind, err.to_string())
        })?;
        let mut consulted: Vec<TypePair> = Vec::new();
        for resolution in &resolutions {
            let inherited = resolution.consumed.iter().filter_map(|rule| match rule.origin() {
                RuleOrigin::Pair(origin) => Some(origin),
                _ => None,
            });
            for other in std::iter::once(resolution.pair).chain(inherited) {
                if other != pair && !consulted.contains(&other) {
                    consulted.push(other);
                }
            }
        }
        let stored = self.functions.insert(
            pair,
            kind,
            Compiled {
                graph: Arc::new(graph),
                function: Arc::new(function),
                consulted,
            },
        );
        for resolution in &resolutions {
            resolution.mark_consumed();
        }
        tracing::debug!(rules = resolutions.len(), "rules consumed");
        Ok(stored)
    }

    /// Compile `Map` and `MapToTarget` for every pair with a registered
    /// rule, stopping at the first failure.
    pub fn compile(&self) -> Result<(), MapError> {
        for pair in self.table.explicit_pairs() {
            for kind in [MapKind::Map, MapKind::MapToTarget] {
                if self.table.is_explicit(pair, kind) {
                    self.get_or_compile(pair, kind)?;
                }
            }
        }
        Ok(())
    }

    /// Compile `Map` and `MapToTarget` for one pair.
    pub fn compile_pair(&self, pair: TypePair) -> Result<(), MapError> {
        self.get_or_compile(pair, MapKind::Map)?;
        self.get_or_compile(pair, MapKind::MapToTarget)?;
        Ok(())
    }

    // === Configuration ===

    /// Configure the rule for `pair`, creating it on first use.
    pub fn for_type(&self, pair: TypePair) -> Result<TypeAdapterSetter<'_>, ConfigError> {
        self.for_type_kinds(pair, KindSet::all())
    }

    /// Configure the rule for `pair` that applies only to `kinds`.
    pub fn for_type_kinds(
        &self,
        pair: TypePair,
        kinds: KindSet,
    ) -> Result<TypeAdapterSetter<'_>, ConfigError> {
        let rule = self.table.get_or_insert_pair(pair, kinds);
        if rule.is_compiled() {
            return Err(ConfigError::RuleAlreadyCompiled {
                pair: display_pair(&self.registry, pair),
            });
        }
        self.configuration_changed(Some(pair));
        Ok(TypeAdapterSetter::for_rule(self, rule))
    }

    /// Replace the rule for `pair` with a fresh one, discarding functions
    /// compiled from the old rule.
    pub fn new_config(&self, pair: TypePair) -> TypeAdapterSetter<'_> {
        self.invalidate(pair);
        let rule = self.table.replace_pair(pair, KindSet::all());
        TypeAdapterSetter::for_rule(self, rule)
    }

    /// Configure a rule applying to every pair where `predicate` holds.
    pub fn when(
        &self,
        predicate: impl Fn(&RuleContext<'_>) -> bool + Send + Sync + 'static,
    ) -> TypeAdapterSetter<'_> {
        let rule = self.table.add_predicate(predicate, KindSet::all());
        self.configuration_changed(None);
        TypeAdapterSetter::for_rule(self, rule)
    }

    /// Configure the mapper-wide default rule. It is never frozen;
    /// functions already compiled keep the settings they were built with.
    pub fn default_settings(&self) -> TypeAdapterSetter<'_> {
        self.settings.clear();
        TypeAdapterSetter::for_rule(self, Arc::clone(self.table.default_rule()))
    }

    /// Drop cached settings, plus the functions built with `pair`'s rules.
    pub(crate) fn configuration_changed(&self, pair: Option<TypePair>) {
        self.settings.clear();
        if let Some(pair) = pair {
            self.functions.remove_pair(pair);
        }
    }

    // === Invalidation ===

    /// Drop every cached function for `pair`, the functions of other pairs
    /// that inlined it, and all cached settings, and make the pair's rules
    /// modifiable again. Rules consumed by the dropped dependents stay
    /// frozen until those pairs are invalidated themselves.
    pub fn invalidate(&self, pair: TypePair) {
        tracing::debug!(pair = %display_pair(&self.registry, pair), "invalidate");
        self.functions.remove_pair(pair);
        self.settings.clear();
        for kind in MapKind::ALL {
            for rule in self.table.exact_rules(pair, kind) {
                rule.reset_compiled();
            }
        }
    }

    /// Remove every rule registered for `pair` and invalidate it.
    pub fn remove(&self, pair: TypePair) -> bool {
        let removed = self.table.remove_pair(pair);
        self.invalidate(pair);
        removed
    }

    /// Drop every cached function and setting; all rules become modifiable.
    pub fn clear_cache(&self) {
        self.functions.clear();
        self.settings.clear();
        self.table.reset_compiled();
    }

    /// Number of cached functions across all kinds.
    pub fn cached_functions(&self) -> usize {
        self.functions.len()
    }

    fn resolver(&self) -> Resolver<'_> {
        Resolver::new(&self.table, &self.registry, &self.options)
    }
}

impl SettingsProvider for Mapper {
    /// Resolutions outside a fork are cached per pair and kind; fork
    /// overlays depend on the enclosing pair and are resolved every time.
    fn settings_for(
        &self,
        pair: TypePair,
        kind: MapKind,
        fork: Option<&Fork>,
    ) -> Result<Arc<Resolution>, ConfigError> {
        if fork.is_some() {
            return self.resolver().resolve(pair, kind, fork).map(Arc::new);
        }
        if let Some(hit) = self.settings.get(pair, kind) {
            return Ok(hit);
        }
        let resolution = self.resolver().resolve(pair, kind, None)?;
        Ok(self.settings.insert(pair, kind, resolution))
    }
}

impl FunctionTable for Mapper {
    fn function(&self, pair: TypePair, kind: MapKind) -> Result<Arc<CompiledMap>, EvalError> {
        self.get_or_compile(pair, kind)
            .map(|compiled| Arc::clone(&compiled.function))
            .map_err(|err| EvalError::Dispatch(err.to_string()))
    }
}

impl std::fmt::Debug for Mapper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mapper")
            .field("options", &self.options)
            .field("rules", &self.table)
            .field("cached_functions", &self.functions.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests;
