//! Rules: a priority function plus the settings it contributes.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use bitflags::bitflags;
use morph_ir::{MapKind, TypeId, TypePair};
use morph_types::TypeRegistry;
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::adapter::AdapterKind;
use crate::options::MapperOptions;
use crate::settings::Settings;

bitflags! {
    /// Map kinds a rule applies to.
    #[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
    pub struct KindSet: u8 {
        const MAP = 1 << 0;
        const MAP_TO_TARGET = 1 << 1;
        const PROJECTION = 1 << 2;
    }
}

impl KindSet {
    pub const fn of(kind: MapKind) -> Self {
        match kind {
            MapKind::Map => KindSet::MAP,
            MapKind::MapToTarget => KindSet::MAP_TO_TARGET,
            MapKind::Projection => KindSet::PROJECTION,
        }
    }

    #[inline]
    pub fn includes(self, kind: MapKind) -> bool {
        self.contains(Self::of(kind))
    }
}

impl Default for KindSet {
    fn default() -> Self {
        KindSet::all()
    }
}

/// Everything a priority function may consult.
#[derive(Copy, Clone)]
pub struct RuleContext<'a> {
    pub pair: TypePair,
    pub kind: MapKind,
    /// A rule is registered for exactly this pair.
    pub explicit: bool,
    pub registry: &'a TypeRegistry,
    pub options: &'a MapperOptions,
}

/// Score of a rule for a context; `None` means "not applicable".
pub type PriorityFn = dyn Fn(&RuleContext<'_>) -> Option<i32> + Send + Sync;

/// Where a rule came from.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum RuleOrigin {
    Builtin(AdapterKind),
    /// The mapper-wide default rule.
    Default,
    /// Registered for a type pair through `for_type`/`new_config`.
    Pair(TypePair),
    /// Registered through `when`.
    Predicate,
}

impl RuleOrigin {
    /// User rules are the ones that freeze once compiled.
    pub fn is_user(self) -> bool {
        matches!(self, RuleOrigin::Pair(_) | RuleOrigin::Predicate)
    }
}

/// A scored source of settings.
pub struct Rule {
    origin: RuleOrigin,
    kinds: KindSet,
    priority: Arc<PriorityFn>,
    settings: RwLock<Settings>,
    compiled: AtomicBool,
}

impl Rule {
    pub fn new(
        origin: RuleOrigin,
        kinds: KindSet,
        priority: Arc<PriorityFn>,
        settings: Settings,
    ) -> Self {
        Rule {
            origin,
            kinds,
            priority,
            settings: RwLock::new(settings),
            compiled: AtomicBool::new(false),
        }
    }

    /// Rule for one built-in adapter.
    pub fn builtin(adapter: AdapterKind) -> Self {
        let score = adapter.score();
        Self::new(
            RuleOrigin::Builtin(adapter),
            KindSet::all(),
            Arc::new(move |ctx: &RuleContext<'_>| {
                adapter.applies(ctx.pair, ctx.registry).then_some(score)
            }),
            Settings::for_adapter(adapter),
        )
    }

    /// The default rule: applies to everything just above the adapters.
    pub fn default_rule(settings: Settings) -> Self {
        Self::new(
            RuleOrigin::Default,
            KindSet::all(),
            Arc::new(|_: &RuleContext<'_>| Some(DEFAULT_SCORE)),
            settings,
        )
    }

    /// Rule for a registered pair, scored by type specificity.
    pub fn for_pair(pair: TypePair, kinds: KindSet) -> Self {
        Self::new(
            RuleOrigin::Pair(pair),
            kinds,
            Arc::new(move |ctx: &RuleContext<'_>| score_pair(pair, ctx)),
            Settings::default(),
        )
    }

    /// Rule applying wherever `predicate` holds.
    pub fn when(
        predicate: impl Fn(&RuleContext<'_>) -> bool + Send + Sync + 'static,
        kinds: KindSet,
    ) -> Self {
        Self::new(
            RuleOrigin::Predicate,
            kinds,
            Arc::new(move |ctx: &RuleContext<'_>| predicate(ctx).then_some(PREDICATE_SCORE)),
            Settings::default(),
        )
    }

    #[inline]
    pub fn origin(&self) -> RuleOrigin {
        self.origin
    }

    #[inline]
    pub fn kinds(&self) -> KindSet {
        self.kinds
    }

    /// Score for a context, honoring the rule's kind mask.
    pub fn score(&self, ctx: &RuleContext<'_>) -> Option<i32> {
        if !self.kinds.includes(ctx.kind) {
            return None;
        }
        (self.priority)(ctx)
    }

    pub fn settings(&self) -> RwLockReadGuard<'_, Settings> {
        self.settings.read()
    }

    pub fn settings_mut(&self) -> RwLockWriteGuard<'_, Settings> {
        self.settings.write()
    }

    pub fn is_compiled(&self) -> bool {
        self.compiled.load(Ordering::Acquire)
    }

    pub fn mark_compiled(&self) {
        self.compiled.store(true, Ordering::Release);
    }

    /// Allow modification again after the functions built from this rule
    /// were invalidated.
    pub fn reset_compiled(&self) {
        self.compiled.store(false, Ordering::Release);
    }
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule")
            .field("origin", &self.origin)
            .field("kinds", &self.kinds)
            .field("compiled", &self.is_compiled())
            .finish_non_exhaustive()
    }
}

/// Score of the mapper-wide default rule.
pub const DEFAULT_SCORE: i32 = -1;
/// Score of rules derived from type annotations.
pub const METADATA_SCORE: i32 = 1;
/// Score of `when` rules: ranked like an interface match on one side.
pub const PREDICATE_SCORE: i32 = 25;

const EXACT: i32 = 50;
const BASE_CLASS: i32 = 49;
const GENERIC_DEFINITION: i32 = 30;
const INTERFACE: i32 = 25;

/// Specificity of a rule type for an actual type, or `None` if unrelated.
///
/// Exact match 50; base class 49 minus one per additional level; generic
/// definition 30; implemented interface 25.
pub fn score_side(
    registry: &TypeRegistry,
    rule_ty: TypeId,
    actual: TypeId,
    allow_inheritance: bool,
) -> Option<i32> {
    if rule_ty == actual {
        return Some(EXACT);
    }
    if !allow_inheritance {
        return None;
    }
    if let Some(distance) = registry.inheritance_distance(actual, rule_ty) {
        let levels = i32::try_from(distance).unwrap_or(BASE_CLASS);
        return Some((BASE_CLASS + 1 - levels).max(1));
    }
    if registry.generic_definition(actual) == Some(rule_ty) {
        return Some(GENERIC_DEFINITION);
    }
    if registry.implements(actual, rule_ty) {
        return Some(INTERFACE);
    }
    None
}

/// Score of a pair rule: the sum of both sides, each required to match.
/// Destination-side inheritance counts only when the options allow it.
pub fn score_pair(rule: TypePair, ctx: &RuleContext<'_>) -> Option<i32> {
    let source = score_side(ctx.registry, rule.source, ctx.pair.source, true)?;
    let destination = score_side(
        ctx.registry,
        rule.destination,
        ctx.pair.destination,
        ctx.options.allow_implicit_destination_inheritance,
    )?;
    Some(source + destination)
}
