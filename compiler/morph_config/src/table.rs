//! The rule table: built-in adapters, the default rule, pair rules, and
//! predicate rules.

use std::sync::Arc;

use dashmap::DashMap;
use morph_ir::{MapKind, TypePair};
use parking_lot::RwLock;

use crate::adapter::AdapterKind;
use crate::rule::{KindSet, Rule, RuleContext};
use crate::settings::Settings;

/// All rules of one mapper.
///
/// Pair rules are keyed by `(TypePair, KindSet)`, so a pair may carry one
/// rule for all kinds plus narrower rules for individual kinds.
#[derive(Debug)]
pub struct RuleTable {
    builtins: Vec<Arc<Rule>>,
    default: Arc<Rule>,
    pairs: DashMap<(TypePair, KindSet), Arc<Rule>>,
    predicates: RwLock<Vec<Arc<Rule>>>,
}

impl RuleTable {
    pub fn new(default_settings: Settings) -> Self {
        RuleTable {
            builtins: AdapterKind::ALL
                .into_iter()
                .map(|adapter| Arc::new(Rule::builtin(adapter)))
                .collect(),
            default: Arc::new(Rule::default_rule(default_settings)),
            pairs: DashMap::new(),
            predicates: RwLock::new(Vec::new()),
        }
    }

    #[inline]
    pub fn default_rule(&self) -> &Arc<Rule> {
        &self.default
    }

    pub fn builtins(&self) -> &[Arc<Rule>] {
        &self.builtins
    }

    /// The rule registered for exactly `pair` and `kinds`.
    pub fn pair_rule(&self, pair: TypePair, kinds: KindSet) -> Option<Arc<Rule>> {
        self.pairs.get(&(pair, kinds)).map(|r| Arc::clone(r.value()))
    }

    /// Rules registered for exactly `pair` that apply to `kind`, narrowest
    /// kind set first.
    pub fn exact_rules(&self, pair: TypePair, kind: MapKind) -> Vec<Arc<Rule>> {
        let mut rules: Vec<Arc<Rule>> = self
            .pairs
            .iter()
            .filter(|e| e.key().0 == pair && e.key().1.includes(kind))
            .map(|e| Arc::clone(e.value()))
            .collect();
        rules.sort_by_key(|r| r.kinds().bits().count_ones());
        rules
    }

    /// A rule is registered for exactly this pair and kind.
    pub fn is_explicit(&self, pair: TypePair, kind: MapKind) -> bool {
        self.pairs
            .iter()
            .any(|e| e.key().0 == pair && e.key().1.includes(kind))
    }

    /// Existing rule for `(pair, kinds)`, or a fresh one.
    pub fn get_or_insert_pair(&self, pair: TypePair, kinds: KindSet) -> Arc<Rule> {
        Arc::clone(
            self.pairs
                .entry((pair, kinds))
                .or_insert_with(|| Arc::new(Rule::for_pair(pair, kinds)))
                .value(),
        )
    }

    /// Replace the rule for `(pair, kinds)` with a fresh one.
    pub fn replace_pair(&self, pair: TypePair, kinds: KindSet) -> Arc<Rule> {
        let rule = Arc::new(Rule::for_pair(pair, kinds));
        self.pairs.insert((pair, kinds), Arc::clone(&rule));
        rule
    }

    /// Remove every rule registered for `pair`. Returns `true` if any existed.
    pub fn remove_pair(&self, pair: TypePair) -> bool {
        let before = self.pairs.len();
        self.pairs.retain(|key, _| key.0 != pair);
        self.pairs.len() != before
    }

    pub fn add_predicate(
        &self,
        predicate: impl Fn(&RuleContext<'_>) -> bool + Send + Sync + 'static,
        kinds: KindSet,
    ) -> Arc<Rule> {
        let rule = Arc::new(Rule::when(predicate, kinds));
        self.predicates.write().push(Arc::clone(&rule));
        rule
    }

    /// Pairs with at least one registered rule, sorted.
    pub fn explicit_pairs(&self) -> Vec<TypePair> {
        let mut pairs: Vec<TypePair> = self.pairs.iter().map(|e| e.key().0).collect();
        pairs.sort_unstable();
        pairs.dedup();
        pairs
    }

    /// Every rule in a deterministic order: built-ins, default, pair rules
    /// sorted by key, then predicate rules in registration order.
    pub fn candidates(&self) -> Vec<Arc<Rule>> {
        let mut pair_rules: Vec<((TypePair, u8), Arc<Rule>)> = self
            .pairs
            .iter()
            .map(|e| ((e.key().0, e.key().1.bits()), Arc::clone(e.value())))
            .collect();
        pair_rules.sort_by_key(|(key, _)| *key);

        let predicates = self.predicates.read();
        let mut rules = Vec::with_capacity(self.builtins.len() + 1 + pair_rules.len() + predicates.len());
        rules.extend(self.builtins.iter().cloned());
        rules.push(Arc::clone(&self.default));
        rules.extend(pair_rules.into_iter().map(|(_, rule)| rule));
        rules.extend(predicates.iter().cloned());
        rules
    }

    /// Make every user rule modifiable again.
    pub fn reset_compiled(&self) {
        for entry in self.pairs.iter() {
            entry.value().reset_compiled();
        }
        for rule in self.predicates.read().iter() {
            rule.reset_compiled();
        }
    }
}

impl Default for RuleTable {
    fn default() -> Self {
        Self::new(Settings::default())
    }
}
