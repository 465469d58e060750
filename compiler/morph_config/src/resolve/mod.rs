//! Settings resolution.
//!
//! For a `(TypePair, MapKind)`, score every rule, order the applicable ones
//! by score (highest first), and fold their settings into one effective
//! [`Settings`]. Ties between rules of the same pair favor the narrower kind
//! set; ties between rules of different pairs at the top are an error.

mod metadata;

use std::sync::Arc;

use morph_ir::{MapKind, TypePair};
use morph_types::TypeRegistry;
use rustc_hash::FxHashSet;

use crate::adapter::AdapterKind;
use crate::errors::{display_pair, ConfigError};
use crate::options::MapperOptions;
use crate::rule::{Rule, RuleContext, RuleOrigin, METADATA_SCORE};
use crate::settings::{Fork, Settings};
use crate::table::RuleTable;

pub use metadata::{metadata_settings, ADAPT_IGNORE, ADAPT_MEMBER, ADAPT_SETTINGS};

/// Effective settings for one pair and kind.
#[derive(Clone, Debug)]
pub struct Resolution {
    pub pair: TypePair,
    pub kind: MapKind,
    pub settings: Settings,
    /// User rules that contributed; frozen once the pair compiles.
    pub consumed: Vec<Arc<Rule>>,
    /// A rule is registered for exactly this pair.
    pub explicit: bool,
}

impl Resolution {
    /// Freeze every consumed user rule.
    pub fn mark_consumed(&self) {
        for rule in &self.consumed {
            rule.mark_compiled();
        }
    }
}

/// Inputs shared by every resolution of one mapper.
#[derive(Copy, Clone)]
pub struct Resolver<'a> {
    pub table: &'a RuleTable,
    pub registry: &'a TypeRegistry,
    pub options: &'a MapperOptions,
}

impl<'a> Resolver<'a> {
    pub fn new(table: &'a RuleTable, registry: &'a TypeRegistry, options: &'a MapperOptions) -> Self {
        Resolver {
            table,
            registry,
            options,
        }
    }

    /// Resolve the effective settings for `pair` and `kind`.
    ///
    /// `fork` holds overlay rules from an enclosing pair; its rule for
    /// `pair`, if any, outranks every table rule.
    #[tracing::instrument(level = "debug", skip_all, fields(pair = ?pair, kind = ?kind))]
    pub fn resolve(
        &self,
        pair: TypePair,
        kind: MapKind,
        fork: Option<&Fork>,
    ) -> Result<Resolution, ConfigError> {
        let explicit = self.table.is_explicit(pair, kind);
        let ctx = RuleContext {
            pair,
            kind,
            explicit,
            registry: self.registry,
            options: self.options,
        };

        let mut scored: Vec<(i32, Arc<Rule>)> = self
            .table
            .candidates()
            .into_iter()
            .filter_map(|rule| rule.score(&ctx).map(|score| (score, rule)))
            .collect();
        // Stable: equal keys keep table order.
        scored.sort_by(|(a, ra), (b, rb)| {
            b.cmp(a)
                .then_with(|| ra.kinds().bits().count_ones().cmp(&rb.kinds().bits().count_ones()))
        });
        self.check_ambiguity(pair, &scored)?;

        let mut fold = Fold {
            resolver: self,
            pair,
            kind,
            settings: Settings::default(),
            consumed: Vec::new(),
            visited: FxHashSet::default(),
        };

        if let Some(overlay) = fork.and_then(|f| f.rule(pair)) {
            fold.settings.merge_from(overlay, false);
        }

        let mut metadata = if explicit {
            None
        } else {
            metadata_settings(self.registry, pair)
        };
        for (score, rule) in &scored {
            if *score < METADATA_SCORE {
                if let Some(declared) = metadata.take() {
                    fold.settings.merge_from(&declared, false);
                }
            }
            let inherited = matches!(rule.origin(), RuleOrigin::Pair(p) if p != pair);
            fold.rule(rule, inherited);
        }
        if let Some(declared) = metadata {
            fold.settings.merge_from(&declared, false);
        }

        let Fold {
            settings, consumed, ..
        } = fold;

        if self.options.require_explicit_mapping
            && consumed.is_empty()
            && matches!(settings.adapter, Some(AdapterKind::Class | AdapterKind::Record))
        {
            return Err(ConfigError::UnregisteredPair {
                pair: display_pair(self.registry, pair),
            });
        }

        tracing::debug!(
            rules = scored.len(),
            consumed = consumed.len(),
            adapter = ?settings.adapter,
            "resolved settings"
        );
        Ok(Resolution {
            pair,
            kind,
            settings,
            consumed,
            explicit,
        })
    }

    /// Two different pairs tying for the top pair-rule score is ambiguous.
    fn check_ambiguity(&self, pair: TypePair, scored: &[(i32, Arc<Rule>)]) -> Result<(), ConfigError> {
        let mut pair_rules = scored.iter().filter_map(|(score, rule)| match rule.origin() {
            RuleOrigin::Pair(p) => Some((*score, p)),
            _ => None,
        });
        let Some((top, first)) = pair_rules.next() else {
            return Ok(());
        };
        match pair_rules.find(|&(score, p)| score == top && p != first) {
            Some((_, second)) => Err(ConfigError::AmbiguousRules {
                pair: display_pair(self.registry, pair),
                first: display_pair(self.registry, first),
                second: display_pair(self.registry, second),
                score: top,
            }),
            None => Ok(()),
        }
    }
}

/// Accumulator for one resolution.
struct Fold<'r, 'a> {
    resolver: &'r Resolver<'a>,
    pair: TypePair,
    kind: MapKind,
    settings: Settings,
    consumed: Vec<Arc<Rule>>,
    visited: FxHashSet<usize>,
}

impl Fold<'_, '_> {
    /// Merge one rule, then any rules it names through `inherits`.
    fn rule(&mut self, rule: &Arc<Rule>, inherited: bool) {
        let key = Arc::as_ptr(rule) as usize;
        if !self.visited.insert(key) {
            return;
        }
        let blocked = inherited && self.settings.no_inherit();

        let inherits = {
            let declared = rule.settings();
            self.settings.merge_from(&declared, inherited);
            if blocked {
                Vec::new()
            } else {
                declared.inherits.clone()
            }
        };
        if rule.origin().is_user() && !blocked {
            self.consumed.push(Arc::clone(rule));
        }

        for base in inherits {
            if base == self.pair {
                continue;
            }
            for named in self.resolver.table.exact_rules(base, self.kind) {
                self.rule(&named, false);
            }
        }
    }
}
