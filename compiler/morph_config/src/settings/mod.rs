//! Mergeable mapping settings.
//!
//! A `Settings` value is the configuration one rule contributes. The
//! resolver folds the settings of every applicable rule, highest score
//! first, into one effective `Settings` for a `(TypePair, MapKind)`.
//!
//! # Merge
//!
//! - Singular fields: the first rule that sets a field wins.
//! - Collection fields: union. Lower-priority custom resolvers are placed
//!   before higher-priority ones, because the last registered resolver for
//!   a member is tried first.
//! - `no_inherit`: once a higher-priority rule sets it, per-pair fields stop
//!   flowing in from rules matched through inheritance.

use std::sync::Arc;

use morph_ir::{HostFn, MapKind, Name, TypeId, TypePair};
use morph_types::AccessSet;

use crate::adapter::AdapterKind;
use crate::expr::ValueExpr;
use crate::strategy::NameMatchingStrategy;

/// How enum values map onto another enum type.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum EnumMapping {
    /// Match variants by name.
    #[default]
    ByName,
    /// Match variants by discriminant.
    ByValue,
}

/// A per-member custom value.
#[derive(Clone, Debug, PartialEq)]
pub struct MemberResolver {
    pub member: Name,
    pub value: ValueExpr,
    /// Resolver applies only when this evaluates to `true`.
    pub condition: Option<ValueExpr>,
}

/// An ignored destination member, optionally only under a condition.
#[derive(Clone, Debug, PartialEq)]
pub struct IgnoredMember {
    pub member: Name,
    pub condition: Option<ValueExpr>,
}

/// Rules that apply only while mapping beneath the pair that declares them.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Fork {
    pub rules: Vec<(TypePair, Settings)>,
}

impl Fork {
    pub fn rule(&self, pair: TypePair) -> Option<&Settings> {
        self.rules
            .iter()
            .find(|(p, _)| *p == pair)
            .map(|(_, settings)| settings)
    }

    /// Settings for `pair`, created on first use.
    pub fn rule_mut(&mut self, pair: TypePair) -> &mut Settings {
        let index = match self.rules.iter().position(|(p, _)| *p == pair) {
            Some(index) => index,
            None => {
                self.rules.push((pair, Settings::default()));
                self.rules.len() - 1
            }
        };
        &mut self.rules[index].1
    }
}

/// Configuration contributed by one rule, or the effective result of folding
/// several.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Settings {
    // Per-pair fields
    pub ignored: Vec<IgnoredMember>,
    /// Members carrying any of these annotations are ignored.
    pub ignore_annotations: Vec<Name>,
    pub resolvers: Vec<MemberResolver>,
    /// Applied to every resolved value of the given destination type.
    pub transforms: Vec<(TypeId, ValueExpr)>,
    pub construct_using: Option<ValueExpr>,
    /// Whole-conversion overrides, indexed by [`MapKind::index`].
    pub converters: [Option<ValueExpr>; 3],
    pub after_mapping: Vec<HostFn>,
    pub fork: Option<Arc<Fork>>,
    pub inherits: Vec<TypePair>,
    pub no_inherit: Option<bool>,

    // Global fields
    pub ignore_null_values: Option<bool>,
    pub preserve_reference: Option<bool>,
    pub shallow_copy_for_same_type: Option<bool>,
    pub ignore_non_mapped: Option<bool>,
    pub require_destination_member_source: Option<bool>,
    pub name_matching: Option<NameMatchingStrategy>,
    pub enum_mapping: Option<EnumMapping>,
    pub visibility: Option<AccessSet>,
    pub max_depth: Option<u32>,
    /// Set only by built-in adapter rules.
    pub adapter: Option<AdapterKind>,
}

fn fill<T: Clone>(slot: &mut Option<T>, lower: &Option<T>) {
    if slot.is_none() {
        slot.clone_from(lower);
    }
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Settings of a built-in adapter rule.
    pub fn for_adapter(adapter: AdapterKind) -> Self {
        Settings {
            adapter: Some(adapter),
            ..Settings::default()
        }
    }

    /// Fold a lower-priority rule's settings into `self`.
    ///
    /// `inherited` marks rules matched through a base class, interface, or
    /// generic definition rather than the exact pair.
    pub fn merge_from(&mut self, lower: &Settings, inherited: bool) {
        fill(&mut self.ignore_null_values, &lower.ignore_null_values);
        fill(&mut self.preserve_reference, &lower.preserve_reference);
        fill(
            &mut self.shallow_copy_for_same_type,
            &lower.shallow_copy_for_same_type,
        );
        fill(&mut self.ignore_non_mapped, &lower.ignore_non_mapped);
        fill(
            &mut self.require_destination_member_source,
            &lower.require_destination_member_source,
        );
        fill(&mut self.name_matching, &lower.name_matching);
        fill(&mut self.enum_mapping, &lower.enum_mapping);
        fill(&mut self.visibility, &lower.visibility);
        fill(&mut self.max_depth, &lower.max_depth);
        fill(&mut self.adapter, &lower.adapter);

        if inherited && self.no_inherit() {
            return;
        }

        fill(&mut self.no_inherit, &lower.no_inherit);
        fill(&mut self.construct_using, &lower.construct_using);
        fill(&mut self.fork, &lower.fork);
        for (slot, theirs) in self.converters.iter_mut().zip(&lower.converters) {
            fill(slot, theirs);
        }

        // A member configured on one side of the priority order is not
        // overridden by the opposite configuration from a lower rule.
        let own_ignored: Vec<Name> = self.ignored.iter().map(|i| i.member).collect();
        for ignored in &lower.ignored {
            if !own_ignored.contains(&ignored.member) && !self.has_resolver(ignored.member) {
                self.ignored.push(ignored.clone());
            }
        }
        for &name in &lower.ignore_annotations {
            if !self.ignore_annotations.contains(&name) {
                self.ignore_annotations.push(name);
            }
        }
        for (ty, expr) in &lower.transforms {
            if !self.transforms.iter().any(|(t, _)| t == ty) {
                self.transforms.push((*ty, expr.clone()));
            }
        }
        for &pair in &lower.inherits {
            if !self.inherits.contains(&pair) {
                self.inherits.push(pair);
            }
        }

        let inherited_resolvers: Vec<MemberResolver> = lower
            .resolvers
            .iter()
            .filter(|r| !own_ignored.contains(&r.member) && !self.resolvers.contains(r))
            .cloned()
            .collect();
        self.resolvers = inherited_resolvers
            .into_iter()
            .chain(std::mem::take(&mut self.resolvers))
            .collect();

        let hooks: Vec<HostFn> = lower
            .after_mapping
            .iter()
            .filter(|h| !self.after_mapping.contains(h))
            .cloned()
            .collect();
        self.after_mapping = hooks
            .into_iter()
            .chain(std::mem::take(&mut self.after_mapping))
            .collect();
    }

    // === Effective values ===

    pub fn ignore_null_values(&self) -> bool {
        self.ignore_null_values.unwrap_or(false)
    }

    pub fn preserve_reference(&self) -> bool {
        self.preserve_reference.unwrap_or(false)
    }

    pub fn shallow_copy_for_same_type(&self) -> bool {
        self.shallow_copy_for_same_type.unwrap_or(false)
    }

    pub fn ignore_non_mapped(&self) -> bool {
        self.ignore_non_mapped.unwrap_or(false)
    }

    pub fn require_destination_member_source(&self) -> bool {
        self.require_destination_member_source.unwrap_or(false)
    }

    pub fn no_inherit(&self) -> bool {
        self.no_inherit.unwrap_or(false)
    }

    pub fn name_matching(&self) -> NameMatchingStrategy {
        self.name_matching
            .clone()
            .unwrap_or(NameMatchingStrategy::EXACT)
    }

    pub fn enum_mapping(&self) -> EnumMapping {
        self.enum_mapping.unwrap_or_default()
    }

    pub fn visibility(&self) -> AccessSet {
        self.visibility.unwrap_or_default()
    }

    pub fn converter(&self, kind: MapKind) -> Option<&ValueExpr> {
        self.converters[kind.index()].as_ref()
    }

    // === Member queries ===

    /// The ignore entry for a destination member, if any.
    pub fn ignored(&self, member: Name) -> Option<&IgnoredMember> {
        self.ignored.iter().find(|i| i.member == member)
    }

    /// Custom resolvers for a member, most recently registered first.
    pub fn resolvers_for(&self, member: Name) -> impl Iterator<Item = &MemberResolver> {
        self.resolvers.iter().rev().filter(move |r| r.member == member)
    }

    pub fn has_resolver(&self, member: Name) -> bool {
        self.resolvers.iter().any(|r| r.member == member)
    }

    pub fn transform_for(&self, ty: TypeId) -> Option<&ValueExpr> {
        self.transforms
            .iter()
            .find(|(t, _)| *t == ty)
            .map(|(_, expr)| expr)
    }

    // === Mutation ===

    pub fn ignore(&mut self, member: Name, condition: Option<ValueExpr>) {
        self.ignored.retain(|i| i.member != member);
        self.ignored.push(IgnoredMember { member, condition });
    }

    pub fn add_resolver(&mut self, member: Name, value: ValueExpr, condition: Option<ValueExpr>) {
        // An unconditional resolver replaces everything registered before it.
        if condition.is_none() {
            self.resolvers.retain(|r| r.member != member);
        }
        self.resolvers.push(MemberResolver {
            member,
            value,
            condition,
        });
    }

    pub fn set_transform(&mut self, ty: TypeId, expr: ValueExpr) {
        self.transforms.retain(|(t, _)| *t != ty);
        self.transforms.push((ty, expr));
    }

    pub fn set_converter(&mut self, kind: MapKind, expr: ValueExpr) {
        self.converters[kind.index()] = Some(expr);
    }

    /// Mutable fork overlay, created on first use.
    pub fn fork_mut(&mut self) -> &mut Fork {
        Arc::make_mut(self.fork.get_or_insert_with(Arc::default))
    }
}
