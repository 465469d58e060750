//! Fluent rule configuration.
//!
//! ```ignore
//! mapper
//!     .for_type(TypePair::new(person, dto))?
//!     .ignore(&["Secret"])?
//!     .map("FullName", mapper.path("Name"))?
//!     .name_matching(NameMatchingStrategy::FLEXIBLE)?
//!     .fork(|fork| {
//!         fork.for_type(TypePair::new(address, address_dto)).ignore(&["Zip"])?;
//!         Ok(())
//!     })?;
//! ```
//!
//! Every edit of a table rule checks that no compiled function consumed it
//! yet, so a setter kept across a compilation fails instead of diverging
//! from the functions already built.

use std::sync::Arc;

use morph_config::{
    display_pair, ConfigError, EnumMapping, Fork, NameMatchingStrategy, Rule, RuleOrigin,
    Settings, ValueExpr,
};
use morph_ir::{HostFn, MapKind, TypeId, TypePair};
use morph_types::{AccessSet, TypeRegistry};

use crate::mapper::Mapper;

/// What a setter writes into.
enum Slot<'a> {
    /// A rule of the mapper's table.
    Rule { mapper: &'a Mapper, rule: Arc<Rule> },
    /// A rule inside a fork overlay being assembled.
    Overlay(&'a mut Settings),
}

/// Builder over one rule's settings. Every method applies immediately, so
/// the setter may be dropped at any point. Edits fail with
/// [`ConfigError::RuleAlreadyCompiled`] once a compiled function consumed
/// the rule.
pub struct TypeAdapterSetter<'a> {
    registry: &'a TypeRegistry,
    slot: Slot<'a>,
}

impl<'a> TypeAdapterSetter<'a> {
    pub(crate) fn for_rule(mapper: &'a Mapper, rule: Arc<Rule>) -> Self {
        TypeAdapterSetter {
            registry: mapper.registry(),
            slot: Slot::Rule { mapper, rule },
        }
    }

    fn edit(
        mut self,
        f: impl FnOnce(&mut Settings, &TypeRegistry),
    ) -> Result<Self, ConfigError> {
        match &mut self.slot {
            Slot::Rule { mapper, rule } => {
                let pair = match rule.origin() {
                    RuleOrigin::Pair(pair) => Some(pair),
                    _ => None,
                };
                {
                    let mut settings = rule.settings_mut();
                    if rule.is_compiled() {
                        let described = pair.map_or_else(
                            || "a predicate".to_owned(),
                            |pair| display_pair(self.registry, pair),
                        );
                        return Err(ConfigError::RuleAlreadyCompiled { pair: described });
                    }
                    f(&mut settings, self.registry);
                }
                mapper.configuration_changed(pair);
            }
            Slot::Overlay(settings) => f(settings, self.registry),
        }
        Ok(self)
    }

    // === Members ===

    /// Never map these destination members.
    pub fn ignore(self, members: &[&str]) -> Result<Self, ConfigError> {
        self.edit(|s, registry| {
            for member in members {
                s.ignore(registry.name(member), None);
            }
        })
    }

    /// Skip these destination members when `condition` holds.
    pub fn ignore_if(self, condition: ValueExpr, members: &[&str]) -> Result<Self, ConfigError> {
        self.edit(|s, registry| {
            for member in members {
                s.ignore(registry.name(member), Some(condition.clone()));
            }
        })
    }

    /// Ignore destination members carrying the named annotation.
    pub fn ignore_annotated(self, annotation: &str) -> Result<Self, ConfigError> {
        self.edit(|s, registry| {
            let name = registry.name(annotation);
            if !s.ignore_annotations.contains(&name) {
                s.ignore_annotations.push(name);
            }
        })
    }

    /// Compute `member` from `value`, replacing earlier resolvers for it.
    pub fn map(self, member: &str, value: ValueExpr) -> Result<Self, ConfigError> {
        self.edit(|s, registry| s.add_resolver(registry.name(member), value, None))
    }

    /// Compute `member` from `value` when `condition` holds. Conditional
    /// resolvers are tried most recently registered first.
    pub fn map_if(self, member: &str, value: ValueExpr, condition: ValueExpr) -> Result<Self, ConfigError> {
        self.edit(|s, registry| s.add_resolver(registry.name(member), value, Some(condition)))
    }

    /// Apply `value` to every resolved value of destination type `ty`.
    /// Inside `value`, `ValueExpr::Arg` is the resolved value.
    pub fn transform(self, ty: TypeId, value: ValueExpr) -> Result<Self, ConfigError> {
        self.edit(|s, _| s.set_transform(ty, value))
    }

    // === Construction and conversion ===

    /// Build the destination with `value` instead of its default
    /// constructor.
    pub fn construct_using(self, value: ValueExpr) -> Result<Self, ConfigError> {
        self.edit(|s, _| s.construct_using = Some(value))
    }

    /// Replace the whole conversion for `kind` with `value`.
    pub fn map_with(self, kind: MapKind, value: ValueExpr) -> Result<Self, ConfigError> {
        self.edit(|s, _| s.set_converter(kind, value))
    }

    /// Host function called with `(source, destination)` after the
    /// destination is populated.
    pub fn after_mapping(self, hook: HostFn) -> Result<Self, ConfigError> {
        self.edit(|s, _| s.after_mapping.push(hook))
    }

    // === Inheritance ===

    /// Also apply the settings of the rule registered for `pair`.
    pub fn inherits(self, pair: TypePair) -> Result<Self, ConfigError> {
        self.edit(|s, _| {
            if !s.inherits.contains(&pair) {
                s.inherits.push(pair);
            }
        })
    }

    /// Stop per-pair settings from flowing in through base types.
    pub fn no_inherit(self, value: bool) -> Result<Self, ConfigError> {
        self.edit(|s, _| s.no_inherit = Some(value))
    }

    /// Rules that apply only while mapping beneath this pair. The overlay
    /// is stored only when `configure` succeeds.
    pub fn fork(
        self,
        configure: impl FnOnce(&mut ForkSetter<'_>) -> Result<(), ConfigError>,
    ) -> Result<Self, ConfigError> {
        let registry = self.registry;
        let mut configured = Ok(());
        let setter = self.edit(|s, _| {
            let mut overlay = s.fork.as_deref().cloned().unwrap_or_default();
            configured = configure(&mut ForkSetter {
                registry,
                fork: &mut overlay,
            });
            if configured.is_ok() {
                s.fork = Some(Arc::new(overlay));
            }
        })?;
        configured.map(|()| setter)
    }

    // === Flags ===

    pub fn name_matching(self, strategy: NameMatchingStrategy) -> Result<Self, ConfigError> {
        self.edit(|s, _| s.name_matching = Some(strategy))
    }

    /// Leave destination members untouched when the source value is null.
    pub fn ignore_null_values(self, value: bool) -> Result<Self, ConfigError> {
        self.edit(|s, _| s.ignore_null_values = Some(value))
    }

    /// Map each source instance once per call, reusing its destination.
    pub fn preserve_reference(self, value: bool) -> Result<Self, ConfigError> {
        self.edit(|s, _| s.preserve_reference = Some(value))
    }

    /// Bound inlining of cyclic types to `depth` nested levels.
    pub fn max_depth(self, depth: u32) -> Result<Self, ConfigError> {
        self.edit(|s, _| s.max_depth = Some(depth))
    }

    /// Fail compilation when a writable destination member has no source.
    pub fn require_destination_member_source(self, value: bool) -> Result<Self, ConfigError> {
        self.edit(|s, _| s.require_destination_member_source = Some(value))
    }

    /// Identical source and destination types copy the reference.
    pub fn shallow_copy_for_same_type(self, value: bool) -> Result<Self, ConfigError> {
        self.edit(|s, _| s.shallow_copy_for_same_type = Some(value))
    }

    pub fn enum_mapping(self, mapping: EnumMapping) -> Result<Self, ConfigError> {
        self.edit(|s, _| s.enum_mapping = Some(mapping))
    }

    /// Map only members with an explicit resolver.
    pub fn ignore_non_mapped(self, value: bool) -> Result<Self, ConfigError> {
        self.edit(|s, _| s.ignore_non_mapped = Some(value))
    }

    /// Access levels of members considered on both sides.
    pub fn visibility(self, levels: AccessSet) -> Result<Self, ConfigError> {
        self.edit(|s, _| s.visibility = Some(levels))
    }
}

/// Configures the overlay rules of a fork.
pub struct ForkSetter<'a> {
    registry: &'a TypeRegistry,
    fork: &'a mut Fork,
}

impl ForkSetter<'_> {
    /// Settings for `pair` while beneath the forking pair. Overlay edits
    /// never fail; they share the table setter's signature.
    pub fn for_type(&mut self, pair: TypePair) -> TypeAdapterSetter<'_> {
        TypeAdapterSetter {
            registry: self.registry,
            slot: Slot::Overlay(self.fork.rule_mut(pair)),
        }
    }
}
