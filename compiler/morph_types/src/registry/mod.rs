//! Registry of host types.
//!
//! The `TypeRegistry` is the mapper's only view of the host type system:
//! the host registers classes, records, enums, collections, and their
//! members, and every later stage reads it immutably through an `Arc`.
//!
//! # Design
//!
//! - Dense indexing: `entries[TypeId::index()]`, builtins pre-registered
//! - Name index: `FxHashMap<Name, TypeId>` for lookup by interned name
//! - Flattened member lists (own plus inherited) are computed once per type
//!   and cached behind a lock, so lookups stay `&self`

use std::sync::Arc;

use morph_ir::{Name, SharedInterner, TypeId, Value};
use parking_lot::RwLock;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::builder::ClassBuilder;
use crate::entry::{ClassDef, EnumVariant, GenericInstance, TypeEntry, TypeKind};
use crate::member::{Annotation, ConstructorModel, MemberKind, MemberModel, MethodModel};

/// Error registering a host type.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("type `{0}` is already registered")]
    DuplicateType(String),

    #[error("type `{name}` refers to unregistered type {referenced:?}")]
    UnknownType { name: String, referenced: TypeId },

    #[error("type `{name}` cannot derive from non-class type `{base}`")]
    InvalidBase { name: String, base: String },
}

/// Registry of host types.
#[derive(Debug)]
pub struct TypeRegistry {
    interner: SharedInterner,
    entries: Vec<TypeEntry>,
    by_name: FxHashMap<Name, TypeId>,
    /// Declared ahead of registration; the next registration fills them.
    pending: FxHashSet<TypeId>,
    /// Flattened member lists, filled on first request.
    member_cache: RwLock<FxHashMap<TypeId, Arc<[MemberModel]>>>,
}

impl TypeRegistry {
    /// Create a registry with the builtin types pre-registered.
    pub fn new() -> Self {
        Self::with_interner(SharedInterner::new())
    }

    /// Create a registry sharing an existing interner.
    pub fn with_interner(interner: SharedInterner) -> Self {
        let mut registry = TypeRegistry {
            interner,
            entries: Vec::with_capacity(64),
            by_name: FxHashMap::default(),
            pending: FxHashSet::default(),
            member_cache: RwLock::new(FxHashMap::default()),
        };
        for id in TypeId::BUILTINS {
            let name = registry
                .interner
                .intern(id.builtin_name().unwrap_or_default());
            let kind = if id == TypeId::OBJECT {
                TypeKind::Object
            } else {
                TypeKind::Primitive
            };
            registry.push_entry(name, kind, None, Vec::new(), None, Vec::new());
        }
        registry
    }

    #[inline]
    pub fn interner(&self) -> &SharedInterner {
        &self.interner
    }

    /// Intern a name in this registry's interner.
    #[inline]
    pub fn name(&self, s: &str) -> Name {
        self.interner.intern(s)
    }

    /// Text of an interned name.
    #[inline]
    pub fn text(&self, name: Name) -> &str {
        self.interner.lookup(name)
    }

    /// An annotation with the given name and no arguments.
    pub fn annotation(&self, name: &str) -> Annotation {
        Annotation::new(self.name(name))
    }

    // === Registration ===

    /// Start registering a class or record.
    pub fn class(&mut self, name: &str) -> ClassBuilder<'_> {
        ClassBuilder::new(self, name)
    }

    /// Reserve the id of a class registered later, so self-referential
    /// and mutually referential members can name it.
    pub fn declare(&mut self, name: &str) -> Result<TypeId, RegistryError> {
        let interned = self.name(name);
        if let Some(&id) = self.by_name.get(&interned) {
            return if self.pending.contains(&id) {
                Ok(id)
            } else {
                Err(RegistryError::DuplicateType(name.to_owned()))
            };
        }
        let id = self.push_entry(
            interned,
            TypeKind::Class(ClassDef::default()),
            None,
            Vec::new(),
            None,
            Vec::new(),
        );
        self.pending.insert(id);
        Ok(id)
    }

    pub fn register_enum(
        &mut self,
        name: &str,
        variants: &[(&str, i64)],
    ) -> Result<TypeId, RegistryError> {
        let variants = variants
            .iter()
            .map(|&(variant, discriminant)| EnumVariant {
                name: self.name(variant),
                discriminant,
            })
            .collect();
        self.register(name, TypeKind::Enum { variants }, None, Vec::new(), None)
    }

    pub fn register_interface(&mut self, name: &str) -> Result<TypeId, RegistryError> {
        self.register(name, TypeKind::Interface, None, Vec::new(), None)
    }

    pub fn register_collection(
        &mut self,
        name: &str,
        element: TypeId,
    ) -> Result<TypeId, RegistryError> {
        self.check_known(name, element)?;
        self.register(name, TypeKind::Collection { element }, None, Vec::new(), None)
    }

    pub fn register_dictionary(
        &mut self,
        name: &str,
        key: TypeId,
        value: TypeId,
    ) -> Result<TypeId, RegistryError> {
        self.check_known(name, key)?;
        self.check_known(name, value)?;
        self.register(name, TypeKind::Dictionary { key, value }, None, Vec::new(), None)
    }

    /// Register an open generic definition such as `Page<>`.
    pub fn register_generic_definition(
        &mut self,
        name: &str,
        arity: u32,
    ) -> Result<TypeId, RegistryError> {
        self.register(name, TypeKind::GenericDefinition { arity }, None, Vec::new(), None)
    }

    /// `element[]`, registered on first use.
    pub fn array_of(&mut self, element: TypeId) -> Result<TypeId, RegistryError> {
        let name = format!("{}[]", self.type_name(element));
        self.get_or_register(&name, element, TypeKind::Array { element })
    }

    /// `element[,...]` of the given rank, registered on first use.
    pub fn multi_array_of(&mut self, element: TypeId, rank: u32) -> Result<TypeId, RegistryError> {
        let commas = ",".repeat(rank.saturating_sub(1) as usize);
        let name = format!("{}[{commas}]", self.type_name(element));
        self.get_or_register(&name, element, TypeKind::MultiArray { element, rank })
    }

    /// `inner?`, registered on first use. Nullable of nullable is the inner
    /// nullable itself.
    pub fn nullable_of(&mut self, inner: TypeId) -> Result<TypeId, RegistryError> {
        if self.is_nullable(inner) {
            return Ok(inner);
        }
        let name = format!("{}?", self.type_name(inner));
        self.get_or_register(&name, inner, TypeKind::Nullable { inner })
    }

    fn get_or_register(
        &mut self,
        name: &str,
        referenced: TypeId,
        kind: TypeKind,
    ) -> Result<TypeId, RegistryError> {
        if let Some(id) = self.by_name(name) {
            return Ok(id);
        }
        self.check_known(name, referenced)?;
        self.register(name, kind, None, Vec::new(), None)
    }

    pub(crate) fn register(
        &mut self,
        name: &str,
        kind: TypeKind,
        base: Option<TypeId>,
        interfaces: Vec<TypeId>,
        generic: Option<GenericInstance>,
    ) -> Result<TypeId, RegistryError> {
        self.register_annotated(name, kind, base, interfaces, generic, Vec::new())
    }

    pub(crate) fn register_annotated(
        &mut self,
        name: &str,
        kind: TypeKind,
        base: Option<TypeId>,
        interfaces: Vec<TypeId>,
        generic: Option<GenericInstance>,
        annotations: Vec<Annotation>,
    ) -> Result<TypeId, RegistryError> {
        let interned = self.name(name);
        let declared = match self.by_name.get(&interned) {
            Some(id) if self.pending.contains(id) => Some(*id),
            Some(_) => return Err(RegistryError::DuplicateType(name.to_owned())),
            None => None,
        };
        if let Some(base) = base {
            self.check_known(name, base)?;
            if !self.kind(base).is_some_and(TypeKind::is_class) {
                return Err(RegistryError::InvalidBase {
                    name: name.to_owned(),
                    base: self.type_name(base).to_owned(),
                });
            }
        }
        for &iface in &interfaces {
            self.check_known(name, iface)?;
        }
        if let Some(generic) = &generic {
            self.check_known(name, generic.definition)?;
        }
        let id = match declared {
            Some(id) => {
                self.pending.remove(&id);
                self.entries[id.index()] = TypeEntry {
                    name: interned,
                    id,
                    kind,
                    base,
                    interfaces,
                    generic,
                    annotations,
                };
                self.member_cache.write().remove(&id);
                id
            }
            None => self.push_entry(interned, kind, base, interfaces, generic, annotations),
        };
        tracing::trace!(?id, name, "registered type");
        Ok(id)
    }

    fn push_entry(
        &mut self,
        name: Name,
        kind: TypeKind,
        base: Option<TypeId>,
        interfaces: Vec<TypeId>,
        generic: Option<GenericInstance>,
        annotations: Vec<Annotation>,
    ) -> TypeId {
        let Ok(raw) = u32::try_from(self.entries.len()) else {
            panic!("type registry exceeded u32 entries");
        };
        let id = TypeId::new(raw);
        self.entries.push(TypeEntry {
            name,
            id,
            kind,
            base,
            interfaces,
            generic,
            annotations,
        });
        self.by_name.insert(name, id);
        id
    }

    fn check_known(&self, name: &str, referenced: TypeId) -> Result<(), RegistryError> {
        if self.get(referenced).is_some() {
            Ok(())
        } else {
            Err(RegistryError::UnknownType {
                name: name.to_owned(),
                referenced,
            })
        }
    }

    // === Lookup ===

    #[inline]
    pub fn get(&self, id: TypeId) -> Option<&TypeEntry> {
        self.entries.get(id.index())
    }

    #[inline]
    pub fn kind(&self, id: TypeId) -> Option<&TypeKind> {
        self.get(id).map(|e| &e.kind)
    }

    pub fn by_name(&self, name: &str) -> Option<TypeId> {
        self.by_name.get(&self.interner.intern(name)).copied()
    }

    /// Display name of a type; `?` for unregistered IDs.
    pub fn type_name(&self, id: TypeId) -> &str {
        self.get(id).map_or("?", |e| self.interner.lookup(e.name))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Flattened members of a class: base members first, each overridden in
    /// place by a same-named member of a derived type. Empty for non-classes.
    pub fn members(&self, id: TypeId) -> Arc<[MemberModel]> {
        if let Some(cached) = self.member_cache.read().get(&id) {
            return Arc::clone(cached);
        }
        let flattened: Arc<[MemberModel]> = self.flatten_members(id).into();
        self.member_cache
            .write()
            .entry(id)
            .or_insert(flattened)
            .clone()
    }

    fn flatten_members(&self, id: TypeId) -> Vec<MemberModel> {
        let mut chain: Vec<&ClassDef> = self
            .base_chain(id)
            .filter_map(|t| self.kind(t).and_then(TypeKind::class_def))
            .collect();
        chain.reverse();

        let mut members: Vec<MemberModel> = Vec::new();
        for def in chain {
            for member in &def.members {
                match members.iter_mut().find(|m| m.name == member.name) {
                    Some(slot) => *slot = member.clone(),
                    None => members.push(member.clone()),
                }
            }
        }
        members
    }

    pub fn member(&self, id: TypeId, name: Name) -> Option<MemberModel> {
        self.members(id).iter().find(|m| m.name == name).cloned()
    }

    /// Declared constructors. An empty list means an implicit default
    /// constructor.
    pub fn constructors(&self, id: TypeId) -> &[ConstructorModel] {
        match self.kind(id) {
            Some(TypeKind::Class(def)) => &def.constructors,
            _ => &[],
        }
    }

    /// Find a method on the type or any base class.
    pub fn method(&self, id: TypeId, name: Name) -> Option<&MethodModel> {
        self.base_chain(id)
            .filter_map(|t| self.kind(t).and_then(TypeKind::class_def))
            .find_map(|def| def.methods.iter().find(|m| m.name == name))
    }

    pub fn enum_variants(&self, id: TypeId) -> &[EnumVariant] {
        match self.kind(id) {
            Some(TypeKind::Enum { variants }) => variants,
            _ => &[],
        }
    }

    // === Relationships ===

    /// The type followed by its base classes, nearest first.
    pub fn base_chain(&self, id: TypeId) -> impl Iterator<Item = TypeId> + '_ {
        std::iter::successors(self.get(id).map(|e| e.id), |&t| {
            self.get(t).and_then(|e| e.base)
        })
    }

    /// Number of base-class steps from `from` up to `to`; `Some(0)` when equal.
    pub fn inheritance_distance(&self, from: TypeId, to: TypeId) -> Option<u32> {
        self.base_chain(from)
            .position(|t| t == to)
            .and_then(|d| u32::try_from(d).ok())
    }

    /// Returns `true` if `id` or one of its bases declares `interface`.
    pub fn implements(&self, id: TypeId, interface: TypeId) -> bool {
        self.base_chain(id)
            .filter_map(|t| self.get(t))
            .any(|e| e.interfaces.contains(&interface))
    }

    /// The open generic definition this type instantiates.
    pub fn generic_definition(&self, id: TypeId) -> Option<TypeId> {
        self.get(id)
            .and_then(|e| e.generic.as_ref())
            .map(|g| g.definition)
    }

    // === Shape queries ===

    pub fn is_nullable(&self, id: TypeId) -> bool {
        matches!(self.kind(id), Some(TypeKind::Nullable { .. }))
    }

    /// `inner` for `inner?`, else the type itself.
    pub fn unwrap_nullable(&self, id: TypeId) -> TypeId {
        match self.kind(id) {
            Some(TypeKind::Nullable { inner }) => *inner,
            _ => id,
        }
    }

    /// Builtin scalar (other than `object`), after unwrapping nullable.
    pub fn is_primitive(&self, id: TypeId) -> bool {
        self.unwrap_nullable(id).is_builtin_scalar()
    }

    pub fn is_enum(&self, id: TypeId) -> bool {
        self.kind(self.unwrap_nullable(id))
            .is_some_and(TypeKind::is_enum)
    }

    pub fn is_class(&self, id: TypeId) -> bool {
        self.kind(id).is_some_and(TypeKind::is_class)
    }

    /// Class with at least one writable member.
    pub fn has_writable_members(&self, id: TypeId) -> bool {
        self.is_class(id)
            && self
                .members(id)
                .iter()
                .any(|m| m.writable && m.kind != MemberKind::CtorParam)
    }

    /// Class without writable members that declares a parameterized
    /// constructor.
    pub fn is_record_shaped(&self, id: TypeId) -> bool {
        self.is_class(id)
            && !self.has_writable_members(id)
            && self.constructors(id).iter().any(|c| !c.is_default())
    }

    pub fn is_value_type(&self, id: TypeId) -> bool {
        match self.kind(id) {
            Some(TypeKind::Primitive) => id != TypeId::STR,
            Some(TypeKind::Enum { .. }) => true,
            Some(TypeKind::Class(def)) => def.value_type,
            _ => false,
        }
    }

    // === Values ===

    /// Type-appropriate zero value: `0`, `false`, `'\0'`, the zero enum
    /// variant, a zeroed value-type instance, or `Null` for reference types.
    pub fn default_value(&self, id: TypeId) -> Value {
        match self.kind(id) {
            Some(TypeKind::Primitive) => match id {
                TypeId::BOOL => Value::Bool(false),
                TypeId::INT => Value::Int(0),
                TypeId::FLOAT => Value::Float(0.0),
                TypeId::CHAR => Value::Char('\0'),
                TypeId::TIMESTAMP => Value::Timestamp(0),
                _ => Value::Null,
            },
            Some(TypeKind::Enum { variants }) => variants
                .iter()
                .find(|v| v.discriminant == 0)
                .or_else(|| variants.first())
                .map_or(Value::Null, |v| Value::enum_variant(id, v.name, v.discriminant)),
            Some(TypeKind::Class(def)) if def.value_type => self.instantiate(id),
            _ => Value::Null,
        }
    }

    /// A fresh default-constructed instance: an object with every member at
    /// its default value, or an empty collection, dictionary, or array.
    pub fn instantiate(&self, id: TypeId) -> Value {
        match self.kind(id) {
            Some(TypeKind::Class(_)) => Value::object(
                id,
                self.members(id)
                    .iter()
                    .filter(|m| m.kind != MemberKind::CtorParam)
                    .map(|m| (m.name, self.default_value(m.ty))),
            ),
            Some(TypeKind::Collection { .. } | TypeKind::Array { .. }) => {
                Value::list(id, Vec::new())
            }
            Some(TypeKind::Dictionary { .. }) => Value::dict(id, Vec::new()),
            Some(TypeKind::MultiArray { rank, .. }) => {
                Value::grid(id, vec![0; *rank as usize], Vec::new())
            }
            _ => self.default_value(id),
        }
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests;
