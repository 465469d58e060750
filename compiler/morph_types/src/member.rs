//! Uniform member, constructor, method, and annotation models.

use bitflags::bitflags;
use morph_ir::{HostFn, Name, TypeId, Value};

/// Declared accessibility of a member.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum AccessModifier {
    #[default]
    Public,
    Protected,
    Internal,
    Private,
}

impl AccessModifier {
    /// The single-bit set for this modifier.
    pub const fn as_set(self) -> AccessSet {
        match self {
            AccessModifier::Public => AccessSet::PUBLIC,
            AccessModifier::Protected => AccessSet::PROTECTED,
            AccessModifier::Internal => AccessSet::INTERNAL,
            AccessModifier::Private => AccessSet::PRIVATE,
        }
    }
}

bitflags! {
    /// Set of access modifiers a mapping considers.
    #[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
    pub struct AccessSet: u8 {
        const PUBLIC = 1 << 0;
        const PROTECTED = 1 << 1;
        const INTERNAL = 1 << 2;
        const PRIVATE = 1 << 3;
    }
}

impl Default for AccessSet {
    fn default() -> Self {
        AccessSet::PUBLIC
    }
}

/// What kind of slot a member is.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum MemberKind {
    Field,
    Property,
    /// Constructor parameter of a record-shaped type.
    CtorParam,
}

/// Metadata attached to a type or member.
#[derive(Clone, Debug, PartialEq)]
pub struct Annotation {
    pub name: Name,
    pub args: Vec<(Name, Value)>,
}

impl Annotation {
    pub fn new(name: Name) -> Self {
        Annotation {
            name,
            args: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_arg(mut self, key: Name, value: impl Into<Value>) -> Self {
        self.args.push((key, value.into()));
        self
    }

    pub fn arg(&self, key: Name) -> Option<&Value> {
        self.args.iter().find(|(k, _)| *k == key).map(|(_, v)| v)
    }
}

/// A named, typed slot of a host type.
#[derive(Clone, Debug, PartialEq)]
pub struct MemberModel {
    pub name: Name,
    pub ty: TypeId,
    pub access: AccessModifier,
    pub kind: MemberKind,
    pub readable: bool,
    pub writable: bool,
    pub annotations: Vec<Annotation>,
}

impl MemberModel {
    /// A public read/write field.
    pub fn field(name: Name, ty: TypeId) -> Self {
        MemberModel {
            name,
            ty,
            access: AccessModifier::Public,
            kind: MemberKind::Field,
            readable: true,
            writable: true,
            annotations: Vec::new(),
        }
    }

    /// A public read/write property.
    pub fn property(name: Name, ty: TypeId) -> Self {
        MemberModel {
            kind: MemberKind::Property,
            ..Self::field(name, ty)
        }
    }

    /// A public read-only property.
    pub fn readonly(name: Name, ty: TypeId) -> Self {
        MemberModel {
            writable: false,
            ..Self::property(name, ty)
        }
    }

    /// A constructor parameter.
    pub fn param(name: Name, ty: TypeId) -> Self {
        MemberModel {
            kind: MemberKind::CtorParam,
            readable: false,
            writable: true,
            ..Self::field(name, ty)
        }
    }

    #[must_use]
    pub fn with_access(mut self, access: AccessModifier) -> Self {
        self.access = access;
        self
    }

    #[must_use]
    pub fn annotated(mut self, annotation: Annotation) -> Self {
        self.annotations.push(annotation);
        self
    }

    pub fn annotation(&self, name: Name) -> Option<&Annotation> {
        self.annotations.iter().find(|a| a.name == name)
    }

    #[inline]
    pub fn is_visible(&self, visibility: AccessSet) -> bool {
        visibility.contains(self.access.as_set())
    }
}

/// A constructor of a host type.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ConstructorModel {
    pub params: Vec<MemberModel>,
}

impl ConstructorModel {
    pub fn is_default(&self) -> bool {
        self.params.is_empty()
    }
}

/// A zero-argument instance method. The host function receives the
/// receiver as its only argument.
#[derive(Clone, Debug, PartialEq)]
pub struct MethodModel {
    pub name: Name,
    pub returns: TypeId,
    pub func: HostFn,
}
