//! Registered type definitions.

use morph_ir::{Name, TypeId};

use crate::member::{Annotation, ConstructorModel, MemberModel, MethodModel};

/// A registered type.
#[derive(Clone, Debug, PartialEq)]
pub struct TypeEntry {
    pub name: Name,
    pub id: TypeId,
    pub kind: TypeKind,
    /// Direct base class.
    pub base: Option<TypeId>,
    /// Directly implemented interfaces.
    pub interfaces: Vec<TypeId>,
    /// Set when this type is an instantiation of a generic definition.
    pub generic: Option<GenericInstance>,
    pub annotations: Vec<Annotation>,
}

impl TypeEntry {
    pub fn annotation(&self, name: Name) -> Option<&Annotation> {
        self.annotations.iter().find(|a| a.name == name)
    }
}

/// `definition<args...>`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct GenericInstance {
    pub definition: TypeId,
    pub args: Vec<TypeId>,
}

/// An enum variant with its discriminant.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct EnumVariant {
    pub name: Name,
    pub discriminant: i64,
}

/// Members, constructors, and methods of a class or record.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ClassDef {
    /// Members declared on this type (inherited members not included).
    pub members: Vec<MemberModel>,
    pub constructors: Vec<ConstructorModel>,
    pub methods: Vec<MethodModel>,
    /// Value types default to a zero instance instead of null.
    pub value_type: bool,
}

/// The shape of a registered type.
#[derive(Clone, Debug, PartialEq)]
pub enum TypeKind {
    /// The dynamic top type; values are dispatched on their runtime type.
    Object,
    /// A builtin scalar.
    Primitive,
    Enum { variants: Vec<EnumVariant> },
    /// Classes and records.
    Class(ClassDef),
    /// Member-less marker implemented by classes.
    Interface,
    /// Growable sequence.
    Collection { element: TypeId },
    Dictionary { key: TypeId, value: TypeId },
    /// Fixed single-dimensional array.
    Array { element: TypeId },
    MultiArray { element: TypeId, rank: u32 },
    /// `inner?` for value types.
    Nullable { inner: TypeId },
    /// Open generic definition such as `Page<>`; never instantiated itself.
    GenericDefinition { arity: u32 },
}

impl TypeKind {
    #[inline]
    pub fn is_class(&self) -> bool {
        matches!(self, TypeKind::Class(_))
    }

    #[inline]
    pub fn is_enum(&self) -> bool {
        matches!(self, TypeKind::Enum { .. })
    }

    /// Element type of a collection or array of any rank.
    pub fn element(&self) -> Option<TypeId> {
        match self {
            TypeKind::Collection { element }
            | TypeKind::Array { element }
            | TypeKind::MultiArray { element, .. } => Some(*element),
            _ => None,
        }
    }

    pub fn class_def(&self) -> Option<&ClassDef> {
        match self {
            TypeKind::Class(def) => Some(def),
            _ => None,
        }
    }
}
