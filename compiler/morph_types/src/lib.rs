//! Morph Types - the host type model.
//!
//! The mapper never inspects host types directly. The host describes its
//! classes, records, enums, and collections to a [`TypeRegistry`], and the
//! configuration, builder, and evaluator crates read that description.
//!
//! # Module Organization
//!
//! - `registry`: the registry itself, relationship and shape queries, default values
//! - `entry`: `TypeEntry` / `TypeKind` definitions
//! - `member`: `MemberModel`, constructors, methods, annotations, access sets
//! - `builder`: fluent class registration

mod builder;
mod entry;
mod member;
mod registry;

pub use builder::ClassBuilder;
pub use entry::{ClassDef, EnumVariant, GenericInstance, TypeEntry, TypeKind};
pub use member::{
    AccessModifier, AccessSet, Annotation, ConstructorModel, MemberKind, MemberModel, MethodModel,
};
pub use registry::{RegistryError, TypeRegistry};
