//! Morph IR - identifiers, runtime values, and the mapping expression graph.
//!
//! This crate contains the data structures every other morph crate speaks:
//! - `Name` for interned member and type names
//! - `TypeId` / `TypePair` / `MapKind` as the keys of configuration and caches
//! - `Value`, the runtime representation of host objects
//! - `MapGraph`, the backend-neutral expression graph produced by the builder
//!   and consumed by the lowering stage
//!
//! # Design Philosophy
//!
//! - **Intern Everything**: member names are `Name(u32)`, types are `TypeId(u32)`
//! - **Flatten Everything**: graph nodes reference children by `NodeId`, never `Box`
//! - **Shared Identity**: objects and collections are `Arc`-shared so reference
//!   preservation and in-place merges can observe identity

pub mod errors;
pub mod graph;
mod host;
mod interner;
mod name;
pub mod naming;
mod type_id;
mod type_pair;
pub mod value;

pub use errors::{EvalError, EvalResult};
pub use graph::{
    Binding, BindingRange, BinaryOp, ConstId, Conversion, GraphArena, HostFnId, LocalId, MapGraph,
    MatcherId, Node, NodeId, NodeRange, Param, UnaryOp,
};
pub use host::{HostFn, HostFnPtr};
pub use interner::{SharedInterner, StringInterner};
pub use name::Name;
pub use naming::NameConverter;
pub use type_id::TypeId;
pub use type_pair::{MapKind, TypePair};
pub use value::{DictData, EnumValue, GridData, ListData, ObjectData, Shared, Value};
