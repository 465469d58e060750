//! Morph Eval - the execution backend for mapping graphs.
//!
//! [`lower`] turns an immutable [`MapGraph`](morph_ir::MapGraph) into a tree
//! of closures wrapped in a [`CompiledMap`]. Compiled maps are `Send + Sync`
//! and hold no per-call state: everything a call mutates lives in its
//! [`Frame`] and the caller's [`MapContext`].
//!
//! # Module Organization
//!
//! - `lower`: graph to closure lowering
//! - `compiled`: `CompiledMap`, `Frame`
//! - `context`: `MapContext`, `FunctionTable`
//! - `convert`: scalar and enum conversions
//! - `operators`: binary and unary operators

mod compiled;
mod context;
pub mod convert;
mod errors;
mod lower;
pub mod operators;

pub use compiled::{CompiledMap, Frame};
pub use context::{FunctionTable, MapContext};
pub use errors::LowerError;
pub use lower::lower;
