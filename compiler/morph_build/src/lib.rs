//! Morph Build - from effective settings to a mapping graph.
//!
//! The builder walks a `(TypePair, MapKind)` request top-down. For every
//! pair it reaches it asks a [`SettingsProvider`] for the effective settings,
//! picks the adapter those settings name, and emits nodes into one
//! [`MapGraph`](morph_ir::MapGraph) arena.
//!
//! # Module Organization
//!
//! - `accessor`: value accessing pipeline (where a destination member's value comes from)
//! - `builder`: the graph builder and the built-in adapters' graph shapes
//! - `context`: per-request recursion tracking
//! - `provider`: the settings source seam
//! - `errors`: `CompileError`

pub mod accessor;
mod builder;
mod context;
mod errors;
mod provider;

pub use builder::{build_graph, BuildOutput, GraphBuilder};
pub use context::CompileContext;
pub use errors::{BuildFailure, CompileError};
pub use provider::SettingsProvider;
