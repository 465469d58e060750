//! Backend-neutral mapping expression graph.
//!
//! The builder emits one [`MapGraph`] per `(TypePair, MapKind)`; the
//! evaluator lowers it into closures, and projections hand it to an external
//! query translator as-is. Nodes live in a flat [`GraphArena`] and reference
//! each other by [`NodeId`].
//!
//! # Shape
//!
//! The root node is evaluated with [`Param::Source`] (and, for
//! `MapToTarget`, [`Param::Destination`]) bound. Statements (`Let`, `Assign`)
//! evaluate to `Unit`; a `Block` yields its last node's value.

mod arena;
mod ids;
mod node;
mod ops;

pub use arena::GraphArena;
pub use ids::{BindingRange, ConstId, HostFnId, LocalId, MatcherId, NodeId, NodeRange};
pub use node::{Binding, Conversion, Node, Param};
pub use ops::{BinaryOp, UnaryOp};

use crate::{MapKind, TypePair};

/// A complete, immutable mapping graph.
#[derive(Clone, Debug, PartialEq)]
pub struct MapGraph {
    pub pair: TypePair,
    pub kind: MapKind,
    pub arena: GraphArena,
    pub root: NodeId,
}

impl MapGraph {
    pub fn new(pair: TypePair, kind: MapKind, arena: GraphArena, root: NodeId) -> Self {
        MapGraph {
            pair,
            kind,
            arena,
            root,
        }
    }

    /// Iterate every node in the arena.
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.arena.iter()
    }

    /// Returns `true` if any node satisfies `pred`.
    pub fn contains(&self, pred: impl Fn(&Node) -> bool) -> bool {
        self.nodes().any(|(_, node)| pred(node))
    }

    /// Returns `true` if the graph can be handed to a query translator:
    /// no by-reference or run-time dispatched calls.
    pub fn is_self_contained(&self) -> bool {
        !self.contains(Node::is_indirect)
    }
}

#[cfg(test)]
mod tests;
