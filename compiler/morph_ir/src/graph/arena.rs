//! Struct-of-arrays storage for a mapping graph.

use crate::{HostFn, NameConverter, TypeId, Value};

use super::ids::{BindingRange, ConstId, HostFnId, LocalId, MatcherId, NodeId, NodeRange};
use super::node::{Binding, Node};

/// Convert a length to `u32`, panicking on overflow.
///
/// A single mapping graph holding four billion nodes is a builder bug, not an
/// input condition.
#[inline]
fn to_u32(len: usize, what: &str) -> u32 {
    match u32::try_from(len) {
        Ok(n) => n,
        Err(_) => panic!("mapping graph exceeded u32 {what}"),
    }
}

/// Arena for graph nodes.
///
/// # Index Spaces
///
/// - `nodes`/`types`: parallel arrays indexed by [`NodeId`]
/// - `lists`: flat `Vec<NodeId>` indexed by [`NodeRange`]
/// - `bindings`: indexed by [`BindingRange`]
/// - `constants`, `host_fns`, `matchers`: side tables for non-`Copy` payloads
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GraphArena {
    nodes: Vec<Node>,
    /// Static type of each node's result (parallel with `nodes`).
    types: Vec<TypeId>,
    lists: Vec<NodeId>,
    bindings: Vec<Binding>,
    constants: Vec<Value>,
    host_fns: Vec<HostFn>,
    matchers: Vec<NameConverter>,
    locals: u32,
}

impl GraphArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a node, returning its ID.
    pub fn push(&mut self, node: Node, ty: TypeId) -> NodeId {
        let id = NodeId::new(to_u32(self.nodes.len(), "nodes"));
        self.nodes.push(node);
        self.types.push(ty);
        id
    }

    #[inline]
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    /// Static result type of a node.
    #[inline]
    pub fn ty(&self, id: NodeId) -> TypeId {
        self.types[id.index()]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Iterate all nodes with their IDs, in allocation order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(i, node)| (NodeId::new(to_u32(i, "nodes")), node))
    }

    pub fn push_list(&mut self, ids: &[NodeId]) -> NodeRange {
        let start = to_u32(self.lists.len(), "node lists");
        self.lists.extend_from_slice(ids);
        NodeRange::new(start, to_u32(ids.len(), "node lists"))
    }

    #[inline]
    pub fn list(&self, range: NodeRange) -> &[NodeId] {
        let start = range.start as usize;
        &self.lists[start..start + range.len()]
    }

    pub fn push_bindings(&mut self, bindings: &[Binding]) -> BindingRange {
        let start = to_u32(self.bindings.len(), "bindings");
        self.bindings.extend_from_slice(bindings);
        BindingRange::new(start, to_u32(bindings.len(), "bindings"))
    }

    #[inline]
    pub fn bindings(&self, range: BindingRange) -> &[Binding] {
        let start = range.start as usize;
        &self.bindings[start..start + range.len()]
    }

    /// Add a constant to the pool. Equal constants are not deduplicated.
    pub fn push_const(&mut self, value: Value) -> ConstId {
        let id = ConstId::new(to_u32(self.constants.len(), "constants"));
        self.constants.push(value);
        id
    }

    #[inline]
    pub fn constant(&self, id: ConstId) -> &Value {
        &self.constants[id.index()]
    }

    /// Register a host function, reusing the slot of an identical one.
    pub fn push_host_fn(&mut self, func: HostFn) -> HostFnId {
        if let Some(i) = self.host_fns.iter().position(|f| *f == func) {
            return HostFnId::new(to_u32(i, "host functions"));
        }
        let id = HostFnId::new(to_u32(self.host_fns.len(), "host functions"));
        self.host_fns.push(func);
        id
    }

    #[inline]
    pub fn host_fn(&self, id: HostFnId) -> &HostFn {
        &self.host_fns[id.index()]
    }

    pub fn push_matcher(&mut self, matcher: NameConverter) -> MatcherId {
        if let Some(i) = self.matchers.iter().position(|m| *m == matcher) {
            return MatcherId::new(to_u32(i, "matchers"));
        }
        let id = MatcherId::new(to_u32(self.matchers.len(), "matchers"));
        self.matchers.push(matcher);
        id
    }

    #[inline]
    pub fn matcher(&self, id: MatcherId) -> &NameConverter {
        &self.matchers[id.index()]
    }

    /// Allocate a fresh local slot.
    pub fn new_local(&mut self) -> LocalId {
        let id = LocalId::new(self.locals);
        self.locals += 1;
        id
    }

    /// Number of local slots a frame for this graph needs.
    pub fn local_count(&self) -> usize {
        self.locals as usize
    }
}
