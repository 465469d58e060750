//! Graph → closure lowering.
//!
//! Every node becomes a [`Thunk`] that evaluates against a [`Frame`]. Child
//! thunks are built first and captured by value, so a compiled function is
//! an immutable closure tree with no reference back to the graph.
//!
//! Nodes reachable along several paths (shared locals, reused bodies) are
//! lowered once and the thunk is shared.
//!
//! [`Frame`]: crate::Frame

mod calls;
mod control;
mod objects;
mod sequences;

use std::sync::Arc;

use morph_ir::{EvalError, MapGraph, MapKind, Node, NodeId, Param, TypeId, Value};
use morph_stack::ensure_sufficient_stack;
use morph_types::TypeRegistry;
use rustc_hash::FxHashMap;

use crate::compiled::{thunk, CompiledMap, Thunk};
use crate::errors::LowerError;

/// Lower a mapping graph into an executable function.
#[tracing::instrument(level = "debug", skip_all, fields(pair = ?graph.pair, kind = graph.kind.as_str()))]
pub fn lower(graph: &MapGraph, registry: &Arc<TypeRegistry>) -> Result<CompiledMap, LowerError> {
    let mut lowerer = Lowerer {
        graph,
        registry,
        memo: FxHashMap::default(),
    };
    let root = lowerer.lower_node(graph.root)?;
    tracing::debug!(nodes = graph.arena.len(), thunks = lowerer.memo.len(), "lowered");
    Ok(CompiledMap::new(
        graph.pair,
        graph.kind,
        graph.arena.local_count(),
        root,
    ))
}

pub(crate) struct Lowerer<'a> {
    graph: &'a MapGraph,
    registry: &'a Arc<TypeRegistry>,
    memo: FxHashMap<NodeId, Thunk>,
}

impl Lowerer<'_> {
    pub(crate) fn lower_node(&mut self, id: NodeId) -> Result<Thunk, LowerError> {
        if id.index() >= self.graph.arena.len() {
            return Err(LowerError::InvalidNode(id));
        }
        if let Some(done) = self.memo.get(&id) {
            return Ok(Arc::clone(done));
        }
        let lowered = ensure_sufficient_stack(|| self.lower_kind(id))?;
        self.memo.insert(id, Arc::clone(&lowered));
        Ok(lowered)
    }

    /// Lower an optional operand; `INVALID` lowers to `None`.
    pub(crate) fn lower_opt(&mut self, id: NodeId) -> Result<Option<Thunk>, LowerError> {
        if id.is_valid() {
            self.lower_node(id).map(Some)
        } else {
            Ok(None)
        }
    }

    fn lower_kind(&mut self, id: NodeId) -> Result<Thunk, LowerError> {
        let node = *self.graph.arena.node(id);
        match node {
            Node::Param(Param::Source) => Ok(thunk(|frame| Ok(frame.source.clone()))),
            Node::Param(Param::Destination) => Ok(thunk(|frame| Ok(frame.destination.clone()))),
            Node::Local(local) => Ok(thunk(move |frame| Ok(frame.local(local)))),
            Node::Literal(constant) => {
                let value = self.graph.arena.constant(constant).clone();
                Ok(thunk(move |_| Ok(value.clone())))
            }
            Node::Default(ty) => self.lower_default(ty),
            Node::Unit => Ok(thunk(|_| Ok(Value::Null))),

            Node::Member { target, member } => self.lower_member(target, member),
            Node::DictLookup {
                target,
                key,
                matcher,
            } => self.lower_dict_lookup(target, key, matcher),
            Node::Construct { ty } => self.lower_construct(ty),
            Node::Init { ty, bindings } => self.lower_init(ty, bindings),
            Node::DictInit { ty, entries } => self.lower_dict_init(ty, entries),
            Node::Assign {
                target,
                member,
                value,
            } => self.lower_assign(target, member, value),
            Node::Preserve {
                source,
                pair,
                local,
                construct,
                populate,
            } => self.lower_preserve(source, pair, local, construct, populate),

            Node::Let { local, value } => self.lower_let(local, value),
            Node::Block { nodes } => self.lower_block(nodes),
            Node::Conditional {
                cond,
                then,
                otherwise,
            } => self.lower_conditional(cond, then, otherwise),
            Node::Binary { op, left, right } => self.lower_binary(op, left, right),
            Node::Unary { op, operand } => self.lower_unary(op, operand),
            Node::Coalesce { value, fallback } => self.lower_coalesce(value, fallback),

            Node::MapSequence {
                source,
                element,
                body,
                ty,
            } => self.lower_map_sequence(source, element, body, ty),
            Node::PopulateSequence {
                source,
                target,
                element,
                body,
            } => self.lower_populate_sequence(source, target, element, body),
            Node::MapEntries {
                source,
                key,
                value,
                key_body,
                value_body,
                ty,
            } => self.lower_map_entries(source, [key, value], [key_body, value_body], ty),
            Node::PopulateEntries {
                source,
                target,
                key,
                value,
                key_body,
                value_body,
            } => self.lower_populate_entries(source, target, [key, value], [key_body, value_body]),
            Node::MapGrid {
                source,
                element,
                body,
                ty,
            } => self.lower_map_grid(source, element, body, ty),

            Node::Call { func, args } => self.lower_call(func, args),
            Node::Convert { value, conversion } => self.lower_convert(value, conversion),
            Node::Invoke {
                kind: MapKind::MapToTarget,
                target,
                ..
            } if !target.is_valid() => Err(LowerError::MissingOperand {
                node: id,
                required: "a destination operand",
            }),
            Node::Invoke {
                pair,
                kind,
                source,
                target,
            } => self.lower_invoke(pair, kind, source, target),
            Node::Dynamic {
                value,
                destination,
                kind,
                target,
            } => self.lower_dynamic(value, destination, kind, target),
        }
    }

    /// Zero values without identity are computed once; value-type instances
    /// are built per evaluation so no two destinations share one.
    fn lower_default(&self, ty: TypeId) -> Result<Thunk, LowerError> {
        self.check_type(ty)?;
        let value = self.registry.default_value(ty);
        if value.identity().is_none() {
            return Ok(thunk(move |_| Ok(value.clone())));
        }
        let registry = Arc::clone(self.registry);
        Ok(thunk(move |_| Ok(registry.default_value(ty))))
    }

    pub(crate) fn check_type(&self, ty: TypeId) -> Result<(), LowerError> {
        match self.registry.get(ty) {
            Some(_) => Ok(()),
            None => Err(LowerError::UnknownType(ty)),
        }
    }
}

/// Branch condition: `Null` counts as false.
pub(crate) fn truth(value: &Value) -> Result<bool, EvalError> {
    match value {
        Value::Bool(b) => Ok(*b),
        Value::Null => Ok(false),
        other => Err(EvalError::mismatch("bool", other)),
    }
}

#[cfg(test)]
mod tests;
