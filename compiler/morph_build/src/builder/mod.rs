//! Expression graph builder.
//!
//! One [`GraphBuilder`] builds the graph for one top-level request. Nested
//! sub-mappings are inlined into the same arena; a pair already being built
//! higher up the stack becomes a by-reference [`Node::Invoke`] (or, with
//! `max_depth`, is inlined up to the limit).
//!
//! # Module Organization
//!
//! - `object`: class, record, and projection initializers, member assignment
//! - `sequence`: collections, arrays, dictionaries, multi-dimensional arrays
//! - `scalar`: primitive, string, and enum conversions plus the fallback
//! - `expr`: lowering of configuration expressions and accessor results

mod expr;
mod object;
mod scalar;
mod sequence;

use std::sync::Arc;

use morph_config::{AdapterKind, ConfigError, Resolution};
use morph_ir::{GraphArena, MapGraph, MapKind, Node, NodeId, Param, TypeId, TypePair, UnaryOp};
use morph_stack::ensure_sufficient_stack;
use morph_types::TypeRegistry;

use crate::context::CompileContext;
use crate::errors::CompileError;
use crate::provider::SettingsProvider;

pub(crate) use expr::ExprEnv;

/// A finished build: the graph plus every resolution it consulted.
#[derive(Debug)]
pub struct BuildOutput {
    pub graph: MapGraph,
    pub resolutions: Vec<Arc<Resolution>>,
}

impl BuildOutput {
    /// Freeze the user rules behind every consulted resolution. Call once
    /// the function built from this graph is stored.
    pub fn mark_consumed(&self) {
        for resolution in &self.resolutions {
            resolution.mark_consumed();
        }
    }
}

/// Build the mapping graph for `pair` and `kind`.
///
/// For `MapToTarget` the root returns the supplied destination untouched
/// when the source is null.
#[tracing::instrument(level = "debug", skip_all, fields(pair = ?pair, kind = ?kind))]
pub fn build_graph(
    registry: &TypeRegistry,
    provider: &dyn SettingsProvider,
    pair: TypePair,
    kind: MapKind,
) -> Result<BuildOutput, CompileError> {
    let mut builder = GraphBuilder::new(registry, provider, kind);
    let source = builder.push(Node::Param(Param::Source), pair.source);
    let target = (kind == MapKind::MapToTarget)
        .then(|| builder.push(Node::Param(Param::Destination), pair.destination));

    let mut root = builder.sub_map(source, target, pair, kind)?;
    if let Some(target) = target {
        let is_null = builder.unary(UnaryOp::IsNull, source);
        root = builder.conditional(is_null, target, root, pair.destination);
    }

    tracing::debug!(nodes = builder.arena.len(), "graph built");
    Ok(BuildOutput {
        graph: MapGraph::new(pair, kind, builder.arena, root),
        resolutions: builder.resolutions,
    })
}

/// Graph construction state for one request.
pub struct GraphBuilder<'a> {
    registry: &'a TypeRegistry,
    provider: &'a dyn SettingsProvider,
    arena: GraphArena,
    ctx: CompileContext,
    resolutions: Vec<Arc<Resolution>>,
}

impl<'a> GraphBuilder<'a> {
    pub fn new(
        registry: &'a TypeRegistry,
        provider: &'a dyn SettingsProvider,
        kind: MapKind,
    ) -> Self {
        GraphBuilder {
            registry,
            provider,
            arena: GraphArena::new(),
            ctx: CompileContext::new(kind),
            resolutions: Vec::new(),
        }
    }

    /// Effective settings for a pair reached by this build.
    fn settings(&mut self, pair: TypePair, kind: MapKind) -> Result<Arc<Resolution>, CompileError> {
        let fork = self.ctx.fork().cloned();
        let resolution = self
            .provider
            .settings_for(pair, kind, fork.as_deref())
            .map_err(|err| self.error(pair, kind, err))?;
        if !self
            .resolutions
            .iter()
            .any(|r| Arc::ptr_eq(r, &resolution))
        {
            self.resolutions.push(Arc::clone(&resolution));
        }
        Ok(resolution)
    }

    fn error(&self, pair: TypePair, kind: MapKind, err: ConfigError) -> CompileError {
        CompileError::new(self.registry, pair, kind, err)
    }

    /// Map `source` (statically typed `pair.source`) to `pair.destination`.
    ///
    /// Handles re-entry: a pair already in progress becomes an invocation of
    /// its cached function, an inlined copy while under `max_depth`, or the
    /// destination's default beyond it.
    pub(crate) fn sub_map(
        &mut self,
        source: NodeId,
        target: Option<NodeId>,
        pair: TypePair,
        kind: MapKind,
    ) -> Result<NodeId, CompileError> {
        if self.ctx.is_running(pair) {
            let max_depth = self.settings(pair, kind)?.settings.max_depth;
            match max_depth {
                Some(max) if self.ctx.depth(pair) >= max => {
                    tracing::trace!(?pair, max, "depth limit reached");
                    return Ok(self.default(pair.destination));
                }
                Some(_) => {}
                None if kind == MapKind::Projection => {
                    let err = ConfigError::UnboundedProjection {
                        pair: self.pair_name(pair),
                    };
                    return Err(self.error(pair, kind, err));
                }
                None => {
                    tracing::trace!(?pair, "re-entry; invoking cached function");
                    let target = target.unwrap_or(NodeId::INVALID);
                    return Ok(self.push(
                        Node::Invoke {
                            pair,
                            kind,
                            source,
                            target,
                        },
                        pair.destination,
                    ));
                }
            }
        }

        let resolution = self.settings(pair, kind)?;
        let fork = resolution.settings.fork.clone();
        self.ctx.push(pair);
        if let Some(fork) = &fork {
            self.ctx.push_fork(Arc::clone(fork));
        }
        let result = ensure_sufficient_stack(|| self.convert(source, target, pair, kind, &resolution));
        if fork.is_some() {
            self.ctx.pop_fork();
        }
        self.ctx.pop(pair);
        result
    }

    /// Dispatch on the converter override, shallow copy, and the adapter.
    fn convert(
        &mut self,
        source: NodeId,
        target: Option<NodeId>,
        pair: TypePair,
        kind: MapKind,
        resolution: &Resolution,
    ) -> Result<NodeId, CompileError> {
        let settings = &resolution.settings;

        if let Some(converter) = settings.converter(kind) {
            let env = ExprEnv {
                source: (source, pair.source),
                destination: target.map(|t| (t, pair.destination)),
                arg: Some((source, pair.source)),
            };
            let (node, _) = self
                .lower_expr(converter, &env)
                .map_err(|err| self.error(pair, kind, err))?;
            return Ok(node);
        }

        if pair.is_identity() && settings.shallow_copy_for_same_type() {
            return Ok(source);
        }

        let Some(adapter) = settings.adapter else {
            let err = ConfigError::NoApplicableAdapter {
                pair: self.pair_name(pair),
                kind,
            };
            return Err(self.error(pair, kind, err));
        };
        tracing::trace!(?pair, adapter = adapter.as_str(), "converting");

        match adapter {
            AdapterKind::Primitive | AdapterKind::String | AdapterKind::Enum => {
                self.map_scalar(source, pair, kind, settings)
            }
            AdapterKind::Class if kind == MapKind::Projection => {
                self.project_object(source, pair, settings)
            }
            AdapterKind::Class => self.map_object(source, target, pair, kind, settings),
            AdapterKind::Record => self.map_record(source, pair, kind, settings),
            AdapterKind::Collection | AdapterKind::Array => {
                self.map_sequence(source, target, pair, kind)
            }
            AdapterKind::Dictionary => self.map_dictionary(source, target, pair, kind, settings),
            AdapterKind::MultiArray => self.map_grid(source, pair, kind),
            AdapterKind::Fallback => self.map_fallback(source, target, pair, kind),
        }
    }

    // === Node helpers ===

    #[inline]
    fn push(&mut self, node: Node, ty: TypeId) -> NodeId {
        self.arena.push(node, ty)
    }

    fn default(&mut self, ty: TypeId) -> NodeId {
        self.push(Node::Default(ty), ty)
    }

    fn unit(&mut self) -> NodeId {
        self.push(Node::Unit, TypeId::OBJECT)
    }

    fn unary(&mut self, op: UnaryOp, operand: NodeId) -> NodeId {
        self.push(Node::Unary { op, operand }, TypeId::BOOL)
    }

    fn conditional(&mut self, cond: NodeId, then: NodeId, otherwise: NodeId, ty: TypeId) -> NodeId {
        self.push(
            Node::Conditional {
                cond,
                then,
                otherwise,
            },
            ty,
        )
    }

    fn block(&mut self, nodes: &[NodeId], ty: TypeId) -> NodeId {
        let nodes = self.arena.push_list(nodes);
        self.push(Node::Block { nodes }, ty)
    }

    /// Bind `value` to a fresh local; returns the `Let` and a read of it.
    fn bind(&mut self, value: NodeId) -> (NodeId, NodeId) {
        let ty = self.arena.ty(value);
        let local = self.arena.new_local();
        let binding = self.push(Node::Let { local, value }, TypeId::OBJECT);
        let read = self.push(Node::Local(local), ty);
        (binding, read)
    }

    /// `if value is null { default(ty) } else { body }`.
    fn null_guard(&mut self, value: NodeId, body: NodeId, ty: TypeId) -> NodeId {
        let is_null = self.unary(UnaryOp::IsNull, value);
        let fallback = self.default(ty);
        self.conditional(is_null, fallback, body, ty)
    }
}
