//! Lowering of configuration expressions and accessor results.

use morph_config::{display_pair, ConfigError, MemberResolver, ValueExpr};
use morph_ir::{MapKind, MatcherId, Name, Node, NodeId, TypeId, TypePair, UnaryOp};
use morph_types::MemberModel;
use smallvec::SmallVec;

use crate::accessor::Access;

use super::GraphBuilder;

/// What the leaves of a [`ValueExpr`] stand for, with their static types.
#[derive(Copy, Clone, Debug)]
pub(crate) struct ExprEnv {
    pub source: (NodeId, TypeId),
    /// `None` outside `MapToTarget`; `Destination` then lowers to null.
    pub destination: Option<(NodeId, TypeId)>,
    /// The value under transformation.
    pub arg: Option<(NodeId, TypeId)>,
}

impl ExprEnv {
    pub fn over(source: NodeId, source_ty: TypeId) -> Self {
        ExprEnv {
            source: (source, source_ty),
            destination: None,
            arg: None,
        }
    }
}

impl GraphBuilder<'_> {
    /// Lower a configuration expression, returning its node and static type.
    pub(crate) fn lower_expr(
        &mut self,
        expr: &ValueExpr,
        env: &ExprEnv,
    ) -> Result<(NodeId, TypeId), ConfigError> {
        match expr {
            ValueExpr::Source => Ok(env.source),
            ValueExpr::Destination => Ok(match env.destination {
                Some(dest) => dest,
                None => (self.default(TypeId::OBJECT), TypeId::OBJECT),
            }),
            ValueExpr::Arg => Ok(env.arg.unwrap_or(env.source)),
            ValueExpr::Member(target, name) => {
                let (target, target_ty) = self.lower_expr(target, env)?;
                let ty = self.member_type(target_ty, *name)?;
                let node = self.push(
                    Node::Member {
                        target,
                        member: *name,
                    },
                    ty,
                );
                Ok((node, ty))
            }
            ValueExpr::Literal(value) => {
                let ty = value.runtime_type();
                let id = self.arena.push_const(value.clone());
                Ok((self.push(Node::Literal(id), ty), ty))
            }
            ValueExpr::Binary(op, left, right) => {
                let (left, left_ty) = self.lower_expr(left, env)?;
                let (right, _) = self.lower_expr(right, env)?;
                let ty = if op.is_predicate() {
                    TypeId::BOOL
                } else {
                    left_ty
                };
                let node = self.push(
                    Node::Binary {
                        op: *op,
                        left,
                        right,
                    },
                    ty,
                );
                Ok((node, ty))
            }
            ValueExpr::Unary(op, operand) => {
                let (operand, operand_ty) = self.lower_expr(operand, env)?;
                let ty = if *op == UnaryOp::Neg {
                    operand_ty
                } else {
                    TypeId::BOOL
                };
                Ok((self.push(Node::Unary { op: *op, operand }, ty), ty))
            }
            ValueExpr::Call(func, args) => {
                let mut lowered: SmallVec<[NodeId; 4]> = SmallVec::new();
                for arg in args {
                    lowered.push(self.lower_expr(arg, env)?.0);
                }
                let ty = func.returns();
                let func = self.arena.push_host_fn(func.clone());
                let args = self.arena.push_list(&lowered);
                Ok((self.push(Node::Call { func, args }, ty), ty))
            }
            ValueExpr::Conditional {
                cond,
                then,
                otherwise,
            } => {
                let (cond, _) = self.lower_expr(cond, env)?;
                let (then, ty) = self.lower_expr(then, env)?;
                let (otherwise, _) = self.lower_expr(otherwise, env)?;
                Ok((self.conditional(cond, then, otherwise, ty), ty))
            }
        }
    }

    /// Static type of `owner.name`. Reads on `object` stay dynamic.
    fn member_type(&self, owner: TypeId, name: Name) -> Result<TypeId, ConfigError> {
        let owner = self.registry.unwrap_nullable(owner);
        if owner == TypeId::OBJECT {
            return Ok(TypeId::OBJECT);
        }
        self.registry
            .member(owner, name)
            .map(|m| m.ty)
            .ok_or_else(|| ConfigError::UnknownMember {
                ty: self.registry.type_name(owner).to_owned(),
                member: self.registry.text(name).to_owned(),
            })
    }

    /// Emit the read for a located source. `Custom` is handled by
    /// [`Self::custom_value`] and never reaches here.
    pub(crate) fn emit_access(&mut self, source: NodeId, access: &Access) -> (NodeId, TypeId) {
        match access {
            Access::Custom => (self.default(TypeId::OBJECT), TypeId::OBJECT),
            Access::Member { name, ty } => {
                let node = self.push(
                    Node::Member {
                        target: source,
                        member: *name,
                    },
                    *ty,
                );
                (node, *ty)
            }
            Access::Method { func, ty } => {
                let func = self.arena.push_host_fn(func.clone());
                let args = self.arena.push_list(&[source]);
                (self.push(Node::Call { func, args }, *ty), *ty)
            }
            Access::Flatten { path } => {
                let mut node = source;
                let mut ty = TypeId::OBJECT;
                for &(name, step_ty) in path {
                    node = self.push(
                        Node::Member {
                            target: node,
                            member: name,
                        },
                        step_ty,
                    );
                    ty = step_ty;
                }
                (node, ty)
            }
            Access::Dictionary { key, matcher, ty } => {
                let matcher = match matcher {
                    Some(converter) => self.arena.push_matcher(converter.clone()),
                    None => MatcherId::INVALID,
                };
                let node = self.push(
                    Node::DictLookup {
                        target: source,
                        key: *key,
                        matcher,
                    },
                    *ty,
                );
                (node, *ty)
            }
        }
    }

    /// Chain the custom resolvers of one member into nested conditionals.
    ///
    /// `resolvers` is most recent first. The first unconditional resolver
    /// ends the chain; when no condition holds the member type's default
    /// is used. Each branch is converted to `member.ty` on its own.
    pub(crate) fn custom_value(
        &mut self,
        resolvers: &[MemberResolver],
        member: &MemberModel,
        env: &ExprEnv,
        kind: MapKind,
    ) -> Result<NodeId, crate::CompileError> {
        let owner = TypePair::new(env.source.1, member.ty);
        let end = resolvers
            .iter()
            .position(|r| r.condition.is_none())
            .map_or(resolvers.len(), |i| i + 1);
        let chain = &resolvers[..end];

        let mut acc = match chain.last() {
            Some(last) if last.condition.is_none() => self.resolver_value(last, member, env, kind)?,
            _ => self.default(member.ty),
        };
        for resolver in chain.iter().rev() {
            let Some(condition) = &resolver.condition else {
                continue;
            };
            let (cond, _) = self
                .lower_expr(condition, env)
                .map_err(|err| self.error(owner, kind, err))?;
            let then = self.resolver_value(resolver, member, env, kind)?;
            acc = self.conditional(cond, then, acc, member.ty);
        }
        Ok(acc)
    }

    fn resolver_value(
        &mut self,
        resolver: &MemberResolver,
        member: &MemberModel,
        env: &ExprEnv,
        kind: MapKind,
    ) -> Result<NodeId, crate::CompileError> {
        let owner = TypePair::new(env.source.1, member.ty);
        let (value, ty) = self
            .lower_expr(&resolver.value, env)
            .map_err(|err| self.error(owner, kind, err))?;
        self.sub_map(value, None, TypePair::new(ty, member.ty), nested_kind(kind))
    }

    /// Apply the destination-value transform registered for `ty`, if any.
    pub(crate) fn transform(
        &mut self,
        value: NodeId,
        ty: TypeId,
        settings: &morph_config::Settings,
        env: &ExprEnv,
    ) -> Result<NodeId, ConfigError> {
        let Some(transform) = settings.transform_for(ty) else {
            return Ok(value);
        };
        let env = ExprEnv {
            arg: Some((value, ty)),
            ..*env
        };
        Ok(self.lower_expr(transform, &env)?.0)
    }

    /// `UnsupportedConversion` for `pair`.
    pub(crate) fn unsupported(&self, pair: TypePair) -> ConfigError {
        ConfigError::UnsupportedConversion {
            from: self.registry.type_name(pair.source).to_owned(),
            to: self.registry.type_name(pair.destination).to_owned(),
        }
    }

    /// `A -> B` for diagnostics.
    pub(crate) fn pair_name(&self, pair: TypePair) -> String {
        display_pair(self.registry, pair)
    }
}

/// Kind used for values computed outside the destination's own slots:
/// resolver results, collection elements, dictionary entries.
pub(crate) fn nested_kind(kind: MapKind) -> MapKind {
    match kind {
        MapKind::Projection => MapKind::Projection,
        MapKind::Map | MapKind::MapToTarget => MapKind::Map,
    }
}
