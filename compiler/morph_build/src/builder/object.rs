//! Class, record, and projection construction.

use morph_config::{ConfigError, IgnoredMember, MemberResolver, Settings, ADAPT_IGNORE};
use morph_ir::{Binding, MapKind, Node, NodeId, TypeId, TypePair, UnaryOp};
use morph_types::{MemberKind, MemberModel};

use crate::accessor::{self, Access, AccessRequest};
use crate::errors::CompileError;

use super::expr::nested_kind;
use super::{ExprEnv, GraphBuilder};

/// A destination member's converted value.
#[derive(Copy, Clone, Debug)]
struct Resolved {
    node: NodeId,
    /// Present when a null source value must leave the slot untouched.
    guard: Option<NullGuard>,
}

/// The raw source value bound to a local ahead of conversion, so the null
/// check sees it before any defaulting.
#[derive(Copy, Clone, Debug)]
struct NullGuard {
    bind: NodeId,
    raw: NodeId,
}

impl GraphBuilder<'_> {
    /// Map or merge into a mutable class.
    ///
    /// ```text
    /// let s = source
    /// if s is null { default } else {
    ///     let d = construct          // MapToTarget: target ?? construct
    ///     d.m = <value of m> ...     // per member, null-guarded on demand
    ///     hook(s, d) ...
    ///     d
    /// }
    /// ```
    ///
    /// With `preserve_reference`, the construct/populate pair is wrapped in
    /// a `Preserve` node so `d` is registered before its members are built.
    pub(super) fn map_object(
        &mut self,
        source: NodeId,
        target: Option<NodeId>,
        pair: TypePair,
        kind: MapKind,
        settings: &Settings,
    ) -> Result<NodeId, CompileError> {
        let dest_ty = self.registry.unwrap_nullable(pair.destination);
        let (bind_source, s) = self.bind(source);
        let d_local = self.arena.new_local();
        let d = self.push(Node::Local(d_local), dest_ty);

        let mut construct = match &settings.construct_using {
            Some(expr) => {
                let env = ExprEnv {
                    source: (s, pair.source),
                    destination: target.map(|t| (t, pair.destination)),
                    arg: None,
                };
                self.lower_expr(expr, &env)
                    .map_err(|err| self.error(pair, kind, err))?
                    .0
            }
            None => self.push(Node::Construct { ty: dest_ty }, dest_ty),
        };
        if let (MapKind::MapToTarget, Some(target)) = (kind, target) {
            construct = self.push(
                Node::Coalesce {
                    value: target,
                    fallback: construct,
                },
                dest_ty,
            );
        }

        let env = ExprEnv {
            source: (s, pair.source),
            destination: Some((d, dest_ty)),
            arg: None,
        };
        let mut statements = self.assign_members(s, d, pair, kind, settings, &env)?;
        for hook in &settings.after_mapping {
            let returns = hook.returns();
            let func = self.arena.push_host_fn(hook.clone());
            let args = self.arena.push_list(&[s, d]);
            statements.push(self.push(Node::Call { func, args }, returns));
        }

        let body = if settings.preserve_reference() {
            let populate = self.block(&statements, TypeId::OBJECT);
            self.push(
                Node::Preserve {
                    source: s,
                    pair,
                    local: d_local,
                    construct,
                    populate,
                },
                dest_ty,
            )
        } else {
            let init = self.push(
                Node::Let {
                    local: d_local,
                    value: construct,
                },
                TypeId::OBJECT,
            );
            let mut nodes = Vec::with_capacity(statements.len() + 2);
            nodes.push(init);
            nodes.extend(statements);
            nodes.push(d);
            self.block(&nodes, dest_ty)
        };

        let guarded = self.null_guard(s, body, pair.destination);
        Ok(self.block(&[bind_source, guarded], pair.destination))
    }

    fn assign_members(
        &mut self,
        s: NodeId,
        d: NodeId,
        pair: TypePair,
        kind: MapKind,
        settings: &Settings,
        env: &ExprEnv,
    ) -> Result<Vec<NodeId>, CompileError> {
        let dest_ty = self.registry.unwrap_nullable(pair.destination);
        let members = self.destination_members(dest_ty, settings);
        let mut statements = Vec::with_capacity(members.len());

        for member in &members {
            let ignored = settings.ignored(member.name);
            if !self.is_mapped(member, ignored, settings) {
                continue;
            }
            let current = (kind == MapKind::MapToTarget).then(|| {
                self.push(
                    Node::Member {
                        target: d,
                        member: member.name,
                    },
                    member.ty,
                )
            });
            let Some(resolved) =
                self.member_value(s, current, member, pair, kind, settings, env, false)?
            else {
                self.unmapped(member, pair, kind, settings)?;
                continue;
            };

            let assign = self.push(
                Node::Assign {
                    target: d,
                    member: member.name,
                    value: resolved.node,
                },
                TypeId::OBJECT,
            );
            let mut statement = match resolved.guard {
                Some(guard) => {
                    let present = self.unary(UnaryOp::IsNotNull, guard.raw);
                    let skip = self.unit();
                    let guarded = self.conditional(present, assign, skip, TypeId::OBJECT);
                    self.block(&[guard.bind, guarded], TypeId::OBJECT)
                }
                None => assign,
            };

            if let Some(IgnoredMember {
                condition: Some(condition),
                ..
            }) = ignored
            {
                let (cond, _) = self
                    .lower_expr(condition, env)
                    .map_err(|err| self.error(pair, kind, err))?;
                let skip = self.unit();
                statement = self.conditional(cond, skip, statement, TypeId::OBJECT);
            }
            statements.push(statement);
        }
        Ok(statements)
    }

    /// Build a projection: one member-initializer node, everything inlined.
    pub(super) fn project_object(
        &mut self,
        source: NodeId,
        pair: TypePair,
        settings: &Settings,
    ) -> Result<NodeId, CompileError> {
        let kind = MapKind::Projection;
        let dest_ty = self.registry.unwrap_nullable(pair.destination);
        let env = ExprEnv::over(source, pair.source);
        let members = self.destination_members(dest_ty, settings);

        let mut bindings = Vec::with_capacity(members.len());
        for member in &members {
            let ignored = settings.ignored(member.name);
            if !self.is_mapped(member, ignored, settings) {
                continue;
            }
            let Some(resolved) =
                self.member_value(source, None, member, pair, kind, settings, &env, false)?
            else {
                self.unmapped(member, pair, kind, settings)?;
                continue;
            };
            let value = self.resolved_value(resolved, member.ty);
            let value = self.conditionally_ignored(value, member, ignored, pair, kind, &env)?;
            bindings.push(Binding {
                member: member.name,
                value,
            });
        }

        let bindings = self.arena.push_bindings(&bindings);
        let init = self.push(
            Node::Init {
                ty: dest_ty,
                bindings,
            },
            dest_ty,
        );
        Ok(self.null_guard(source, init, pair.destination))
    }

    /// Construct an immutable record through its widest resolvable
    /// constructor.
    pub(super) fn map_record(
        &mut self,
        source: NodeId,
        pair: TypePair,
        kind: MapKind,
        settings: &Settings,
    ) -> Result<NodeId, CompileError> {
        let dest_ty = self.registry.unwrap_nullable(pair.destination);
        let (bind_source, s) = if kind == MapKind::Projection {
            (None, source)
        } else {
            let (bind, read) = self.bind(source);
            (Some(bind), read)
        };
        let env = ExprEnv::over(s, pair.source);
        let slots = self
            .constructor_slots(dest_ty, pair.source, kind, settings)
            .map_err(|err| self.error(pair, kind, err))?;
        // Records are rebuilt, never merged.
        let slot_kind = nested_kind(kind);

        let mut bindings = Vec::with_capacity(slots.len());
        for slot in &slots {
            let ignored = settings.ignored(slot.name);
            let value = if matches!(ignored, Some(IgnoredMember { condition: None, .. })) {
                None
            } else {
                self.member_value(s, None, slot, pair, slot_kind, settings, &env, true)?
            };
            let value = match value {
                Some(resolved) => {
                    let value = self.resolved_value(resolved, slot.ty);
                    self.conditionally_ignored(value, slot, ignored, pair, kind, &env)?
                }
                None => self.default(slot.ty),
            };
            bindings.push(Binding {
                member: slot.name,
                value,
            });
        }

        let bindings = self.arena.push_bindings(&bindings);
        let init = self.push(
            Node::Init {
                ty: dest_ty,
                bindings,
            },
            dest_ty,
        );
        let guarded = self.null_guard(s, init, pair.destination);
        Ok(match bind_source {
            Some(bind) => self.block(&[bind, guarded], pair.destination),
            None => guarded,
        })
    }

    /// Parameters of the unique widest constructor whose parameters all
    /// resolve. Each parameter is reported under the name of the member it
    /// initializes (matched case-insensitively), typed as the parameter.
    fn constructor_slots(
        &self,
        dest_ty: TypeId,
        source_ty: TypeId,
        kind: MapKind,
        settings: &Settings,
    ) -> Result<Vec<MemberModel>, ConfigError> {
        let members = self.registry.members(dest_ty);
        let mut best: Option<Vec<MemberModel>> = None;
        let mut tied = false;
        let mut candidates = 0;

        for ctor in self.registry.constructors(dest_ty) {
            let slots: Vec<MemberModel> = ctor
                .params
                .iter()
                .map(|param| {
                    let name = self.registry.text(param.name);
                    members
                        .iter()
                        .find(|m| {
                            m.kind != MemberKind::CtorParam
                                && self.registry.text(m.name).eq_ignore_ascii_case(name)
                        })
                        .map_or_else(
                            || param.clone(),
                            |m| MemberModel {
                                ty: param.ty,
                                ..m.clone()
                            },
                        )
                })
                .collect();

            let resolvable = slots.iter().all(|slot| {
                matches!(
                    settings.ignored(slot.name),
                    Some(IgnoredMember { condition: None, .. })
                ) || accessor::locate(
                    self.registry,
                    &AccessRequest {
                        source_ty,
                        member: slot,
                        settings,
                        kind,
                        ignore_case: true,
                    },
                )
                .is_some()
            });
            if !resolvable {
                continue;
            }
            candidates += 1;
            match best.as_ref().map(Vec::len) {
                Some(len) if len > slots.len() => {}
                Some(len) if len == slots.len() => tied = true,
                _ => {
                    best = Some(slots);
                    tied = false;
                }
            }
        }

        match best {
            Some(slots) if !tied => Ok(slots),
            _ => Err(ConfigError::NoMatchingConstructor {
                ty: self.registry.type_name(dest_ty).to_owned(),
                candidates,
            }),
        }
    }

    /// Resolve one destination slot through the accessor pipeline and
    /// convert it to the slot's type. `None` when no strategy matched.
    #[expect(
        clippy::too_many_arguments,
        reason = "member resolution needs the full build position"
    )]
    fn member_value(
        &mut self,
        s: NodeId,
        current: Option<NodeId>,
        member: &MemberModel,
        pair: TypePair,
        kind: MapKind,
        settings: &Settings,
        env: &ExprEnv,
        ignore_case: bool,
    ) -> Result<Option<Resolved>, CompileError> {
        let request = AccessRequest {
            source_ty: pair.source,
            member,
            settings,
            kind,
            ignore_case,
        };
        let Some((strategy, access)) = accessor::locate(self.registry, &request) else {
            tracing::trace!(member = self.registry.text(member.name), "no source");
            return Ok(None);
        };
        tracing::trace!(member = self.registry.text(member.name), strategy, "resolved member");

        let custom = access == Access::Custom;
        let (raw, raw_ty) = if custom {
            let resolvers: Vec<MemberResolver> =
                settings.resolvers_for(member.name).cloned().collect();
            (self.custom_value(&resolvers, member, env, kind)?, member.ty)
        } else {
            self.emit_access(s, &access)
        };

        let guard_nulls = kind != MapKind::Projection
            && (settings.ignore_null_values()
                || (kind == MapKind::MapToTarget && self.registry.is_nullable(raw_ty)));
        let (raw, guard) = if guard_nulls {
            let (bind, read) = self.bind(raw);
            (read, Some(NullGuard { bind, raw: read }))
        } else {
            (raw, None)
        };

        let node = if custom {
            raw
        } else {
            let member_kind = if current.is_some() {
                kind
            } else {
                nested_kind(kind)
            };
            self.sub_map(raw, current, TypePair::new(raw_ty, member.ty), member_kind)?
        };
        let node = self
            .transform(node, member.ty, settings, env)
            .map_err(|err| self.error(pair, kind, err))?;
        Ok(Some(Resolved { node, guard }))
    }

    /// A resolved value as a single expression, for initializers that
    /// cannot skip a slot.
    fn resolved_value(&mut self, resolved: Resolved, ty: TypeId) -> NodeId {
        match resolved.guard {
            Some(guard) => self.block(&[guard.bind, resolved.node], ty),
            None => resolved.node,
        }
    }

    /// Writable destination members visible under the settings, minus
    /// those carrying `AdaptIgnore` or an ignored annotation.
    fn destination_members(&self, ty: TypeId, settings: &Settings) -> Vec<MemberModel> {
        let adapt_ignore = self.registry.name(ADAPT_IGNORE);
        let visibility = settings.visibility();
        self.registry
            .members(ty)
            .iter()
            .filter(|m| {
                m.writable
                    && m.kind != MemberKind::CtorParam
                    && m.is_visible(visibility)
                    && m.annotation(adapt_ignore).is_none()
                    && !m
                        .annotations
                        .iter()
                        .any(|a| settings.ignore_annotations.contains(&a.name))
            })
            .cloned()
            .collect()
    }

    /// Unconditional ignores and `ignore_non_mapped` drop a member entirely.
    fn is_mapped(
        &self,
        member: &MemberModel,
        ignored: Option<&IgnoredMember>,
        settings: &Settings,
    ) -> bool {
        if matches!(ignored, Some(IgnoredMember { condition: None, .. })) {
            return false;
        }
        !settings.ignore_non_mapped() || settings.has_resolver(member.name)
    }

    /// Strict mode turns an unresolved member into an error.
    fn unmapped(
        &self,
        member: &MemberModel,
        pair: TypePair,
        kind: MapKind,
        settings: &Settings,
    ) -> Result<(), CompileError> {
        if !settings.require_destination_member_source() {
            return Ok(());
        }
        let err = ConfigError::UnmappedMember {
            pair: self.pair_name(pair),
            member: self.registry.text(member.name).to_owned(),
        };
        Err(self.error(pair, kind, err))
    }

    /// `if cond { default } else { value }` for conditionally ignored slots.
    fn conditionally_ignored(
        &mut self,
        value: NodeId,
        member: &MemberModel,
        ignored: Option<&IgnoredMember>,
        pair: TypePair,
        kind: MapKind,
        env: &ExprEnv,
    ) -> Result<NodeId, CompileError> {
        let Some(IgnoredMember {
            condition: Some(condition),
            ..
        }) = ignored
        else {
            return Ok(value);
        };
        let (cond, _) = self
            .lower_expr(condition, env)
            .map_err(|err| self.error(pair, kind, err))?;
        let fallback = self.default(member.ty);
        Ok(self.conditional(cond, fallback, value, member.ty))
    }
}
