//! Collections, arrays, dictionaries, and multi-dimensional arrays.

use morph_config::{Settings, ADAPT_IGNORE};
use morph_ir::{Binding, MapKind, Node, NodeId, TypeId, TypePair, UnaryOp};
use morph_types::{MemberKind, TypeKind};

use crate::errors::CompileError;

use super::expr::nested_kind;
use super::GraphBuilder;

impl GraphBuilder<'_> {
    /// Per-element loop. Merging into an existing collection clears and
    /// refills that instance instead of allocating a new one.
    pub(super) fn map_sequence(
        &mut self,
        source: NodeId,
        target: Option<NodeId>,
        pair: TypePair,
        kind: MapKind,
    ) -> Result<NodeId, CompileError> {
        let dest_ty = self.registry.unwrap_nullable(pair.destination);
        let source_elem = self.element_of(pair.source);
        let dest_elem = self.element_of(pair.destination);

        let element = self.arena.new_local();
        let item = self.push(Node::Local(element), source_elem);
        let body = self.sub_map(
            item,
            None,
            TypePair::new(source_elem, dest_elem),
            nested_kind(kind),
        )?;

        let fresh = self.push(
            Node::MapSequence {
                source,
                element,
                body,
                ty: dest_ty,
            },
            dest_ty,
        );
        let growable = matches!(self.registry.kind(dest_ty), Some(TypeKind::Collection { .. }));
        match (kind, target) {
            (MapKind::MapToTarget, Some(target)) if growable => {
                let refill = self.push(
                    Node::PopulateSequence {
                        source,
                        target,
                        element,
                        body,
                    },
                    dest_ty,
                );
                Ok(self.into_existing(source, target, fresh, refill, pair.destination))
            }
            _ => Ok(fresh),
        }
    }

    /// Dictionary to dictionary, entry by entry; or a class flattened into
    /// a string-keyed dictionary of its readable members.
    pub(super) fn map_dictionary(
        &mut self,
        source: NodeId,
        target: Option<NodeId>,
        pair: TypePair,
        kind: MapKind,
        settings: &Settings,
    ) -> Result<NodeId, CompileError> {
        let source_ty = self.registry.unwrap_nullable(pair.source);
        let dest_ty = self.registry.unwrap_nullable(pair.destination);
        let Some(&TypeKind::Dictionary {
            key: dest_key,
            value: dest_value,
        }) = self.registry.kind(dest_ty)
        else {
            return Err(self.error(pair, kind, self.unsupported(pair)));
        };

        let (source_key, source_value) = match self.registry.kind(source_ty) {
            Some(&TypeKind::Dictionary { key, value }) => (key, value),
            _ => return self.class_to_dictionary(source, pair, kind, dest_value, settings),
        };

        let entry_kind = nested_kind(kind);
        let key = self.arena.new_local();
        let value = self.arena.new_local();
        let key_item = self.push(Node::Local(key), source_key);
        let value_item = self.push(Node::Local(value), source_value);
        let key_body = self.sub_map(key_item, None, TypePair::new(source_key, dest_key), entry_kind)?;
        let value_body = self.sub_map(
            value_item,
            None,
            TypePair::new(source_value, dest_value),
            entry_kind,
        )?;

        let fresh = self.push(
            Node::MapEntries {
                source,
                key,
                value,
                key_body,
                value_body,
                ty: dest_ty,
            },
            dest_ty,
        );
        match (kind, target) {
            (MapKind::MapToTarget, Some(target)) => {
                let merge = self.push(
                    Node::PopulateEntries {
                        source,
                        target,
                        key,
                        value,
                        key_body,
                        value_body,
                    },
                    dest_ty,
                );
                Ok(self.into_existing(source, target, fresh, merge, pair.destination))
            }
            _ => Ok(fresh),
        }
    }

    fn class_to_dictionary(
        &mut self,
        source: NodeId,
        pair: TypePair,
        kind: MapKind,
        dest_value: TypeId,
        settings: &Settings,
    ) -> Result<NodeId, CompileError> {
        let source_ty = self.registry.unwrap_nullable(pair.source);
        let dest_ty = self.registry.unwrap_nullable(pair.destination);
        let adapt_ignore = self.registry.name(ADAPT_IGNORE);
        let visibility = settings.visibility();
        let members: Vec<_> = self
            .registry
            .members(source_ty)
            .iter()
            .filter(|m| {
                m.readable
                    && m.kind != MemberKind::CtorParam
                    && m.is_visible(visibility)
                    && m.annotation(adapt_ignore).is_none()
                    && settings.ignored(m.name).is_none()
            })
            .cloned()
            .collect();

        let entry_kind = nested_kind(kind);
        let mut entries = Vec::with_capacity(members.len());
        for member in &members {
            let read = self.push(
                Node::Member {
                    target: source,
                    member: member.name,
                },
                member.ty,
            );
            let value = self.sub_map(read, None, TypePair::new(member.ty, dest_value), entry_kind)?;
            entries.push(Binding {
                member: member.name,
                value,
            });
        }
        let entries = self.arena.push_bindings(&entries);
        let init = self.push(
            Node::DictInit {
                ty: dest_ty,
                entries,
            },
            dest_ty,
        );
        Ok(self.null_guard(source, init, pair.destination))
    }

    /// Element-wise map preserving dimensions.
    pub(super) fn map_grid(
        &mut self,
        source: NodeId,
        pair: TypePair,
        kind: MapKind,
    ) -> Result<NodeId, CompileError> {
        let dest_ty = self.registry.unwrap_nullable(pair.destination);
        let source_elem = self.element_of(pair.source);
        let dest_elem = self.element_of(pair.destination);

        let element = self.arena.new_local();
        let item = self.push(Node::Local(element), source_elem);
        let body = self.sub_map(
            item,
            None,
            TypePair::new(source_elem, dest_elem),
            nested_kind(kind),
        )?;
        Ok(self.push(
            Node::MapGrid {
                source,
                element,
                body,
                ty: dest_ty,
            },
            dest_ty,
        ))
    }

    /// `if target is null { fresh } else { merge }`, with a null source
    /// mapping to null either way.
    fn into_existing(
        &mut self,
        source: NodeId,
        target: NodeId,
        fresh: NodeId,
        merge: NodeId,
        ty: TypeId,
    ) -> NodeId {
        let missing = self.unary(UnaryOp::IsNull, target);
        let chosen = self.conditional(missing, fresh, merge, ty);
        self.null_guard(source, chosen, ty)
    }

    /// Element type of a sequence or array; `object` when unknown.
    fn element_of(&self, ty: TypeId) -> TypeId {
        self.registry
            .kind(self.registry.unwrap_nullable(ty))
            .and_then(TypeKind::element)
            .unwrap_or(TypeId::OBJECT)
    }
}
