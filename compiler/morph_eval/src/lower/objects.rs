//! Member access, construction, assignment, and reference preservation.

use std::sync::Arc;

use morph_ir::{BindingRange, EvalError, LocalId, MatcherId, Name, NodeId, TypeId, TypePair, Value};
use smallvec::SmallVec;

use crate::compiled::{thunk, Thunk};
use crate::errors::LowerError;

use super::Lowerer;

impl Lowerer<'_> {
    pub(super) fn lower_member(&mut self, target: NodeId, member: Name) -> Result<Thunk, LowerError> {
        let target = self.lower_node(target)?;
        Ok(thunk(move |frame| target(frame)?.member(member)))
    }

    /// String-keyed lookup. A missing key reads as `Null`, like a missing
    /// member.
    pub(super) fn lower_dict_lookup(
        &mut self,
        target: NodeId,
        key: Name,
        matcher: MatcherId,
    ) -> Result<Thunk, LowerError> {
        let target = self.lower_node(target)?;
        let key: Arc<str> = Arc::from(self.registry.text(key));
        let matcher = matcher
            .is_valid()
            .then(|| self.graph.arena.matcher(matcher).clone());
        Ok(thunk(move |frame| match target(frame)? {
            Value::Null => Ok(Value::Null),
            Value::Dict(dict) => {
                let dict = dict.read();
                let found = dict.entries.iter().find(|(k, _)| match (k.as_str(), &matcher) {
                    (Some(k), Some(matcher)) => matcher.apply(k) == *key,
                    (Some(k), None) => k == &*key,
                    (None, _) => false,
                });
                Ok(found.map_or(Value::Null, |(_, v)| v.clone()))
            }
            other => Err(EvalError::mismatch("dict", &other)),
        }))
    }

    pub(super) fn lower_construct(&self, ty: TypeId) -> Result<Thunk, LowerError> {
        self.check_type(ty)?;
        let registry = Arc::clone(self.registry);
        Ok(thunk(move |_| Ok(registry.instantiate(ty))))
    }

    /// Construct with initializers: members not named by a binding keep
    /// their default values.
    pub(super) fn lower_init(&mut self, ty: TypeId, bindings: BindingRange) -> Result<Thunk, LowerError> {
        self.check_type(ty)?;
        let registry = Arc::clone(self.registry);
        let inits = self.lower_bindings(bindings)?;
        Ok(thunk(move |frame| {
            let mut fields = SmallVec::<[(Name, Value); 8]>::with_capacity(inits.len());
            for (member, init) in &inits {
                fields.push((*member, init(frame)?));
            }
            let instance = registry.instantiate(ty);
            for (member, value) in fields {
                instance.set_member(member, value)?;
            }
            Ok(instance)
        }))
    }

    pub(super) fn lower_dict_init(&mut self, ty: TypeId, entries: BindingRange) -> Result<Thunk, LowerError> {
        self.check_type(ty)?;
        let keys: Vec<Value> = self
            .graph
            .arena
            .bindings(entries)
            .iter()
            .map(|b| Value::string(self.registry.text(b.member)))
            .collect();
        let inits = self.lower_bindings(entries)?;
        Ok(thunk(move |frame| {
            let mut pairs = Vec::with_capacity(inits.len());
            for (key, (_, init)) in keys.iter().zip(&inits) {
                pairs.push((key.clone(), init(frame)?));
            }
            Ok(Value::dict(ty, pairs))
        }))
    }

    fn lower_bindings(&mut self, range: BindingRange) -> Result<Vec<(Name, Thunk)>, LowerError> {
        let graph = self.graph;
        graph
            .arena
            .bindings(range)
            .iter()
            .map(|b| Ok((b.member, self.lower_node(b.value)?)))
            .collect()
    }

    /// The target is evaluated before the value, so writing through a null
    /// destination fails without running the value's side effects.
    pub(super) fn lower_assign(
        &mut self,
        target: NodeId,
        member: Name,
        value: NodeId,
    ) -> Result<Thunk, LowerError> {
        let target = self.lower_node(target)?;
        let value = self.lower_node(value)?;
        let registry = Arc::clone(self.registry);
        Ok(thunk(move |frame| {
            let instance = target(frame)?;
            if instance.is_null() {
                return Err(EvalError::NullTarget {
                    member: registry.text(member).to_owned(),
                });
            }
            instance.set_member(member, value(frame)?)?;
            Ok(Value::Null)
        }))
    }

    /// The destination is registered under the source's identity before
    /// `populate` runs, so a cycle back to the same source finds it.
    pub(super) fn lower_preserve(
        &mut self,
        source: NodeId,
        pair: TypePair,
        local: LocalId,
        construct: NodeId,
        populate: NodeId,
    ) -> Result<Thunk, LowerError> {
        let source = self.lower_node(source)?;
        let construct = self.lower_node(construct)?;
        let populate = self.lower_node(populate)?;
        Ok(thunk(move |frame| {
            let identity = source(frame)?.identity();
            if let Some(existing) = identity.and_then(|id| frame.ctx.references.get(&(id, pair))) {
                return Ok(existing.clone());
            }
            let destination = construct(frame)?;
            if let Some(id) = identity {
                frame.ctx.references.insert((id, pair), destination.clone());
            }
            frame.set_local(local, destination.clone());
            populate(frame)?;
            Ok(destination)
        }))
    }
}
