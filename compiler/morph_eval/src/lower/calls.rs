//! Host calls, conversions, and calls into other compiled functions.

use std::sync::Arc;

use morph_ir::{Conversion, HostFnId, MapKind, NodeId, NodeRange, TypeId, TypePair, Value};
use smallvec::SmallVec;

use crate::compiled::{thunk, Thunk};
use crate::convert;
use crate::errors::LowerError;

use super::Lowerer;

impl Lowerer<'_> {
    pub(super) fn lower_call(&mut self, func: HostFnId, args: NodeRange) -> Result<Thunk, LowerError> {
        let func = self.graph.arena.host_fn(func).clone();
        let graph = self.graph;
        let args = graph
            .arena
            .list(args)
            .iter()
            .map(|&id| self.lower_node(id))
            .collect::<Result<SmallVec<[Thunk; 2]>, _>>()?;
        Ok(thunk(move |frame| {
            let mut values = SmallVec::<[Value; 2]>::with_capacity(args.len());
            for arg in &args {
                values.push(arg(frame)?);
            }
            func.call(&values)
        }))
    }

    pub(super) fn lower_convert(&mut self, value: NodeId, conversion: Conversion) -> Result<Thunk, LowerError> {
        let value = self.lower_node(value)?;
        if conversion == Conversion::Identity {
            return Ok(value);
        }
        let registry = Arc::clone(self.registry);
        Ok(thunk(move |frame| convert::apply(&registry, value(frame)?, conversion)))
    }

    /// Call the cached function for `(pair, kind)`, resolved on each call
    /// so a function may invoke itself.
    pub(super) fn lower_invoke(
        &mut self,
        pair: TypePair,
        kind: MapKind,
        source: NodeId,
        target: NodeId,
    ) -> Result<Thunk, LowerError> {
        let source = self.lower_node(source)?;
        let target = self.lower_opt(target)?;
        Ok(thunk(move |frame| {
            let s = source(frame)?;
            let t = match &target {
                Some(target) => target(frame)?,
                None => Value::Null,
            };
            let function = frame.ctx.table.function(pair, kind)?;
            function.call(s, t, &mut *frame.ctx)
        }))
    }

    /// Dispatch on the value's runtime type. `Null` has no runtime type and
    /// maps to `Null`.
    pub(super) fn lower_dynamic(
        &mut self,
        value: NodeId,
        destination: TypeId,
        kind: MapKind,
        target: NodeId,
    ) -> Result<Thunk, LowerError> {
        self.check_type(destination)?;
        let value = self.lower_node(value)?;
        let target = self.lower_opt(target)?;
        Ok(thunk(move |frame| {
            let v = value(frame)?;
            if v.is_null() {
                return Ok(Value::Null);
            }
            let t = match &target {
                Some(target) => target(frame)?,
                None => Value::Null,
            };
            let pair = TypePair::new(v.runtime_type(), destination);
            let function = frame.ctx.table.function(pair, kind)?;
            function.call(v, t, &mut *frame.ctx)
        }))
    }
}
