//! Element loops over sequences, dictionaries, and grids.
//!
//! Loops iterate over a snapshot of the source items, so a body that
//! reaches the source collection again never observes a held lock.

use morph_ir::{EvalError, LocalId, NodeId, TypeId, Value};

use crate::compiled::{thunk, Frame, Thunk};
use crate::errors::LowerError;

use super::Lowerer;

impl Lowerer<'_> {
    pub(super) fn lower_map_sequence(
        &mut self,
        source: NodeId,
        element: LocalId,
        body: NodeId,
        ty: TypeId,
    ) -> Result<Thunk, LowerError> {
        self.check_type(ty)?;
        let source = self.lower_node(source)?;
        let body = self.lower_node(body)?;
        Ok(thunk(move |frame| {
            let items = match source(frame)? {
                Value::Null => return Ok(Value::Null),
                s => s.items()?,
            };
            Ok(Value::list(ty, map_items(frame, items, element, &body)?))
        }))
    }

    /// Clear the destination list and refill it in place.
    pub(super) fn lower_populate_sequence(
        &mut self,
        source: NodeId,
        target: NodeId,
        element: LocalId,
        body: NodeId,
    ) -> Result<Thunk, LowerError> {
        let source = self.lower_node(source)?;
        let target = self.lower_node(target)?;
        let body = self.lower_node(body)?;
        Ok(thunk(move |frame| {
            let destination = target(frame)?;
            let items = match source(frame)? {
                Value::Null => return Ok(destination),
                s => s.items()?,
            };
            let mapped = map_items(frame, items, element, &body)?;
            match &destination {
                Value::List(list) => {
                    let mut list = list.write();
                    list.items.clear();
                    list.items.extend(mapped);
                }
                other => return Err(EvalError::mismatch("list", other)),
            }
            Ok(destination)
        }))
    }

    pub(super) fn lower_map_entries(
        &mut self,
        source: NodeId,
        locals: [LocalId; 2],
        bodies: [NodeId; 2],
        ty: TypeId,
    ) -> Result<Thunk, LowerError> {
        self.check_type(ty)?;
        let source = self.lower_node(source)?;
        let bodies = [self.lower_node(bodies[0])?, self.lower_node(bodies[1])?];
        Ok(thunk(move |frame| {
            let Some(entries) = entries_of(&source(frame)?)? else {
                return Ok(Value::Null);
            };
            let out = Value::dict(ty, Vec::with_capacity(entries.len()));
            fill_entries(frame, &out, entries, locals, &bodies)?;
            Ok(out)
        }))
    }

    /// Insert converted entries into the destination dictionary, overwriting
    /// existing keys.
    pub(super) fn lower_populate_entries(
        &mut self,
        source: NodeId,
        target: NodeId,
        locals: [LocalId; 2],
        bodies: [NodeId; 2],
    ) -> Result<Thunk, LowerError> {
        let source = self.lower_node(source)?;
        let target = self.lower_node(target)?;
        let bodies = [self.lower_node(bodies[0])?, self.lower_node(bodies[1])?];
        Ok(thunk(move |frame| {
            let destination = target(frame)?;
            let Some(entries) = entries_of(&source(frame)?)? else {
                return Ok(destination);
            };
            fill_entries(frame, &destination, entries, locals, &bodies)?;
            Ok(destination)
        }))
    }

    /// Element-wise map that keeps the source dimensions.
    pub(super) fn lower_map_grid(
        &mut self,
        source: NodeId,
        element: LocalId,
        body: NodeId,
        ty: TypeId,
    ) -> Result<Thunk, LowerError> {
        self.check_type(ty)?;
        let source = self.lower_node(source)?;
        let body = self.lower_node(body)?;
        Ok(thunk(move |frame| {
            let (dims, items) = match source(frame)? {
                Value::Null => return Ok(Value::Null),
                Value::Grid(grid) => {
                    let grid = grid.read();
                    (grid.dims.clone(), grid.items.clone())
                }
                other => return Err(EvalError::mismatch("grid", &other)),
            };
            Ok(Value::grid(ty, dims, map_items(frame, items, element, &body)?))
        }))
    }
}

fn map_items(
    frame: &mut Frame<'_, '_>,
    items: Vec<Value>,
    element: LocalId,
    body: &Thunk,
) -> Result<Vec<Value>, EvalError> {
    let mut out = Vec::with_capacity(items.len());
    for item in items {
        frame.set_local(element, item);
        out.push(body(frame)?);
    }
    Ok(out)
}

/// Snapshot of a dictionary's entries; `None` for a null source.
fn entries_of(source: &Value) -> Result<Option<Vec<(Value, Value)>>, EvalError> {
    match source {
        Value::Null => Ok(None),
        Value::Dict(dict) => Ok(Some(dict.read().entries.clone())),
        other => Err(EvalError::mismatch("dict", other)),
    }
}

fn fill_entries(
    frame: &mut Frame<'_, '_>,
    destination: &Value,
    entries: Vec<(Value, Value)>,
    [key_local, value_local]: [LocalId; 2],
    [key_body, value_body]: &[Thunk; 2],
) -> Result<(), EvalError> {
    let Value::Dict(dict) = destination else {
        return Err(EvalError::mismatch("dict", destination));
    };
    for (key, value) in entries {
        frame.set_local(key_local, key);
        frame.set_local(value_local, value);
        let key = key_body(frame)?;
        let value = value_body(frame)?;
        dict.write().insert(key, value);
    }
    Ok(())
}
