//! Statements, branches, and operators.

use morph_ir::{BinaryOp, LocalId, NodeId, NodeRange, UnaryOp, Value};
use smallvec::SmallVec;

use crate::compiled::{thunk, Thunk};
use crate::errors::LowerError;
use crate::operators::{evaluate_binary, evaluate_unary};

use super::{truth, Lowerer};

impl Lowerer<'_> {
    pub(super) fn lower_let(&mut self, local: LocalId, value: NodeId) -> Result<Thunk, LowerError> {
        let value = self.lower_node(value)?;
        Ok(thunk(move |frame| {
            let v = value(frame)?;
            frame.set_local(local, v);
            Ok(Value::Null)
        }))
    }

    pub(super) fn lower_block(&mut self, nodes: NodeRange) -> Result<Thunk, LowerError> {
        let graph = self.graph;
        let steps = graph
            .arena
            .list(nodes)
            .iter()
            .map(|&id| self.lower_node(id))
            .collect::<Result<SmallVec<[Thunk; 4]>, _>>()?;
        Ok(thunk(move |frame| {
            let mut last = Value::Null;
            for step in &steps {
                last = step(frame)?;
            }
            Ok(last)
        }))
    }

    pub(super) fn lower_conditional(
        &mut self,
        cond: NodeId,
        then: NodeId,
        otherwise: NodeId,
    ) -> Result<Thunk, LowerError> {
        let cond = self.lower_node(cond)?;
        let then = self.lower_node(then)?;
        let otherwise = self.lower_node(otherwise)?;
        Ok(thunk(move |frame| {
            if truth(&cond(frame)?)? {
                then(frame)
            } else {
                otherwise(frame)
            }
        }))
    }

    pub(super) fn lower_binary(&mut self, op: BinaryOp, left: NodeId, right: NodeId) -> Result<Thunk, LowerError> {
        let left = self.lower_node(left)?;
        let right = self.lower_node(right)?;
        Ok(match op {
            BinaryOp::And => thunk(move |frame| {
                Ok(Value::Bool(truth(&left(frame)?)? && truth(&right(frame)?)?))
            }),
            BinaryOp::Or => thunk(move |frame| {
                Ok(Value::Bool(truth(&left(frame)?)? || truth(&right(frame)?)?))
            }),
            op => thunk(move |frame| {
                let l = left(frame)?;
                let r = right(frame)?;
                evaluate_binary(l, r, op)
            }),
        })
    }

    pub(super) fn lower_unary(&mut self, op: UnaryOp, operand: NodeId) -> Result<Thunk, LowerError> {
        let operand = self.lower_node(operand)?;
        Ok(thunk(move |frame| evaluate_unary(operand(frame)?, op)))
    }

    pub(super) fn lower_coalesce(&mut self, value: NodeId, fallback: NodeId) -> Result<Thunk, LowerError> {
        let value = self.lower_node(value)?;
        let fallback = self.lower_node(fallback)?;
        Ok(thunk(move |frame| match value(frame)? {
            Value::Null => fallback(frame),
            v => Ok(v),
        }))
    }
}
