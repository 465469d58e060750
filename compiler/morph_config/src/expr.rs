//! Configuration expressions.
//!
//! Custom resolvers, conditions, construction overrides, converter
//! overrides, and value transforms are small expression trees over the
//! source (and, for merges, the destination). The graph builder lowers them
//! into graph nodes; they are never evaluated directly.

use morph_ir::{BinaryOp, HostFn, Name, UnaryOp, Value};

/// An expression supplied by configuration.
#[derive(Clone, Debug, PartialEq)]
pub enum ValueExpr {
    /// The source instance being mapped.
    Source,
    /// The destination being populated; `Null` outside `MapToTarget`.
    Destination,
    /// The value being transformed (value transforms only).
    Arg,
    /// Member read; reading through null yields null.
    Member(Box<ValueExpr>, Name),
    Literal(Value),
    Binary(BinaryOp, Box<ValueExpr>, Box<ValueExpr>),
    Unary(UnaryOp, Box<ValueExpr>),
    /// Host function call.
    Call(HostFn, Vec<ValueExpr>),
    Conditional {
        cond: Box<ValueExpr>,
        then: Box<ValueExpr>,
        otherwise: Box<ValueExpr>,
    },
}

impl ValueExpr {
    #[inline]
    pub fn source() -> Self {
        ValueExpr::Source
    }

    /// A member path from the source: `path(&[a, b])` reads `source.a.b`.
    pub fn path(names: &[Name]) -> Self {
        names
            .iter()
            .fold(ValueExpr::Source, |expr, &name| expr.member(name))
    }

    pub fn literal(value: impl Into<Value>) -> Self {
        ValueExpr::Literal(value.into())
    }

    /// Call `func` with the source as its only argument.
    pub fn call(func: HostFn) -> Self {
        ValueExpr::Call(func, vec![ValueExpr::Source])
    }

    #[must_use]
    pub fn member(self, name: Name) -> Self {
        ValueExpr::Member(Box::new(self), name)
    }

    #[must_use]
    pub fn binary(self, op: BinaryOp, rhs: ValueExpr) -> Self {
        ValueExpr::Binary(op, Box::new(self), Box::new(rhs))
    }

    #[must_use]
    pub fn equals(self, rhs: ValueExpr) -> Self {
        self.binary(BinaryOp::Eq, rhs)
    }

    #[must_use]
    pub fn is_null(self) -> Self {
        ValueExpr::Unary(UnaryOp::IsNull, Box::new(self))
    }

    #[must_use]
    pub fn is_not_null(self) -> Self {
        ValueExpr::Unary(UnaryOp::IsNotNull, Box::new(self))
    }

    #[must_use]
    pub fn logical_not(self) -> Self {
        ValueExpr::Unary(UnaryOp::Not, Box::new(self))
    }

    pub fn conditional(cond: ValueExpr, then: ValueExpr, otherwise: ValueExpr) -> Self {
        ValueExpr::Conditional {
            cond: Box::new(cond),
            then: Box::new(then),
            otherwise: Box::new(otherwise),
        }
    }

    /// Returns `true` if any sub-expression calls a host function.
    pub fn calls_host(&self) -> bool {
        match self {
            ValueExpr::Call(..) => true,
            ValueExpr::Source | ValueExpr::Destination | ValueExpr::Arg | ValueExpr::Literal(_) => {
                false
            }
            ValueExpr::Member(inner, _) | ValueExpr::Unary(_, inner) => inner.calls_host(),
            ValueExpr::Binary(_, l, r) => l.calls_host() || r.calls_host(),
            ValueExpr::Conditional {
                cond,
                then,
                otherwise,
            } => cond.calls_host() || then.calls_host() || otherwise.calls_host(),
        }
    }
}
