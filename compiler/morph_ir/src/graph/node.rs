//! Graph node kinds.
//!
//! Every node is `Copy`: children are `NodeId`s, lists are ranges into the
//! arena, and payloads that are not `Copy` (constants, host functions, name
//! converters) live in side tables indexed by ID.

use crate::{MapKind, Name, TypeId, TypePair};

use super::ids::{BindingRange, ConstId, HostFnId, LocalId, MatcherId, NodeId, NodeRange};
use super::ops::{BinaryOp, UnaryOp};

/// Parameter of a compiled function.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Param {
    Source,
    /// The caller-supplied destination (`MapToTarget` only).
    Destination,
}

/// A member initializer: `member = value`. For dictionary initializers the
/// member name is the string key.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Binding {
    pub member: Name,
    pub value: NodeId,
}

/// Scalar conversion selected at build time.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Conversion {
    Identity,
    /// Between bool, int, float, char, and timestamp.
    Scalar { to: TypeId },
    /// Any scalar or enum to its string form.
    ToStr,
    /// String to a builtin scalar.
    Parse { to: TypeId },
    EnumToStr,
    StrToEnum { to: TypeId },
    EnumToInt,
    IntToEnum { to: TypeId },
    EnumToEnum { to: TypeId, by_value: bool },
}

impl Conversion {
    /// Whether the scalar conversion `from -> to` is defined.
    ///
    /// Numeric types convert freely among themselves; `bool` converts to and
    /// from numbers; `char` converts to and from `int`; `timestamp` converts
    /// to and from `int`.
    pub fn scalar_supported(from: TypeId, to: TypeId) -> bool {
        if from == to {
            return from.is_builtin_scalar();
        }
        let numeric = |t: TypeId| t == TypeId::INT || t == TypeId::FLOAT;
        match (from, to) {
            (f, t) if numeric(f) && numeric(t) => true,
            (TypeId::BOOL, t) | (t, TypeId::BOOL) => numeric(t),
            (TypeId::CHAR, TypeId::INT)
            | (TypeId::INT, TypeId::CHAR)
            | (TypeId::TIMESTAMP, TypeId::INT)
            | (TypeId::INT, TypeId::TIMESTAMP) => true,
            _ => false,
        }
    }
}

/// Expression graph node.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Node {
    /// Function parameter.
    Param(Param),
    /// Read a local slot.
    Local(LocalId),
    /// Constant from the pool.
    Literal(ConstId),
    /// Type-appropriate zero value (null for reference types).
    Default(TypeId),
    /// No value; the result of statements.
    Unit,

    /// Read a member. Reading through null yields null.
    Member { target: NodeId, member: Name },
    /// Invoke a host function (getter methods, callbacks, hooks).
    Call { func: HostFnId, args: NodeRange },
    /// Keyed lookup in a string-keyed dictionary. With a valid `matcher`,
    /// each key is converted before comparison against `key`.
    DictLookup {
        target: NodeId,
        key: Name,
        matcher: MatcherId,
    },
    /// Scalar conversion; null converts to null.
    Convert {
        value: NodeId,
        conversion: Conversion,
    },

    /// Default-construct an instance.
    Construct { ty: TypeId },
    /// Construct with member initializers (records, projections).
    Init { ty: TypeId, bindings: BindingRange },
    /// Build a string-keyed dictionary from initializers.
    DictInit { ty: TypeId, entries: BindingRange },
    /// Write a member of an object in place.
    Assign {
        target: NodeId,
        member: Name,
        value: NodeId,
    },
    /// Bind a local slot; evaluates to `Unit`.
    Let { local: LocalId, value: NodeId },
    /// Evaluate in order; the result is the last node's.
    Block { nodes: NodeRange },
    Conditional {
        cond: NodeId,
        then: NodeId,
        otherwise: NodeId,
    },
    Binary {
        op: BinaryOp,
        left: NodeId,
        right: NodeId,
    },
    Unary { op: UnaryOp, operand: NodeId },
    /// `value` unless it is null, else `fallback`.
    Coalesce { value: NodeId, fallback: NodeId },

    /// Loop over a sequence producing a new list of type `ty`.
    MapSequence {
        source: NodeId,
        element: LocalId,
        body: NodeId,
        ty: TypeId,
    },
    /// Clear `target` and refill it from `source`; evaluates to `target`.
    PopulateSequence {
        source: NodeId,
        target: NodeId,
        element: LocalId,
        body: NodeId,
    },
    /// Loop over dictionary entries producing a new dictionary of type `ty`.
    MapEntries {
        source: NodeId,
        key: LocalId,
        value: LocalId,
        key_body: NodeId,
        value_body: NodeId,
        ty: TypeId,
    },
    /// Insert converted entries of `source` into `target`; evaluates to `target`.
    PopulateEntries {
        source: NodeId,
        target: NodeId,
        key: LocalId,
        value: LocalId,
        key_body: NodeId,
        value_body: NodeId,
    },
    /// Element-wise map of a multi-dimensional array, preserving dimensions.
    MapGrid {
        source: NodeId,
        element: LocalId,
        body: NodeId,
        ty: TypeId,
    },

    /// By-reference call of the cached function for `(pair, kind)`.
    /// `target` is `INVALID` unless `kind` is `MapToTarget`.
    Invoke {
        pair: TypePair,
        kind: MapKind,
        source: NodeId,
        target: NodeId,
    },
    /// Dispatch on the runtime type of `value` to the cached function for
    /// `(runtime type, destination)`.
    Dynamic {
        value: NodeId,
        destination: TypeId,
        kind: MapKind,
        target: NodeId,
    },
    /// Reference preservation: return the destination already produced for
    /// `source` in this call, else evaluate `construct`, register it, bind it
    /// to `local`, evaluate `populate`, and return it.
    Preserve {
        source: NodeId,
        pair: TypePair,
        local: LocalId,
        construct: NodeId,
        populate: NodeId,
    },
}

impl Node {
    /// Returns `true` for nodes that call through function indirection,
    /// which external query providers cannot translate.
    pub fn is_indirect(&self) -> bool {
        matches!(self, Node::Invoke { .. } | Node::Dynamic { .. })
    }
}
