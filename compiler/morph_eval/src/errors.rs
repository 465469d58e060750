//! Lowering errors.

use morph_ir::{NodeId, TypeId};

/// The graph could not be turned into closures.
///
/// The builder never produces these for well-formed input; they guard
/// against graphs assembled by hand.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum LowerError {
    #[error("node {0:?} is out of range")]
    InvalidNode(NodeId),

    #[error("type {0:?} is not registered")]
    UnknownType(TypeId),

    #[error("{node:?} requires {required}")]
    MissingOperand {
        node: NodeId,
        required: &'static str,
    },
}
