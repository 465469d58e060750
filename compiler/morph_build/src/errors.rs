//! Compile errors.

use morph_config::{display_pair, ConfigError};
use morph_ir::{MapKind, TypePair};
use morph_types::TypeRegistry;

/// Why a graph could not be built or lowered.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum BuildFailure {
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The execution backend rejected the graph.
    #[error("lowering failed: {0}")]
    Lower(String),
}

/// A failure building or lowering the function for one pair and kind.
///
/// `pair` is the innermost pair being built when the failure occurred,
/// which for nested members differs from the requested pair.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("cannot compile {kind} for {pair_name}: {cause}")]
pub struct CompileError {
    pub pair: TypePair,
    pub kind: MapKind,
    pub pair_name: String,
    pub cause: BuildFailure,
}

impl CompileError {
    pub fn new(
        registry: &TypeRegistry,
        pair: TypePair,
        kind: MapKind,
        cause: impl Into<BuildFailure>,
    ) -> Self {
        CompileError {
            pair,
            kind,
            pair_name: display_pair(registry, pair),
            cause: cause.into(),
        }
    }

    /// A backend failure.
    pub fn lowering(registry: &TypeRegistry, pair: TypePair, kind: MapKind, message: String) -> Self {
        Self::new(registry, pair, kind, BuildFailure::Lower(message))
    }

    /// The configuration error behind this failure, if any.
    pub fn config(&self) -> Option<&ConfigError> {
        match &self.cause {
            BuildFailure::Config(err) => Some(err),
            BuildFailure::Lower(_) => None,
        }
    }
}
