//! The public error union.

use morph_build::CompileError;
use morph_config::ConfigError;
use morph_ir::EvalError;

/// Any failure surfaced by a [`Mapper`](crate::Mapper).
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum MapError {
    /// Rule registration failed.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The function for a pair could not be built.
    #[error(transparent)]
    Compile(#[from] CompileError),

    /// A compiled function failed while mapping.
    #[error(transparent)]
    Eval(#[from] EvalError),
}

impl MapError {
    /// The configuration error behind this failure, whether raised at
    /// registration or on first compile.
    pub fn config(&self) -> Option<&ConfigError> {
        match self {
            MapError::Config(err) => Some(err),
            MapError::Compile(err) => err.config(),
            MapError::Eval(_) => None,
        }
    }
}
