//! Runtime errors raised while a compiled mapping function executes.
//!
//! These propagate unchanged out of `adapt`/`adapt_to_target`: there is no
//! member-level retry or suppression, one failure aborts the whole call.

use crate::value::Value;

/// Result of evaluating a lowered graph node.
pub type EvalResult = Result<Value, EvalError>;

/// Runtime mapping failure.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum EvalError {
    /// A scalar could not be represented in the target type.
    #[error("cannot convert {value} to {target}")]
    Conversion { value: String, target: &'static str },

    /// A string did not parse as the target scalar.
    #[error("cannot parse {input:?} as {target}")]
    Parse { input: String, target: &'static str },

    /// String-to-enum conversion named no variant.
    #[error("enum {enum_name} has no variant named {variant:?}")]
    UnknownVariant { enum_name: String, variant: String },

    /// Integer-to-enum conversion matched no discriminant.
    #[error("enum {enum_name} has no variant with discriminant {discriminant}")]
    UnknownDiscriminant {
        enum_name: String,
        discriminant: i64,
    },

    /// Assignment into a null destination.
    #[error("cannot assign member {member} on a null destination")]
    NullTarget { member: String },

    /// A node received a value of the wrong runtime shape.
    #[error("expected {expected}, found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },

    #[error("division by zero")]
    DivisionByZero,

    #[error("integer overflow in {operation}")]
    Overflow { operation: &'static str },

    /// A host function (custom resolver, getter, hook) failed.
    #[error("host function {name} failed: {message}")]
    Host { name: String, message: String },

    /// Run-time dispatch needed a function that failed to compile.
    #[error("no mapping available: {0}")]
    Dispatch(String),
}

impl EvalError {
    /// Failure reported by a host function.
    pub fn host(name: impl Into<String>, message: impl Into<String>) -> Self {
        EvalError::Host {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Shape mismatch against the found value.
    pub fn mismatch(expected: &'static str, found: &Value) -> Self {
        EvalError::TypeMismatch {
            expected,
            found: found.kind_name(),
        }
    }
}
