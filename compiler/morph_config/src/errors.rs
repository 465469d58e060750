//! Configuration errors.
//!
//! Raised while registering rules or on the first compile of a pair; never
//! swallowed. Type names are rendered at creation so errors outlive the
//! registry that produced them.

use morph_ir::{MapKind, TypePair};
use morph_types::TypeRegistry;

/// Configuration failure.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// Two distinct rules tie for the top score of a pair.
    #[error("ambiguous rules for {pair}: `{first}` and `{second}` both score {score}")]
    AmbiguousRules {
        pair: String,
        first: String,
        second: String,
        score: i32,
    },

    /// A record-shaped destination has no single constructor whose
    /// parameters can all be resolved.
    #[error("no single matching constructor for `{ty}` ({candidates} candidates)")]
    NoMatchingConstructor { ty: String, candidates: usize },

    /// A projection reaches a cyclic type graph without `max_depth`.
    #[error("projection of {pair} is unbounded: cyclic types need max_depth")]
    UnboundedProjection { pair: String },

    /// A rule was modified after a compiled function consumed it.
    #[error("rule for {pair} is already compiled; invalidate it or use new_config")]
    RuleAlreadyCompiled { pair: String },

    #[error("no adapter can {kind} {pair}")]
    NoApplicableAdapter { pair: String, kind: MapKind },

    /// A configured member path names a member that does not exist.
    #[error("type `{ty}` has no member `{member}`")]
    UnknownMember { ty: String, member: String },

    /// Strict mode: a writable destination member resolved to nothing.
    #[error("destination member `{member}` of {pair} has no source")]
    UnmappedMember { pair: String, member: String },

    #[error("cannot convert `{from}` to `{to}`")]
    UnsupportedConversion { from: String, to: String },

    /// Explicit-mapping mode: a class pair was compiled without a rule.
    #[error("{pair} has no explicit mapping rule")]
    UnregisteredPair { pair: String },
}

/// `Source -> Destination` with registry names.
pub fn display_pair(registry: &TypeRegistry, pair: TypePair) -> String {
    format!(
        "{} -> {}",
        registry.type_name(pair.source),
        registry.type_name(pair.destination)
    )
}
