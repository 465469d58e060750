//! Morph Config - mapping rules and settings resolution.
//!
//! Configuration is a table of rules. Each rule pairs a priority function
//! with [`Settings`]; resolving a `(TypePair, MapKind)` scores every rule
//! and folds the applicable ones into one effective configuration that the
//! graph builder consumes.
//!
//! # Module Organization
//!
//! - `strategy`: name matching strategies
//! - `expr`: configuration expressions (`ValueExpr`)
//! - `settings`: `Settings` and its merge
//! - `adapter`: built-in adapter kinds, scores, and applicability
//! - `rule` / `table`: rules and the rule table
//! - `resolve`: scoring, folding, annotation-derived settings
//! - `options` / `defaults`: mapper options and process-wide defaults

mod adapter;
mod defaults;
mod errors;
mod expr;
mod options;
mod resolve;
mod rule;
mod settings;
mod strategy;
mod table;

pub use adapter::AdapterKind;
pub use defaults::{global_defaults, snapshot_global_defaults};
pub use errors::{display_pair, ConfigError};
pub use expr::ValueExpr;
pub use options::MapperOptions;
pub use resolve::{
    metadata_settings, Resolution, Resolver, ADAPT_IGNORE, ADAPT_MEMBER, ADAPT_SETTINGS,
};
pub use rule::{
    score_pair, score_side, KindSet, PriorityFn, Rule, RuleContext, RuleOrigin, DEFAULT_SCORE,
    METADATA_SCORE, PREDICATE_SCORE,
};
pub use settings::{EnumMapping, Fork, IgnoredMember, MemberResolver, Settings};
pub use strategy::NameMatchingStrategy;
pub use table::RuleTable;
