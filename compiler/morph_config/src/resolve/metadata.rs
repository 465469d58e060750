//! Settings declared through type annotations.
//!
//! A type annotated `AdaptSettings(...)` contributes a rule for every pair
//! it takes part in, unless a rule is registered for that exact pair.
//! Destination annotations take precedence over source annotations.

use morph_ir::{TypePair, Value};
use morph_types::TypeRegistry;

use crate::settings::Settings;
use crate::strategy::NameMatchingStrategy;

/// Type annotation carrying settings.
pub const ADAPT_SETTINGS: &str = "AdaptSettings";
/// Member annotation: never map this member.
pub const ADAPT_IGNORE: &str = "AdaptIgnore";
/// Member annotation: read the value from the source member named by the
/// `name` argument.
pub const ADAPT_MEMBER: &str = "AdaptMember";

/// Settings derived from `AdaptSettings` annotations on either side.
pub fn metadata_settings(registry: &TypeRegistry, pair: TypePair) -> Option<Settings> {
    let key = registry.name(ADAPT_SETTINGS);
    let mut found = false;
    let mut settings = Settings::default();

    for ty in [pair.destination, pair.source] {
        let Some(annotation) = registry.get(ty).and_then(|e| e.annotation(key)) else {
            continue;
        };
        found = true;
        let mut declared = Settings::default();
        for (arg, value) in &annotation.args {
            match (registry.text(*arg), value) {
                ("ignore_null_values", Value::Bool(b)) => declared.ignore_null_values = Some(*b),
                ("preserve_reference", Value::Bool(b)) => declared.preserve_reference = Some(*b),
                ("name_matching", Value::Str(s)) => {
                    declared.name_matching = NameMatchingStrategy::preset(s);
                }
                ("max_depth", Value::Int(n)) => declared.max_depth = u32::try_from(*n).ok(),
                (other, _) => {
                    tracing::warn!(argument = other, "ignoring unknown AdaptSettings argument");
                }
            }
        }
        settings.merge_from(&declared, false);
    }

    found.then_some(settings)
}
