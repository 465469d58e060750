//! Name matching strategies.
//!
//! A strategy is a pair of [`NameConverter`]s: one applied to source member
//! names, one to destination member names. Two members denote the same
//! logical field when their converted names are equal.

use std::sync::Arc;

use morph_ir::NameConverter;

/// Pair of member-name transforms deciding which members correspond.
#[derive(Clone, Debug, PartialEq)]
pub struct NameMatchingStrategy {
    pub source: NameConverter,
    pub destination: NameConverter,
}

impl NameMatchingStrategy {
    /// Names must be identical.
    pub const EXACT: NameMatchingStrategy = NameMatchingStrategy {
        source: NameConverter::Identity,
        destination: NameConverter::Identity,
    };

    /// Casing and separators are normalized on both sides, so `Full_Name`,
    /// `full_name`, and `FullName` all match.
    pub const FLEXIBLE: NameMatchingStrategy = NameMatchingStrategy {
        source: NameConverter::PascalCase,
        destination: NameConverter::PascalCase,
    };

    /// Case-insensitive comparison.
    pub const IGNORE_CASE: NameMatchingStrategy = NameMatchingStrategy {
        source: NameConverter::LowerCase,
        destination: NameConverter::LowerCase,
    };

    /// `PascalCase` source members to `camelCase` destination members.
    pub const TO_CAMEL_CASE: NameMatchingStrategy = NameMatchingStrategy {
        source: NameConverter::CamelCase,
        destination: NameConverter::Identity,
    };

    /// `camelCase` source members to `PascalCase` destination members.
    pub const FROM_CAMEL_CASE: NameMatchingStrategy = NameMatchingStrategy {
        source: NameConverter::Identity,
        destination: NameConverter::CamelCase,
    };

    pub fn new(source: NameConverter, destination: NameConverter) -> Self {
        NameMatchingStrategy {
            source,
            destination,
        }
    }

    /// Look up a preset by its configuration name (`exact`, `flexible`,
    /// `ignore_case`, `to_camel_case`, `from_camel_case`).
    pub fn preset(name: &str) -> Option<Self> {
        match name {
            "exact" => Some(Self::EXACT),
            "flexible" => Some(Self::FLEXIBLE),
            "ignore_case" => Some(Self::IGNORE_CASE),
            "to_camel_case" => Some(Self::TO_CAMEL_CASE),
            "from_camel_case" => Some(Self::FROM_CAMEL_CASE),
            _ => None,
        }
    }

    #[inline]
    pub fn convert_source(&self, name: &str) -> String {
        self.source.apply(name)
    }

    #[inline]
    pub fn convert_destination(&self, name: &str) -> String {
        self.destination.apply(name)
    }

    pub fn matches(&self, source_name: &str, destination_name: &str) -> bool {
        self.convert_source(source_name) == self.convert_destination(destination_name)
    }

    /// Both sides are the identity transform.
    pub fn is_exact(&self) -> bool {
        self.source.is_identity() && self.destination.is_identity()
    }

    /// Apply `next` after the current source-side transform.
    #[must_use]
    pub fn then_source(self, next: NameConverter) -> Self {
        NameMatchingStrategy {
            source: chain(self.source, next),
            destination: self.destination,
        }
    }

    /// Apply `next` after the current destination-side transform.
    #[must_use]
    pub fn then_destination(self, next: NameConverter) -> Self {
        NameMatchingStrategy {
            source: self.source,
            destination: chain(self.destination, next),
        }
    }
}

impl Default for NameMatchingStrategy {
    fn default() -> Self {
        Self::EXACT
    }
}

fn chain(first: NameConverter, second: NameConverter) -> NameConverter {
    if first.is_identity() {
        return second;
    }
    if second.is_identity() {
        return first;
    }
    let label: Arc<str> = format!("{}+{}", first.label(), second.label()).into();
    NameConverter::custom(label, move |name| second.apply(&first.apply(name)))
}
