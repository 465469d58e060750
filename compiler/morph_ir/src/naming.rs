//! Member-name conversions used by name matching.
//!
//! A [`NameConverter`] maps a member name into the comparison space of a
//! name matching strategy. Two members match when their converted names are
//! equal. Converters live here rather than in the configuration crate because
//! compiled graphs carry them into run time for flexible dictionary lookups.

use std::fmt;
use std::sync::Arc;

/// Signature of a host-supplied name conversion.
pub type NameConvertFn = dyn Fn(&str) -> String + Send + Sync;

/// A pure `str -> String` member-name transform.
#[derive(Clone)]
pub enum NameConverter {
    /// Leave the name unchanged.
    Identity,
    /// `full_name`, `fullName`, `Full_Name` all become `FullName`.
    PascalCase,
    /// `FullName`, `full_name` become `fullName`.
    CamelCase,
    /// Lowercase the whole name.
    LowerCase,
    /// Host-supplied conversion; compared by label and function identity.
    Custom {
        label: Arc<str>,
        func: Arc<NameConvertFn>,
    },
}

impl NameConverter {
    /// Wrap a host conversion.
    pub fn custom(
        label: impl Into<Arc<str>>,
        func: impl Fn(&str) -> String + Send + Sync + 'static,
    ) -> Self {
        NameConverter::Custom {
            label: label.into(),
            func: Arc::new(func),
        }
    }

    /// Convert a member name into comparison space.
    pub fn apply(&self, name: &str) -> String {
        match self {
            NameConverter::Identity => name.to_owned(),
            NameConverter::PascalCase => to_pascal_case(name),
            NameConverter::CamelCase => to_camel_case(name),
            NameConverter::LowerCase => name.to_lowercase(),
            NameConverter::Custom { func, .. } => func(name),
        }
    }

    #[inline]
    pub fn is_identity(&self) -> bool {
        matches!(self, NameConverter::Identity)
    }

    pub fn label(&self) -> &str {
        match self {
            NameConverter::Identity => "identity",
            NameConverter::PascalCase => "pascal",
            NameConverter::CamelCase => "camel",
            NameConverter::LowerCase => "lower",
            NameConverter::Custom { label, .. } => label,
        }
    }
}

impl PartialEq for NameConverter {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (NameConverter::Identity, NameConverter::Identity)
            | (NameConverter::PascalCase, NameConverter::PascalCase)
            | (NameConverter::CamelCase, NameConverter::CamelCase)
            | (NameConverter::LowerCase, NameConverter::LowerCase) => true,
            (
                NameConverter::Custom { label: a, func: fa },
                NameConverter::Custom { label: b, func: fb },
            ) => a == b && Arc::ptr_eq(fa, fb),
            _ => false,
        }
    }
}

impl fmt::Debug for NameConverter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NameConverter({})", self.label())
    }
}

fn is_separator(c: char) -> bool {
    matches!(c, '_' | '-' | ' ' | '.')
}

/// Split a member name into words at separators and case boundaries.
///
/// Boundaries: `lower|Upper`, `digit|Upper`, and the last capital of an
/// acronym run followed by a lowercase letter (`HTTP|Server`).
pub fn split_words(name: &str) -> Vec<&str> {
    let mut words = Vec::new();
    let mut start: Option<usize> = None;
    let chars: Vec<(usize, char)> = name.char_indices().collect();

    for (pos, &(offset, c)) in chars.iter().enumerate() {
        if is_separator(c) {
            if let Some(s) = start.take() {
                words.push(&name[s..offset]);
            }
            continue;
        }

        if let Some(s) = start {
            let prev = chars[pos - 1].1;
            let next = chars.get(pos + 1).map(|&(_, n)| n);
            let boundary = c.is_uppercase()
                && (prev.is_lowercase()
                    || prev.is_ascii_digit()
                    || (prev.is_uppercase() && next.is_some_and(char::is_lowercase)));
            if boundary {
                words.push(&name[s..offset]);
                start = Some(offset);
            }
        } else {
            start = Some(offset);
        }
    }

    if let Some(s) = start {
        words.push(&name[s..]);
    }
    words
}

fn capitalize(word: &str, out: &mut String) {
    let mut chars = word.chars();
    if let Some(first) = chars.next() {
        out.extend(first.to_uppercase());
        out.push_str(chars.as_str());
    }
}

/// `full_name` -> `FullName`. Letters after the first of each word keep
/// their case, so the conversion is idempotent.
pub fn to_pascal_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for word in split_words(name) {
        capitalize(word, &mut out);
    }
    out
}

/// `FullName` -> `fullName`.
pub fn to_camel_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for (i, word) in split_words(name).into_iter().enumerate() {
        if i == 0 {
            let mut chars = word.chars();
            if let Some(first) = chars.next() {
                out.extend(first.to_lowercase());
                out.push_str(chars.as_str());
            }
        } else {
            capitalize(word, &mut out);
        }
    }
    out
}
