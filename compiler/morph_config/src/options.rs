//! Mapper-wide options.

use crate::settings::Settings;

/// Options fixed when a mapper is created.
///
/// ```ignore
/// let options = MapperOptions::new()
///     .allow_implicit_destination_inheritance(true)
///     .require_explicit_mapping(true);
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MapperOptions {
    /// Let rules registered for a destination's base class apply to it.
    pub allow_implicit_destination_inheritance: bool,
    /// Compiling a class or record pair with no registered rule is an error.
    pub require_explicit_mapping: bool,
    /// Seed for the default rule; process-wide defaults when `None`.
    pub default_settings: Option<Settings>,
}

impl MapperOptions {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn allow_implicit_destination_inheritance(mut self, allow: bool) -> Self {
        self.allow_implicit_destination_inheritance = allow;
        self
    }

    #[must_use]
    pub fn require_explicit_mapping(mut self, require: bool) -> Self {
        self.require_explicit_mapping = require;
        self
    }

    #[must_use]
    pub fn default_settings(mut self, settings: Settings) -> Self {
        self.default_settings = Some(settings);
        self
    }
}
