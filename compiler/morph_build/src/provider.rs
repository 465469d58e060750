//! Source of effective settings for the builder.

use std::sync::Arc;

use morph_config::{ConfigError, Fork, Resolution, Resolver};
use morph_ir::{MapKind, TypePair};

/// Resolves effective settings for the pairs a build reaches.
///
/// The mapper implements this with a settings cache; a bare [`Resolver`]
/// resolves on every call.
pub trait SettingsProvider {
    fn settings_for(
        &self,
        pair: TypePair,
        kind: MapKind,
        fork: Option<&Fork>,
    ) -> Result<Arc<Resolution>, ConfigError>;
}

impl SettingsProvider for Resolver<'_> {
    fn settings_for(
        &self,
        pair: TypePair,
        kind: MapKind,
        fork: Option<&Fork>,
    ) -> Result<Arc<Resolution>, ConfigError> {
        self.resolve(pair, kind, fork).map(Arc::new)
    }
}
