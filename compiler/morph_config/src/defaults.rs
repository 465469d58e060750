//! Process-wide default settings.
//!
//! A narrowly scoped fallback: each new mapper snapshots these into its
//! default rule unless its options provide their own. Later changes do not
//! affect mappers that already exist.

use std::sync::OnceLock;

use parking_lot::RwLock;

use crate::settings::Settings;

static GLOBAL_DEFAULTS: OnceLock<RwLock<Settings>> = OnceLock::new();

/// The process-wide default settings.
pub fn global_defaults() -> &'static RwLock<Settings> {
    GLOBAL_DEFAULTS.get_or_init(|| RwLock::new(Settings::default()))
}

/// Snapshot of the process-wide defaults.
pub fn snapshot_global_defaults() -> Settings {
    global_defaults().read().clone()
}
