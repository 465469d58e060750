//! Morph - compiled type-to-type object mapping.
//!
//! A [`Mapper`] owns a rule table over a host [`TypeRegistry`]. The first
//! request for a `(TypePair, MapKind)` resolves the effective settings,
//! builds a mapping graph, lowers it into closures, and caches the result;
//! later requests reuse the cached function.
//!
//! ```ignore
//! let mut registry = TypeRegistry::new();
//! let person = registry.class("Person").property("Name", TypeId::STR).register()?;
//! let dto = registry.class("PersonDto").property("Name", TypeId::STR).register()?;
//!
//! let mapper = Mapper::new(registry);
//! mapper.for_type(TypePair::new(person, dto))?.ignore(&["Secret"])?;
//! let copy = mapper.adapt(&source, TypePair::new(person, dto))?;
//! ```
//!
//! # Crates
//!
//! - `morph_types`: the registry hosts describe their types with
//! - `morph_config`: rules, settings, and priority resolution
//! - `morph_build`: graph construction
//! - `morph_eval`: lowering graphs into executable closures

mod errors;
mod mapper;
mod setter;

use std::sync::Once;

pub use errors::MapError;
pub use mapper::Mapper;
pub use setter::{ForkSetter, TypeAdapterSetter};

pub use morph_build::CompileError;
pub use morph_config::{
    global_defaults, ConfigError, EnumMapping, KindSet, MapperOptions, NameMatchingStrategy,
    RuleContext, Settings, ValueExpr,
};
pub use morph_eval::CompiledMap;
pub use morph_ir::{
    BinaryOp, EvalError, HostFn, MapGraph, MapKind, Name, NameConverter, TypeId, TypePair,
    UnaryOp, Value,
};
pub use morph_types::{AccessModifier, AccessSet, Annotation, TypeRegistry};

static TRACING_INIT: Once = Once::new();

/// Install a tracing subscriber filtered by `RUST_LOG`.
///
/// Does nothing unless `RUST_LOG` is set, and nothing after the first call.
/// Enable with `RUST_LOG=morph_build=debug` or `RUST_LOG=morphc=trace`.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        if std::env::var("RUST_LOG").is_ok() {
            let filter = EnvFilter::from_default_env();
            // Another subscriber installed by the host takes precedence.
            let _ = tracing_subscriber::registry()
                .with(fmt::layer().with_target(true).with_level(true))
                .with(filter)
                .try_init();
        }
    });
}
