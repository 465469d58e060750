//! The `(source, destination)` key of mapping configuration and caches.

use std::fmt;

use crate::TypeId;

/// Source/destination type identity.
///
/// Every rule, cached settings snapshot, and compiled function is keyed by a
/// `TypePair` (plus a [`MapKind`] for compiled artifacts).
#[derive(Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct TypePair {
    pub source: TypeId,
    pub destination: TypeId,
}

impl TypePair {
    #[inline]
    pub const fn new(source: TypeId, destination: TypeId) -> Self {
        TypePair {
            source,
            destination,
        }
    }

    /// The pair mapping in the opposite direction.
    #[inline]
    pub const fn reversed(self) -> Self {
        TypePair {
            source: self.destination,
            destination: self.source,
        }
    }

    /// Returns `true` when source and destination are the same type.
    #[inline]
    pub fn is_identity(self) -> bool {
        self.source == self.destination
    }
}

impl fmt::Debug for TypePair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} -> {:?}", self.source, self.destination)
    }
}

/// How the compiled function produces its destination.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Ord, PartialOrd)]
pub enum MapKind {
    /// Construct a new destination.
    Map,
    /// Merge into an existing destination.
    MapToTarget,
    /// Build a translatable graph for an external query provider.
    Projection,
}

impl MapKind {
    pub const ALL: [MapKind; 3] = [MapKind::Map, MapKind::MapToTarget, MapKind::Projection];

    /// Dense index for per-kind tables.
    #[inline]
    pub const fn index(self) -> usize {
        match self {
            MapKind::Map => 0,
            MapKind::MapToTarget => 1,
            MapKind::Projection => 2,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            MapKind::Map => "map",
            MapKind::MapToTarget => "map-to-target",
            MapKind::Projection => "projection",
        }
    }
}

impl fmt::Display for MapKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
