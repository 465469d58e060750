//! Type identifier assigned by the type registry.
//!
//! Scalar types are pre-registered with fixed indices so the built-in
//! adapters and conversions can match on them without a registry lookup.

use std::fmt;
use std::hash::{Hash, Hasher};

/// Index of a type in a `TypeRegistry`.
///
/// # Pre-registered Types
/// - `OBJECT`: the dynamic "any" type; values carry their runtime type
/// - `BOOL`, `INT`, `FLOAT`, `CHAR`, `STR`, `TIMESTAMP`: scalars
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd)]
#[repr(transparent)]
pub struct TypeId(u32);

impl TypeId {
    pub const OBJECT: TypeId = TypeId(0);
    pub const BOOL: TypeId = TypeId(1);
    pub const INT: TypeId = TypeId(2);
    pub const FLOAT: TypeId = TypeId(3);
    pub const CHAR: TypeId = TypeId(4);
    pub const STR: TypeId = TypeId(5);
    /// Milliseconds since the Unix epoch.
    pub const TIMESTAMP: TypeId = TypeId(6);

    /// First index handed out to host-registered types.
    pub const FIRST_COMPOUND: u32 = 7;

    /// Invalid type ID (sentinel).
    pub const INVALID: TypeId = TypeId(u32::MAX);

    /// All pre-registered types, in index order.
    pub const BUILTINS: [TypeId; 7] = [
        Self::OBJECT,
        Self::BOOL,
        Self::INT,
        Self::FLOAT,
        Self::CHAR,
        Self::STR,
        Self::TIMESTAMP,
    ];

    #[inline]
    pub const fn new(index: u32) -> Self {
        TypeId(index)
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Returns `true` for the pre-registered scalar types (not `OBJECT`).
    #[inline]
    pub const fn is_builtin_scalar(self) -> bool {
        self.0 > Self::OBJECT.0 && self.0 < Self::FIRST_COMPOUND
    }

    #[inline]
    pub const fn is_valid(self) -> bool {
        self.0 != u32::MAX
    }

    /// Display name of a pre-registered type, if this is one.
    pub const fn builtin_name(self) -> Option<&'static str> {
        match self.0 {
            0 => Some("object"),
            1 => Some("bool"),
            2 => Some("int"),
            3 => Some("float"),
            4 => Some("char"),
            5 => Some("str"),
            6 => Some("timestamp"),
            _ => None,
        }
    }
}

impl Hash for TypeId {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

impl fmt::Debug for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.builtin_name() {
            Some(name) => write!(f, "TypeId::{}", name.to_ascii_uppercase()),
            None if !self.is_valid() => write!(f, "TypeId::INVALID"),
            None => write!(f, "TypeId({})", self.0),
        }
    }
}

impl Default for TypeId {
    fn default() -> Self {
        Self::INVALID
    }
}
