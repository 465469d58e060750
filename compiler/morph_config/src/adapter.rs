//! Built-in adapters: which type pairs each one claims and at what priority.
//!
//! The adapters' graph construction lives in the builder; configuration only
//! needs to know the fixed scores and the applicability predicates so the
//! resolver can pick the most specific adapter for a pair.

use morph_ir::{Conversion, TypeId, TypePair};
use morph_types::{TypeKind, TypeRegistry};

/// A built-in conversion strategy.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum AdapterKind {
    Primitive,
    Class,
    Record,
    Collection,
    Dictionary,
    Array,
    MultiArray,
    Fallback,
    String,
    Enum,
}

impl AdapterKind {
    /// All adapters, most specific first.
    pub const ALL: [AdapterKind; 10] = [
        AdapterKind::Primitive,
        AdapterKind::Class,
        AdapterKind::Record,
        AdapterKind::Collection,
        AdapterKind::Dictionary,
        AdapterKind::Array,
        AdapterKind::MultiArray,
        AdapterKind::Fallback,
        AdapterKind::String,
        AdapterKind::Enum,
    ];

    /// Fixed rule score. Every user rule outranks every adapter.
    pub const fn score(self) -> i32 {
        match self {
            AdapterKind::Primitive => -100,
            AdapterKind::Class => -110,
            AdapterKind::Record => -111,
            AdapterKind::Collection => -120,
            AdapterKind::Dictionary => -121,
            AdapterKind::Array => -122,
            AdapterKind::MultiArray => -123,
            AdapterKind::Fallback => -130,
            AdapterKind::String => -140,
            AdapterKind::Enum => -141,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            AdapterKind::Primitive => "primitive",
            AdapterKind::Class => "class",
            AdapterKind::Record => "record",
            AdapterKind::Collection => "collection",
            AdapterKind::Dictionary => "dictionary",
            AdapterKind::Array => "array",
            AdapterKind::MultiArray => "multi-array",
            AdapterKind::Fallback => "fallback",
            AdapterKind::String => "string",
            AdapterKind::Enum => "enum",
        }
    }

    /// Whether this adapter can convert `pair`. Nullable wrappers are
    /// looked through on both sides.
    pub fn applies(self, pair: TypePair, registry: &TypeRegistry) -> bool {
        let src = registry.unwrap_nullable(pair.source);
        let dst = registry.unwrap_nullable(pair.destination);
        let src_kind = registry.kind(src);
        let dst_kind = registry.kind(dst);
        let object_like = |t: TypeId, kind: Option<&TypeKind>| {
            registry.is_class(t) || matches!(kind, Some(TypeKind::Dictionary { .. }))
        };
        let sequence = |kind: Option<&TypeKind>| {
            matches!(
                kind,
                Some(TypeKind::Collection { .. } | TypeKind::Array { .. })
            )
        };

        match self {
            AdapterKind::Primitive => {
                (src == TypeId::STR && dst == TypeId::STR)
                    || Conversion::scalar_supported(src, dst)
                    || (src == dst && registry.is_enum(src))
            }
            AdapterKind::Class => {
                registry.is_class(dst) && !registry.is_record_shaped(dst) && object_like(src, src_kind)
            }
            AdapterKind::Record => registry.is_record_shaped(dst) && object_like(src, src_kind),
            AdapterKind::Collection => {
                matches!(dst_kind, Some(TypeKind::Collection { .. })) && sequence(src_kind)
            }
            AdapterKind::Dictionary => {
                matches!(dst_kind, Some(TypeKind::Dictionary { .. }))
                    && (matches!(src_kind, Some(TypeKind::Dictionary { .. }))
                        || registry.is_class(src))
            }
            AdapterKind::Array => {
                matches!(dst_kind, Some(TypeKind::Array { .. })) && sequence(src_kind)
            }
            AdapterKind::MultiArray => match (src_kind, dst_kind) {
                (
                    Some(TypeKind::MultiArray { rank: a, .. }),
                    Some(TypeKind::MultiArray { rank: b, .. }),
                ) => a == b,
                _ => false,
            },
            AdapterKind::Fallback => src == TypeId::OBJECT || dst == TypeId::OBJECT || src == dst,
            AdapterKind::String => {
                let plain_scalar = |t: TypeId| t.is_builtin_scalar() && t != TypeId::STR;
                (src == TypeId::STR && plain_scalar(dst)) || (dst == TypeId::STR && plain_scalar(src))
            }
            AdapterKind::Enum => {
                let src_enum = registry.is_enum(src);
                let dst_enum = registry.is_enum(dst);
                let counterpart = |t: TypeId| registry.is_enum(t) || t == TypeId::STR || t == TypeId::INT;
                src != dst
                    && ((src_enum && counterpart(dst)) || (dst_enum && counterpart(src)))
            }
        }
    }

    /// The most specific adapter claiming `pair`.
    pub fn select(pair: TypePair, registry: &TypeRegistry) -> Option<AdapterKind> {
        Self::ALL.into_iter().find(|a| a.applies(pair, registry))
    }
}
