//! Scalar, string, and enum conversions, and the dynamic fallback.

use morph_config::{EnumMapping, Settings};
use morph_ir::{Conversion, MapKind, Node, NodeId, TypeId, TypePair};

use crate::errors::CompileError;

use super::GraphBuilder;

impl GraphBuilder<'_> {
    /// Convert between scalars. A nullable value-type source mapped to a
    /// non-nullable destination falls back to the destination's default.
    pub(super) fn map_scalar(
        &mut self,
        source: NodeId,
        pair: TypePair,
        kind: MapKind,
        settings: &Settings,
    ) -> Result<NodeId, CompileError> {
        let from = self.registry.unwrap_nullable(pair.source);
        let to = self.registry.unwrap_nullable(pair.destination);
        let Some(conversion) = self.select_conversion(from, to, settings) else {
            return Err(self.error(pair, kind, self.unsupported(pair)));
        };

        let mut node = match conversion {
            Conversion::Identity => source,
            conversion => self.push(
                Node::Convert {
                    value: source,
                    conversion,
                },
                pair.destination,
            ),
        };
        if self.registry.is_nullable(pair.source)
            && !self.registry.is_nullable(pair.destination)
            && self.registry.is_value_type(to)
        {
            let fallback = self.default(to);
            node = self.push(
                Node::Coalesce {
                    value: node,
                    fallback,
                },
                to,
            );
        }
        Ok(node)
    }

    fn select_conversion(&self, from: TypeId, to: TypeId, settings: &Settings) -> Option<Conversion> {
        if from == to {
            return Some(Conversion::Identity);
        }
        let from_enum = self.registry.is_enum(from);
        let to_enum = self.registry.is_enum(to);
        let conversion = match (from_enum, to_enum) {
            (true, true) => Conversion::EnumToEnum {
                to,
                by_value: settings.enum_mapping() == EnumMapping::ByValue,
            },
            (true, false) if to == TypeId::STR => Conversion::EnumToStr,
            (true, false) if to == TypeId::INT => Conversion::EnumToInt,
            (false, true) if from == TypeId::STR => Conversion::StrToEnum { to },
            (false, true) if from == TypeId::INT => Conversion::IntToEnum { to },
            (false, false) if to == TypeId::STR && from.is_builtin_scalar() => Conversion::ToStr,
            (false, false) if from == TypeId::STR && to.is_builtin_scalar() => Conversion::Parse { to },
            (false, false) if Conversion::scalar_supported(from, to) => Conversion::Scalar { to },
            _ => return None,
        };
        Some(conversion)
    }

    /// `object` on either side: pass through, or dispatch on the runtime
    /// type of an `object` source. Projections cannot dispatch.
    pub(super) fn map_fallback(
        &mut self,
        source: NodeId,
        target: Option<NodeId>,
        pair: TypePair,
        kind: MapKind,
    ) -> Result<NodeId, CompileError> {
        let from = self.registry.unwrap_nullable(pair.source);
        let to = self.registry.unwrap_nullable(pair.destination);
        if from != TypeId::OBJECT || to == TypeId::OBJECT {
            return Ok(source);
        }
        if kind == MapKind::Projection {
            return Err(self.error(pair, kind, self.unsupported(pair)));
        }
        Ok(self.push(
            Node::Dynamic {
                value: source,
                destination: pair.destination,
                kind,
                target: target.unwrap_or(NodeId::INVALID),
            },
            pair.destination,
        ))
    }
}
