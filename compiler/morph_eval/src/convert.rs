//! Scalar and enum conversions selected by the builder.
//!
//! Every conversion maps `Null` to `Null`; the builder wraps non-nullable
//! destinations in a `Coalesce` when a default is wanted instead.

use morph_ir::{Conversion, EnumValue, EvalError, EvalResult, TypeId, Value};
use morph_types::{EnumVariant, TypeRegistry};

/// Apply `conversion` to `value`.
pub fn apply(registry: &TypeRegistry, value: Value, conversion: Conversion) -> EvalResult {
    if value.is_null() {
        return Ok(Value::Null);
    }
    match conversion {
        Conversion::Identity => Ok(value),
        Conversion::Scalar { to } => scalar(&value, to),
        Conversion::ToStr => to_str(&value),
        Conversion::Parse { to } => match &value {
            Value::Str(s) => parse(s, to),
            other => Err(EvalError::mismatch("str", other)),
        },
        Conversion::EnumToStr => {
            let e = as_enum(&value)?;
            Ok(Value::string(registry.text(e.variant)))
        }
        Conversion::EnumToInt => Ok(Value::Int(as_enum(&value)?.discriminant)),
        Conversion::StrToEnum { to } => match &value {
            Value::Str(s) => enum_by_name(registry, to, s),
            other => Err(EvalError::mismatch("str", other)),
        },
        Conversion::IntToEnum { to } => match value {
            Value::Int(n) => enum_by_discriminant(registry, to, n),
            other => Err(EvalError::mismatch("int", &other)),
        },
        Conversion::EnumToEnum { to, by_value } => {
            let e = as_enum(&value)?;
            if by_value {
                enum_by_discriminant(registry, to, e.discriminant)
            } else {
                enum_by_name(registry, to, registry.text(e.variant))
            }
        }
    }
}

fn as_enum(value: &Value) -> Result<EnumValue, EvalError> {
    match value {
        Value::Enum(e) => Ok(*e),
        other => Err(EvalError::mismatch("enum", other)),
    }
}

/// Convert among `bool`, `int`, `float`, `char`, and `timestamp`.
///
/// Narrowing conversions fail instead of wrapping: a float outside the
/// `i64` range, a non-finite float, or an int that is not a valid `char`.
pub fn scalar(value: &Value, to: TypeId) -> EvalResult {
    let converted = match (value, to) {
        (Value::Bool(b), TypeId::BOOL) => Some(Value::Bool(*b)),
        (Value::Bool(b), TypeId::INT) => Some(Value::Int(i64::from(*b))),
        (Value::Bool(b), TypeId::FLOAT) => Some(Value::Float(if *b { 1.0 } else { 0.0 })),

        (Value::Int(n), TypeId::INT) | (Value::Timestamp(n), TypeId::INT) => Some(Value::Int(*n)),
        (Value::Int(n), TypeId::BOOL) => Some(Value::Bool(*n != 0)),
        #[expect(clippy::cast_precision_loss, reason = "int to float is a widening request")]
        (Value::Int(n), TypeId::FLOAT) => Some(Value::Float(*n as f64)),
        (Value::Int(n), TypeId::CHAR) => u32::try_from(*n)
            .ok()
            .and_then(char::from_u32)
            .map(Value::Char),
        (Value::Int(n), TypeId::TIMESTAMP) | (Value::Timestamp(n), TypeId::TIMESTAMP) => {
            Some(Value::Timestamp(*n))
        }

        (Value::Float(x), TypeId::FLOAT) => Some(Value::Float(*x)),
        (Value::Float(x), TypeId::BOOL) => Some(Value::Bool(*x != 0.0)),
        (Value::Float(x), TypeId::INT) => float_to_int(*x).map(Value::Int),

        (Value::Char(c), TypeId::CHAR) => Some(Value::Char(*c)),
        (Value::Char(c), TypeId::INT) => Some(Value::Int(i64::from(u32::from(*c)))),

        (other, to) if !is_scalar(other) => {
            return Err(EvalError::mismatch(to.builtin_name().unwrap_or("scalar"), other))
        }
        _ => None,
    };
    converted.ok_or_else(|| conversion_failed(value, to))
}

fn is_scalar(value: &Value) -> bool {
    matches!(
        value,
        Value::Bool(_) | Value::Int(_) | Value::Float(_) | Value::Char(_) | Value::Timestamp(_)
    )
}

/// Truncate toward zero, rejecting values `i64` cannot hold.
#[expect(
    clippy::cast_possible_truncation,
    reason = "range is checked before the cast"
)]
#[expect(clippy::cast_precision_loss, reason = "bounds are exact powers of two")]
fn float_to_int(x: f64) -> Option<i64> {
    let truncated = x.trunc();
    if truncated.is_finite() && truncated >= i64::MIN as f64 && truncated < i64::MAX as f64 {
        Some(truncated as i64)
    } else {
        None
    }
}

/// String form of a scalar.
pub fn to_str(value: &Value) -> EvalResult {
    let text = match value {
        Value::Str(s) => return Ok(Value::Str(s.clone())),
        Value::Bool(b) => b.to_string(),
        Value::Int(n) | Value::Timestamp(n) => n.to_string(),
        Value::Float(x) => x.to_string(),
        Value::Char(c) => c.to_string(),
        other => return Err(EvalError::mismatch("scalar", other)),
    };
    Ok(Value::string(text))
}

/// Parse a string as a builtin scalar.
///
/// Surrounding whitespace is ignored except for `char`, which must be
/// exactly one character. Booleans parse case-insensitively.
pub fn parse(input: &str, to: TypeId) -> EvalResult {
    let trimmed = input.trim();
    let parsed = match to {
        TypeId::STR => Some(Value::string(input)),
        TypeId::BOOL => {
            if trimmed.eq_ignore_ascii_case("true") {
                Some(Value::Bool(true))
            } else if trimmed.eq_ignore_ascii_case("false") {
                Some(Value::Bool(false))
            } else {
                None
            }
        }
        TypeId::INT => trimmed.parse().ok().map(Value::Int),
        TypeId::FLOAT => trimmed.parse().ok().map(Value::Float),
        TypeId::TIMESTAMP => trimmed.parse().ok().map(Value::Timestamp),
        TypeId::CHAR => {
            let mut chars = input.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Some(Value::Char(c)),
                _ => None,
            }
        }
        _ => None,
    };
    parsed.ok_or_else(|| EvalError::Parse {
        input: input.to_owned(),
        target: to.builtin_name().unwrap_or("scalar"),
    })
}

/// Variant of `ty` named `name`: exact match first, then ASCII
/// case-insensitive.
pub fn enum_by_name(registry: &TypeRegistry, ty: TypeId, name: &str) -> EvalResult {
    let variants = registry.enum_variants(ty);
    let found = variants
        .iter()
        .find(|v| registry.text(v.name) == name)
        .or_else(|| {
            variants
                .iter()
                .find(|v| registry.text(v.name).eq_ignore_ascii_case(name))
        });
    match found {
        Some(variant) => Ok(enum_value(ty, variant)),
        None => Err(EvalError::UnknownVariant {
            enum_name: registry.type_name(ty).to_owned(),
            variant: name.to_owned(),
        }),
    }
}

pub fn enum_by_discriminant(registry: &TypeRegistry, ty: TypeId, discriminant: i64) -> EvalResult {
    match registry
        .enum_variants(ty)
        .iter()
        .find(|v| v.discriminant == discriminant)
    {
        Some(variant) => Ok(enum_value(ty, variant)),
        None => Err(EvalError::UnknownDiscriminant {
            enum_name: registry.type_name(ty).to_owned(),
            discriminant,
        }),
    }
}

#[inline]
fn enum_value(ty: TypeId, variant: &EnumVariant) -> Value {
    Value::enum_variant(ty, variant.name, variant.discriminant)
}

#[cold]
fn conversion_failed(value: &Value, to: TypeId) -> EvalError {
    EvalError::Conversion {
        value: format!("{value:?}"),
        target: to.builtin_name().unwrap_or("scalar"),
    }
}

#[cfg(test)]
mod tests;
