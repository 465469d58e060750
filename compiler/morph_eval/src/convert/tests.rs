use pretty_assertions::assert_eq;
use proptest::prelude::*;

use super::*;

fn colors(registry: &mut TypeRegistry) -> (TypeId, TypeId) {
    let color = registry
        .register_enum("Color", &[("Red", 0), ("Green", 1), ("Blue", 2)])
        .expect("register Color");
    let shade = registry
        .register_enum("Shade", &[("green", 10), ("red", 20)])
        .expect("register Shade");
    (color, shade)
}

#[test]
fn null_converts_to_null() {
    let registry = TypeRegistry::new();
    for conversion in [
        Conversion::ToStr,
        Conversion::Scalar { to: TypeId::INT },
        Conversion::Parse { to: TypeId::BOOL },
    ] {
        assert_eq!(apply(&registry, Value::Null, conversion), Ok(Value::Null));
    }
}

#[test]
fn narrowing_fails_instead_of_wrapping() {
    assert_eq!(scalar(&Value::Float(-2.9), TypeId::INT), Ok(Value::Int(-2)));
    assert!(matches!(
        scalar(&Value::Float(f64::NAN), TypeId::INT),
        Err(EvalError::Conversion { target: "int", .. })
    ));
    assert!(scalar(&Value::Float(1e19), TypeId::INT).is_err());
    assert!(scalar(&Value::Int(-1), TypeId::CHAR).is_err());
    assert_eq!(scalar(&Value::Int(65), TypeId::CHAR), Ok(Value::Char('A')));
}

#[test]
fn bools_and_timestamps() {
    assert_eq!(scalar(&Value::Bool(true), TypeId::INT), Ok(Value::Int(1)));
    assert_eq!(scalar(&Value::Float(0.0), TypeId::BOOL), Ok(Value::Bool(false)));
    assert_eq!(
        scalar(&Value::Int(1_700_000_000_000), TypeId::TIMESTAMP),
        Ok(Value::Timestamp(1_700_000_000_000))
    );
    assert_eq!(
        scalar(&Value::from("1"), TypeId::INT),
        Err(EvalError::TypeMismatch {
            expected: "int",
            found: "str"
        })
    );
}

#[test]
fn parse_rules() {
    assert_eq!(parse(" 42 ", TypeId::INT), Ok(Value::Int(42)));
    assert_eq!(parse("TRUE", TypeId::BOOL), Ok(Value::Bool(true)));
    assert_eq!(parse("x", TypeId::CHAR), Ok(Value::Char('x')));
    assert_eq!(
        parse("xy", TypeId::CHAR),
        Err(EvalError::Parse {
            input: "xy".to_owned(),
            target: "char"
        })
    );
    assert!(parse("forty", TypeId::INT).is_err());
}

#[test]
fn to_str_formats_scalars() {
    assert_eq!(to_str(&Value::Int(-7)), Ok(Value::from("-7")));
    assert_eq!(to_str(&Value::Float(1.5)), Ok(Value::from("1.5")));
    assert_eq!(to_str(&Value::Char('q')), Ok(Value::from("q")));
    assert!(to_str(&Value::list(TypeId::OBJECT, Vec::new())).is_err());
}

#[test]
fn enums_by_name_fall_back_to_case_insensitive() {
    let mut registry = TypeRegistry::new();
    let (color, shade) = colors(&mut registry);
    let green = enum_by_name(&registry, color, "Green").expect("exact");

    assert_eq!(
        apply(
            &registry,
            green.clone(),
            Conversion::EnumToEnum {
                to: shade,
                by_value: false
            }
        ),
        Ok(Value::enum_variant(shade, registry.name("green"), 10))
    );
    assert_eq!(
        apply(&registry, green, Conversion::EnumToStr),
        Ok(Value::from("Green"))
    );
    assert_eq!(
        enum_by_name(&registry, color, "Purple"),
        Err(EvalError::UnknownVariant {
            enum_name: "Color".to_owned(),
            variant: "Purple".to_owned()
        })
    );
}

#[test]
fn enums_by_value_use_discriminants() {
    let mut registry = TypeRegistry::new();
    let (color, shade) = colors(&mut registry);
    let blue = enum_by_discriminant(&registry, color, 2).expect("Blue");

    assert_eq!(apply(&registry, blue.clone(), Conversion::EnumToInt), Ok(Value::Int(2)));
    assert_eq!(
        apply(
            &registry,
            blue,
            Conversion::EnumToEnum {
                to: shade,
                by_value: true
            }
        ),
        Err(EvalError::UnknownDiscriminant {
            enum_name: "Shade".to_owned(),
            discriminant: 2
        })
    );
    assert_eq!(
        apply(&registry, Value::Int(1), Conversion::IntToEnum { to: color }),
        Ok(Value::enum_variant(color, registry.name("Green"), 1))
    );
}

proptest! {
    #[test]
    fn int_text_parses_back(n in any::<i64>()) {
        let text = to_str(&Value::Int(n)).expect("int formats");
        prop_assert_eq!(parse(text.as_str().unwrap_or_default(), TypeId::INT), Ok(Value::Int(n)));
    }

    #[test]
    fn exact_floats_survive_int_conversion(n in -(1_i64 << 52)..(1_i64 << 52)) {
        let float = scalar(&Value::Int(n), TypeId::FLOAT).expect("widen");
        prop_assert_eq!(scalar(&float, TypeId::INT), Ok(Value::Int(n)));
    }
}
