//! Rule registration and its effect on compiled mappings.

#![allow(clippy::unwrap_used, clippy::expect_used, reason = "Tests can panic")]

mod common;

use pretty_assertions::assert_eq;

use common::{model, read};
use morphc::{
    AccessSet, BinaryOp, ConfigError, HostFn, KindSet, MapError, MapKind, Mapper, MapperOptions,
    NameMatchingStrategy, TypeId, TypePair, TypeRegistry, Value, ValueExpr,
};

fn legacy_types() -> (TypeRegistry, TypePair) {
    let mut registry = TypeRegistry::new();
    let legacy = registry
        .class("LegacyUser")
        .property("Full_Name", TypeId::STR)
        .property("user_id", TypeId::INT)
        .register()
        .unwrap();
    let modern = registry
        .class("User")
        .property("FullName", TypeId::STR)
        .property("UserId", TypeId::INT)
        .register()
        .unwrap();
    (registry, TypePair::new(legacy, modern))
}

fn legacy_user(registry: &TypeRegistry, pair: TypePair) -> Value {
    Value::object(
        pair.source,
        [
            (registry.name("Full_Name"), Value::from("Ada Lovelace")),
            (registry.name("user_id"), Value::Int(7)),
        ],
    )
}

// === Name matching ===

#[test]
fn exact_matching_leaves_differently_spelled_members_unset() {
    let (registry, pair) = legacy_types();
    let source = legacy_user(&registry, pair);
    let mapper = Mapper::new(registry);

    let out = mapper.adapt(&source, pair).unwrap();
    let r = mapper.registry();
    assert_eq!(read(r, &out, "FullName"), Value::Null);
    assert_eq!(read(r, &out, "UserId"), Value::Int(0));
}

#[test]
fn flexible_matching_normalizes_case_and_separators() {
    let (registry, pair) = legacy_types();
    let source = legacy_user(&registry, pair);
    let mapper = Mapper::new(registry);
    mapper
        .for_type(pair)
        .unwrap()
        .name_matching(NameMatchingStrategy::FLEXIBLE)
        .unwrap();

    let out = mapper.adapt(&source, pair).unwrap();
    let r = mapper.registry();
    assert_eq!(read(r, &out, "FullName"), Value::from("Ada Lovelace"));
    assert_eq!(read(r, &out, "UserId"), Value::Int(7));
}

#[test]
fn strict_mode_reports_the_unmapped_member() {
    let (registry, pair) = legacy_types();
    let source = legacy_user(&registry, pair);
    let mapper = Mapper::new(registry);
    mapper
        .for_type(pair)
        .unwrap()
        .require_destination_member_source(true)
        .unwrap();

    let err = mapper.adapt(&source, pair).unwrap_err();
    match err.config() {
        Some(ConfigError::UnmappedMember { member, .. }) => assert_eq!(member, "FullName"),
        other => panic!("expected UnmappedMember, got {other:?}"),
    }
    assert_eq!(mapper.cached_functions(), 0);

    // A failed compile consumes nothing; the rule stays editable.
    mapper
        .for_type(pair)
        .unwrap()
        .map("FullName", mapper.path("Full_Name"))
        .unwrap()
        .map("UserId", mapper.path("user_id"))
        .unwrap();
    let out = mapper.adapt(&source, pair).unwrap();
    assert_eq!(read(mapper.registry(), &out, "UserId"), Value::Int(7));
}

// === Member rules ===

#[test]
fn custom_resolvers_and_conditions() {
    let m = model();
    let pair = TypePair::new(m.person, m.person_dto);
    let adult = m.person_value("Ada", 36, Value::Null);
    let child = m.person_value("Tim", 9, Value::Null);
    let mapper = Mapper::new(m.registry);

    let age = mapper.path("Age");
    mapper
        .for_type(pair)
        .unwrap()
        .map("Name", ValueExpr::literal("minor"))
        .unwrap()
        .map_if(
            "Name",
            mapper.path("Name"),
            age.clone().binary(BinaryOp::GtEq, ValueExpr::literal(18_i64)),
        )
        .unwrap()
        .ignore_if(age.binary(BinaryOp::Lt, ValueExpr::literal(18_i64)), &["Age"])
        .unwrap();

    let r = mapper.registry();
    let out = mapper.adapt(&adult, pair).unwrap();
    assert_eq!(read(r, &out, "Name"), Value::from("Ada"));
    assert_eq!(read(r, &out, "Age"), Value::Int(36));

    let out = mapper.adapt(&child, pair).unwrap();
    assert_eq!(read(r, &out, "Name"), Value::from("minor"));
    assert_eq!(read(r, &out, "Age"), Value::Int(0));
}

#[test]
fn transforms_apply_to_every_value_of_a_type() {
    let m = model();
    let pair = TypePair::new(m.person, m.person_dto);
    let source = m.person_value("  Ada  ", 36, m.address_value(" 1 Loop ", "Cupertino"));
    let mapper = Mapper::new(m.registry);

    let trim = HostFn::new("trim", TypeId::STR, |args: &[Value]| {
        Ok(args[0]
            .as_str()
            .map_or(Value::Null, |s| Value::from(s.trim())))
    });
    mapper
        .for_type(pair)
        .unwrap()
        .transform(TypeId::STR, ValueExpr::Call(trim, vec![ValueExpr::Arg]))
        .unwrap();

    let out = mapper.adapt(&source, pair).unwrap();
    let r = mapper.registry();
    assert_eq!(read(r, &out, "Name"), Value::from("Ada"));
    // Nested pairs resolve their own settings.
    assert_eq!(read(r, &out, "Address.Street"), Value::from(" 1 Loop "));
}

#[test]
fn annotations_hide_members_and_rename_sources() {
    let mut registry = TypeRegistry::new();
    let ignore = registry.annotation("AdaptIgnore");
    let alias = registry
        .annotation("AdaptMember")
        .with_arg(registry.name("name"), Value::from("Login"));
    let account = registry
        .class("Account")
        .property("Login", TypeId::STR)
        .property("Password", TypeId::STR)
        .register()
        .unwrap();
    let view = registry
        .class("AccountView")
        .property("UserName", TypeId::STR)
        .annotate_member(alias)
        .property("Password", TypeId::STR)
        .annotate_member(ignore)
        .register()
        .unwrap();
    let source = Value::object(
        account,
        [
            (registry.name("Login"), Value::from("ada")),
            (registry.name("Password"), Value::from("hunter2")),
        ],
    );
    let mapper = Mapper::new(registry);

    let out = mapper.adapt(&source, TypePair::new(account, view)).unwrap();
    let r = mapper.registry();
    assert_eq!(read(r, &out, "UserName"), Value::from("ada"));
    assert_eq!(read(r, &out, "Password"), Value::Null);
}

#[test]
fn visibility_controls_which_members_take_part() {
    let mut registry = TypeRegistry::new();
    let secret = registry
        .class("Secret")
        .property("Id", TypeId::INT)
        .private_field("token", TypeId::STR)
        .register()
        .unwrap();
    let copy = registry
        .class("SecretCopy")
        .property("Id", TypeId::INT)
        .private_field("token", TypeId::STR)
        .register()
        .unwrap();
    let token = registry.name("token");
    let source = Value::object(
        secret,
        [(registry.name("Id"), Value::Int(1)), (token, Value::from("abc"))],
    );
    let pair = TypePair::new(secret, copy);
    let mapper = Mapper::new(registry);

    let out = mapper.adapt(&source, pair).unwrap();
    assert_eq!(out.member(token).unwrap(), Value::Null);

    mapper.invalidate(pair);
    mapper
        .for_type(pair)
        .unwrap()
        .visibility(AccessSet::PUBLIC | AccessSet::PRIVATE)
        .unwrap();
    let out = mapper.adapt(&source, pair).unwrap();
    assert_eq!(out.member(token).unwrap(), Value::from("abc"));
}

// === Construction and conversion overrides ===

#[test]
fn construct_using_and_converter_overrides() {
    let m = model();
    let pair = TypePair::new(m.person, m.person_dto);
    let source = m.person_value("Ada", 36, Value::Null);
    let (name, age) = (m.registry.name("Name"), m.registry.name("Age"));
    let dto = m.person_dto;
    let mapper = Mapper::new(m.registry);

    let seeded = HostFn::new("seed", dto, move |_: &[Value]| {
        Ok(Value::object(dto, [(name, Value::from("seed")), (age, Value::Int(-1))]))
    });
    mapper
        .for_type(pair)
        .unwrap()
        .construct_using(ValueExpr::call(seeded))
        .unwrap()
        .ignore(&["Age"])
        .unwrap();
    let out = mapper.adapt(&source, pair).unwrap();
    assert_eq!(out.member(name).unwrap(), Value::from("Ada"));
    assert_eq!(out.member(age).unwrap(), Value::Int(-1));

    mapper
        .new_config(pair)
        .map_with(MapKind::Map, ValueExpr::literal(Value::Null))
        .unwrap();
    assert_eq!(mapper.adapt(&source, pair).unwrap(), Value::Null);
}

#[test]
fn kind_specific_rules_only_affect_their_kind() {
    let m = model();
    let pair = TypePair::new(m.person, m.person_dto);
    let source = m.person_value("Ada", 36, Value::Null);
    let mapper = Mapper::new(m.registry);
    mapper
        .for_type_kinds(pair, KindSet::MAP_TO_TARGET)
        .unwrap()
        .ignore(&["Name"])
        .unwrap();

    let mapped = mapper.adapt(&source, pair).unwrap();
    let merged = mapper
        .adapt_to_target(&source, mapper.registry().instantiate(m.person_dto), pair)
        .unwrap();
    let r = mapper.registry();
    assert_eq!(read(r, &mapped, "Name"), Value::from("Ada"));
    assert_eq!(read(r, &merged, "Name"), Value::Null);
}

// === Priority and inheritance ===

#[test]
fn derived_source_rule_outranks_the_base_rule() {
    let m = model();
    let base = TypePair::new(m.person, m.person_dto);
    let derived = TypePair::new(m.employee, m.person_dto);
    let r = &m.registry;
    let person = m.person_value("Ada", 36, Value::Null);
    let employee = Value::object(
        m.employee,
        [
            (r.name("Name"), Value::from("Linus")),
            (r.name("Age"), Value::Int(54)),
        ],
    );
    let mapper = Mapper::new(m.registry);
    mapper.for_type(base).unwrap().ignore(&["Age", "Name"]).unwrap();
    mapper
        .for_type(derived)
        .unwrap()
        .map("Age", ValueExpr::literal(99_i64))
        .unwrap();

    let r = mapper.registry();
    let out = mapper.adapt(&person, base).unwrap();
    assert_eq!(read(r, &out, "Age"), Value::Int(0));

    let out = mapper.adapt(&employee, derived).unwrap();
    assert_eq!(read(r, &out, "Age"), Value::Int(99));
    // The base rule still contributes what the derived rule leaves open.
    assert_eq!(read(r, &out, "Name"), Value::Null);
}

#[test]
fn predicate_rules_apply_where_they_hold() {
    let m = model();
    let person_pair = TypePair::new(m.person, m.person_dto);
    let address_pair = TypePair::new(m.address, m.address_dto);
    let source = m.person_value("Ada", 36, m.address_value("1 Loop", "Cupertino"));
    let address_dto = m.address_dto;
    let mapper = Mapper::new(m.registry);
    mapper
        .when(move |ctx| ctx.pair.destination == address_dto)
        .ignore(&["Street"])
        .unwrap();

    let out = mapper.adapt(&source, person_pair).unwrap();
    let r = mapper.registry();
    assert_eq!(read(r, &out, "Address.Street"), Value::Null);
    assert_eq!(read(r, &out, "Address.City"), Value::from("Cupertino"));
    assert_eq!(read(r, &out, "Name"), Value::from("Ada"));

    // An exact rule outranks the predicate.
    mapper.invalidate(person_pair);
    mapper
        .for_type(address_pair)
        .unwrap()
        .map("Street", ValueExpr::literal("exact"))
        .unwrap();
    let out = mapper.adapt(&source, person_pair).unwrap();
    assert_eq!(read(r, &out, "Address.Street"), Value::from("exact"));
}

#[test]
fn fork_rules_apply_only_beneath_the_forking_pair() {
    let mut m = model();
    let office = m
        .registry
        .class("Office")
        .property("Address", m.address)
        .register()
        .unwrap();
    let office_dto = m
        .registry
        .class("OfficeDto")
        .property("Address", m.address_dto)
        .register()
        .unwrap();
    let address_pair = TypePair::new(m.address, m.address_dto);
    let person_pair = TypePair::new(m.person, m.person_dto);
    let office_pair = TypePair::new(office, office_dto);
    let address = m.address_value("1 Loop", "Cupertino");
    let person = m.person_value("Ada", 36, address.clone());
    let office_value = Value::object(office, [(m.registry.name("Address"), address)]);
    let mapper = Mapper::new(m.registry);

    mapper
        .for_type(person_pair)
        .unwrap()
        .fork(|fork| {
            fork.for_type(address_pair).ignore(&["City"])?;
            Ok(())
        })
        .unwrap();

    let r = mapper.registry();
    let out = mapper.adapt(&person, person_pair).unwrap();
    assert_eq!(read(r, &out, "Address.City"), Value::Null);
    assert_eq!(read(r, &out, "Address.Street"), Value::from("1 Loop"));

    let out = mapper.adapt(&office_value, office_pair).unwrap();
    assert_eq!(read(r, &out, "Address.City"), Value::from("Cupertino"));
}

#[test]
fn invalidating_a_nested_pair_recompiles_the_pairs_that_inlined_it() {
    let m = model();
    let person_pair = TypePair::new(m.person, m.person_dto);
    let address_pair = TypePair::new(m.address, m.address_dto);
    let source = m.person_value("Ada", 36, m.address_value("1 Loop", "Cupertino"));
    let mapper = Mapper::new(m.registry);
    mapper.for_type(address_pair).unwrap();

    let out = mapper.adapt(&source, person_pair).unwrap();
    assert_eq!(read(mapper.registry(), &out, "Address.City"), Value::from("Cupertino"));

    mapper.invalidate(address_pair);
    mapper
        .for_type(address_pair)
        .unwrap()
        .ignore(&["City"])
        .unwrap();

    let r = mapper.registry();
    let out = mapper.adapt(&source, person_pair).unwrap();
    assert_eq!(read(r, &out, "Address.City"), Value::Null);
    assert_eq!(read(r, &out, "Address.Street"), Value::from("1 Loop"));
    let nested = source.member(r.name("Address")).unwrap();
    let direct = mapper.adapt(&nested, address_pair).unwrap();
    assert_eq!(read(r, &direct, "City"), Value::Null);
}

#[test]
fn invalidating_a_base_pair_recompiles_pairs_that_inherit_it() {
    let m = model();
    let base = TypePair::new(m.person, m.person_dto);
    let derived = TypePair::new(m.employee, m.person_dto);
    let mapper = Mapper::new(m.registry);
    let employee = {
        let r = mapper.registry();
        Value::object(
            m.employee,
            [
                (r.name("Name"), Value::from("Ada")),
                (r.name("Age"), Value::Int(36)),
                (r.name("Company"), Value::from("Analytical")),
            ],
        )
    };
    mapper.for_type(base).unwrap();
    mapper.for_type(derived).unwrap().inherits(base).unwrap();
    mapper.compile_pair(derived).unwrap();

    mapper.invalidate(base);
    mapper.for_type(base).unwrap().ignore(&["Age"]).unwrap();

    let out = mapper.adapt(&employee, derived).unwrap();
    assert_eq!(read(mapper.registry(), &out, "Age"), Value::Int(0));
    assert_eq!(read(mapper.registry(), &out, "Name"), Value::from("Ada"));
}

#[test]
fn explicit_mapping_mode_requires_registered_pairs() {
    let m = model();
    let pair = TypePair::new(m.address, m.address_dto);
    let source = m.address_value("1 Loop", "Cupertino");
    let mapper = Mapper::with_options(
        m.registry,
        MapperOptions::new().require_explicit_mapping(true),
    );

    let err = mapper.adapt(&source, pair).unwrap_err();
    assert!(
        matches!(err.config(), Some(ConfigError::UnregisteredPair { .. })),
        "{err}"
    );

    mapper.for_type(pair).unwrap();
    let out = mapper.adapt(&source, pair).unwrap();
    assert_eq!(read(mapper.registry(), &out, "City"), Value::from("Cupertino"));
}

#[test]
fn registration_errors_surface_at_configuration_time() {
    let m = model();
    let pair = TypePair::new(m.address, m.address_dto);
    let mapper = Mapper::new(m.registry);
    mapper.compile_pair(pair).unwrap();

    // No rule existed, so nothing was frozen.
    mapper.for_type(pair).unwrap().ignore(&["City"]).unwrap();
    mapper.compile_pair(pair).unwrap();

    let err: MapError = mapper.for_type(pair).err().unwrap().into();
    assert!(matches!(
        err.config(),
        Some(ConfigError::RuleAlreadyCompiled { .. })
    ));
}
