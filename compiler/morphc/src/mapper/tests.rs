use std::sync::Arc;

use pretty_assertions::assert_eq;

use super::*;
use morph_config::ConfigError;

fn person_mapper() -> (Mapper, TypePair) {
    let mut registry = TypeRegistry::new();
    let person = registry
        .class("Person")
        .property("Name", TypeId::STR)
        .property("Age", TypeId::INT)
        .register()
        .expect("Person");
    let dto = registry
        .class("PersonDto")
        .property("Name", TypeId::STR)
        .property("Age", TypeId::INT)
        .register()
        .expect("PersonDto");
    (Mapper::new(registry), TypePair::new(person, dto))
}

fn person(mapper: &Mapper, pair: TypePair, name: &str, age: i64) -> Value {
    let r = mapper.registry();
    Value::object(
        pair.source,
        [(r.name("Name"), Value::from(name)), (r.name("Age"), Value::Int(age))],
    )
}

#[test]
fn second_request_reuses_the_cached_function() {
    let (mapper, pair) = person_mapper();
    let first = mapper.compiled(pair, MapKind::Map).expect("compiles");
    let second = mapper.compiled(pair, MapKind::Map).expect("cached");
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(mapper.cached_functions(), 1);

    let merge = mapper.compiled(pair, MapKind::MapToTarget).expect("compiles");
    assert!(!Arc::ptr_eq(&first, &merge));
    assert_eq!(mapper.cached_functions(), 2);
}

#[test]
fn compiled_rules_reject_changes_until_invalidated() {
    let (mapper, pair) = person_mapper();
    mapper
        .for_type(pair)
        .expect("fresh rule")
        .ignore(&["Age"])
        .expect("edits");
    mapper.compile().expect("compiles");
    assert_eq!(mapper.cached_functions(), 2);

    let err = mapper.for_type(pair).err().expect("frozen");
    assert!(matches!(err, ConfigError::RuleAlreadyCompiled { .. }), "{err}");

    mapper.invalidate(pair);
    assert_eq!(mapper.cached_functions(), 0);
    mapper
        .for_type(pair)
        .expect("modifiable again")
        .ignore(&["Name"])
        .expect("edits");

    let out = mapper.adapt(&person(&mapper, pair, "Ada", 36), pair).expect("maps");
    let r = mapper.registry();
    // Both ignores now apply.
    assert_eq!(out.member(r.name("Name")).expect("member"), Value::Null);
    assert_eq!(out.member(r.name("Age")).expect("member"), Value::Int(0));
}

#[test]
fn setter_kept_across_a_compile_rejects_later_edits() {
    let (mapper, pair) = person_mapper();
    let setter = mapper.for_type(pair).expect("fresh rule");
    let source = person(&mapper, pair, "Ada", 36);
    let mapped = mapper.adapt(&source, pair).expect("maps");

    let err = setter.ignore(&["Name"]).err().expect("frozen");
    assert!(matches!(err, ConfigError::RuleAlreadyCompiled { .. }), "{err}");

    // Kinds compiled afterwards still see the settings Map was built with.
    let merged = mapper
        .adapt_to_target(&source, Value::Null, pair)
        .expect("merges");
    assert_eq!(merged, mapped);
    let name = mapper.registry().name("Name");
    assert_eq!(merged.member(name).expect("member"), Value::from("Ada"));
}

#[test]
fn predicate_setters_freeze_with_the_functions_they_shape() {
    let (mapper, pair) = person_mapper();
    let setter = mapper
        .when(move |ctx| ctx.pair == pair)
        .ignore(&["Age"])
        .expect("edits");
    mapper.compile_pair(pair).expect("compiles");

    let err = setter.max_depth(2).err().expect("frozen");
    assert!(matches!(err, ConfigError::RuleAlreadyCompiled { .. }), "{err}");
}

#[test]
fn each_edit_refreshes_the_cached_settings() {
    let (mapper, pair) = person_mapper();
    let setter = mapper.for_type(pair).expect("rule");
    let before = mapper.settings_for(pair, MapKind::Map, None).expect("resolves");
    assert!(!before.settings.ignore_null_values());

    setter.ignore_null_values(true).expect("edits");
    let after = mapper.settings_for(pair, MapKind::Map, None).expect("resolves");
    assert!(after.settings.ignore_null_values());
}

#[test]
fn failed_fork_configuration_leaves_the_rule_unchanged() {
    let (mapper, pair) = person_mapper();
    let setter = mapper.for_type(pair).expect("rule");
    let err = setter
        .fork(|fork| {
            fork.for_type(pair).ignore(&["Age"])?;
            Err(ConfigError::RuleAlreadyCompiled {
                pair: "rejected".to_owned(),
            })
        })
        .err()
        .expect("fails");
    assert!(matches!(err, ConfigError::RuleAlreadyCompiled { .. }), "{err}");

    let resolution = mapper.settings_for(pair, MapKind::Map, None).expect("resolves");
    assert!(resolution.settings.fork.is_none());
}

#[test]
fn new_config_discards_the_previous_rule() {
    let (mapper, pair) = person_mapper();
    mapper.for_type(pair).expect("rule").ignore(&["Age"]).expect("edits");
    let source = person(&mapper, pair, "Ada", 36);
    let before = mapper.adapt(&source, pair).expect("maps");
    let age = mapper.registry().name("Age");
    assert_eq!(before.member(age).expect("member"), Value::Int(0));

    mapper.new_config(pair).ignore(&["Name"]).expect("edits");
    let after = mapper.adapt(&source, pair).expect("maps");
    assert_eq!(after.member(age).expect("member"), Value::Int(36));
}

#[test]
fn remove_restores_the_builtin_behavior() {
    let (mapper, pair) = person_mapper();
    mapper.for_type(pair).expect("rule").ignore(&["Age"]).expect("edits");
    mapper.compile_pair(pair).expect("compiles");

    assert!(mapper.remove(pair));
    assert!(!mapper.remove(pair));
    assert_eq!(mapper.cached_functions(), 0);

    let out = mapper
        .adapt(&person(&mapper, pair, "Ada", 36), pair)
        .expect("maps");
    let age = mapper.registry().name("Age");
    assert_eq!(out.member(age).expect("member"), Value::Int(36));
}

#[test]
fn clear_cache_unfreezes_every_rule() {
    let (mapper, pair) = person_mapper();
    mapper.for_type(pair).expect("rule").max_depth(3).expect("edits");
    mapper.compile().expect("compiles");
    assert!(mapper.for_type(pair).is_err());

    mapper.clear_cache();
    assert_eq!(mapper.cached_functions(), 0);
    assert!(mapper.for_type(pair).is_ok());
}

#[test]
fn settings_are_cached_until_configuration_changes() {
    let (mapper, pair) = person_mapper();
    let first = mapper.settings_for(pair, MapKind::Map, None).expect("resolves");
    let second = mapper.settings_for(pair, MapKind::Map, None).expect("cached");
    assert!(Arc::ptr_eq(&first, &second));
    assert!(!first.explicit);

    mapper
        .for_type(pair)
        .expect("rule")
        .ignore_null_values(true)
        .expect("edits");
    let third = mapper.settings_for(pair, MapKind::Map, None).expect("resolves");
    assert!(!Arc::ptr_eq(&first, &third));
    assert!(third.explicit);
    assert!(third.settings.ignore_null_values());
}

#[test]
fn fork_resolutions_bypass_the_settings_cache() {
    let (mapper, pair) = person_mapper();
    let mut fork = Fork::default();
    fork.rule_mut(pair).max_depth = Some(1);

    let forked = mapper
        .settings_for(pair, MapKind::Map, Some(&fork))
        .expect("resolves");
    assert_eq!(forked.settings.max_depth, Some(1));

    let plain = mapper.settings_for(pair, MapKind::Map, None).expect("resolves");
    assert_eq!(plain.settings.max_depth, None);
}

#[test]
fn default_settings_apply_to_pairs_compiled_afterwards() {
    let (mapper, pair) = person_mapper();
    mapper.default_settings().ignore(&["Age"]).expect("edits");
    let out = mapper
        .adapt(&person(&mapper, pair, "Ada", 36), pair)
        .expect("maps");
    let age = mapper.registry().name("Age");
    assert_eq!(out.member(age).expect("member"), Value::Int(0));
}

#[test]
fn path_builds_member_chains_from_the_source() {
    let (mapper, _) = person_mapper();
    let r = mapper.registry();
    assert_eq!(
        mapper.path("Address.City"),
        ValueExpr::Source
            .member(r.name("Address"))
            .member(r.name("City"))
    );
    assert_eq!(mapper.path(""), ValueExpr::Source);
}

#[test]
fn function_table_reports_compile_failures_as_dispatch_errors() {
    let (mapper, pair) = person_mapper();
    mapper
        .for_type(pair)
        .expect("rule")
        .construct_using(ValueExpr::Source.member(mapper.registry().name("Missing")))
        .expect("edits");

    let err = FunctionTable::function(&mapper, pair, MapKind::Map).expect_err("fails");
    assert!(matches!(err, EvalError::Dispatch(_)), "{err}");
}
