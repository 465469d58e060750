use pretty_assertions::assert_eq;

use super::*;
use crate::{AccessSet, MemberKind};

fn person_hierarchy(registry: &mut TypeRegistry) -> (TypeId, TypeId) {
    let base = registry
        .class("Entity")
        .property("Id", TypeId::INT)
        .property("Name", TypeId::STR)
        .register()
        .expect("register Entity");
    let derived = registry
        .class("Person")
        .base(base)
        .property("Name", TypeId::STR)
        .readonly("Age", TypeId::INT)
        .register()
        .expect("register Person");
    (base, derived)
}

#[test]
fn builtins_are_preregistered() {
    let registry = TypeRegistry::new();
    assert_eq!(registry.len(), TypeId::BUILTINS.len());
    assert_eq!(registry.type_name(TypeId::STR), "str");
    assert_eq!(registry.by_name("int"), Some(TypeId::INT));
    assert_eq!(registry.kind(TypeId::OBJECT), Some(&TypeKind::Object));
    assert!(registry.is_primitive(TypeId::TIMESTAMP));
    assert!(!registry.is_primitive(TypeId::OBJECT));
}

#[test]
fn duplicate_names_are_rejected() {
    let mut registry = TypeRegistry::new();
    registry.register_interface("IThing").expect("first");
    assert_eq!(
        registry.register_interface("IThing"),
        Err(RegistryError::DuplicateType("IThing".to_owned()))
    );
}

#[test]
fn base_must_be_a_class() {
    let mut registry = TypeRegistry::new();
    let err = registry
        .class("Broken")
        .base(TypeId::INT)
        .register()
        .expect_err("int is not a class");
    assert!(matches!(err, RegistryError::InvalidBase { .. }));
}

#[test]
fn members_are_flattened_with_overrides() {
    let mut registry = TypeRegistry::new();
    let (_, person) = person_hierarchy(&mut registry);

    let names: Vec<&str> = registry
        .members(person)
        .iter()
        .map(|m| registry.text(m.name))
        .collect();
    assert_eq!(names, vec!["Id", "Name", "Age"]);

    let cached = registry.members(person);
    assert!(Arc::ptr_eq(&cached, &registry.members(person)));
}

#[test]
fn inheritance_distance_walks_bases() {
    let mut registry = TypeRegistry::new();
    let (entity, person) = person_hierarchy(&mut registry);
    let employee = registry
        .class("Employee")
        .base(person)
        .register()
        .expect("register Employee");

    assert_eq!(registry.inheritance_distance(employee, employee), Some(0));
    assert_eq!(registry.inheritance_distance(employee, person), Some(1));
    assert_eq!(registry.inheritance_distance(employee, entity), Some(2));
    assert_eq!(registry.inheritance_distance(entity, employee), None);
}

#[test]
fn interfaces_are_inherited() {
    let mut registry = TypeRegistry::new();
    let iface = registry.register_interface("IEntity").expect("iface");
    let base = registry
        .class("Base")
        .implements(iface)
        .register()
        .expect("base");
    let derived = registry.class("Derived").base(base).register().expect("derived");
    assert!(registry.implements(derived, iface));
    assert!(!registry.implements(TypeId::INT, iface));
}

#[test]
fn structural_types_are_registered_once() {
    let mut registry = TypeRegistry::new();
    let a = registry.array_of(TypeId::INT).expect("int[]");
    let b = registry.array_of(TypeId::INT).expect("int[]");
    assert_eq!(a, b);
    assert_eq!(registry.type_name(a), "int[]");

    let grid = registry.multi_array_of(TypeId::INT, 2).expect("int[,]");
    assert_eq!(registry.type_name(grid), "int[,]");

    let opt = registry.nullable_of(TypeId::INT).expect("int?");
    assert_eq!(registry.nullable_of(opt), Ok(opt));
    assert_eq!(registry.unwrap_nullable(opt), TypeId::INT);
}

#[test]
fn record_and_class_shapes() {
    let mut registry = TypeRegistry::new();
    let record = registry
        .class("PointRecord")
        .readonly("X", TypeId::INT)
        .readonly("Y", TypeId::INT)
        .constructor(&[("x", TypeId::INT), ("y", TypeId::INT)])
        .register()
        .expect("record");
    let class = registry
        .class("Point")
        .property("X", TypeId::INT)
        .register()
        .expect("class");

    assert!(registry.is_record_shaped(record));
    assert!(!registry.has_writable_members(record));
    assert!(registry.has_writable_members(class));
    assert!(!registry.is_record_shaped(class));
    assert_eq!(
        registry.constructors(record)[0].params[0].kind,
        MemberKind::CtorParam
    );
}

#[test]
fn default_values_follow_value_semantics() {
    let mut registry = TypeRegistry::new();
    let color = registry
        .register_enum("Color", &[("Red", 1), ("None", 0)])
        .expect("enum");
    let point = registry
        .class("Vec2")
        .value_type()
        .field("X", TypeId::FLOAT)
        .register()
        .expect("struct");
    let (_, person) = person_hierarchy(&mut registry);

    assert_eq!(registry.default_value(TypeId::INT), Value::Int(0));
    assert_eq!(registry.default_value(TypeId::STR), Value::Null);
    assert_eq!(
        registry.default_value(color),
        Value::enum_variant(color, registry.name("None"), 0)
    );
    assert_eq!(registry.default_value(person), Value::Null);

    let zero = registry.default_value(point);
    assert_eq!(zero.member(registry.name("X")), Ok(Value::Float(0.0)));
}

#[test]
fn instantiate_builds_empty_containers() {
    let mut registry = TypeRegistry::new();
    let list = registry.register_collection("List<int>", TypeId::INT).expect("list");
    let dict = registry
        .register_dictionary("Dict<str,int>", TypeId::STR, TypeId::INT)
        .expect("dict");

    assert_eq!(registry.instantiate(list), Value::list(list, Vec::new()));
    assert_eq!(registry.instantiate(dict), Value::dict(dict, Vec::new()));
}

#[test]
fn methods_are_found_on_bases() {
    let mut registry = TypeRegistry::new();
    let base = registry
        .class("Base")
        .method("GetCode", TypeId::STR, |_| Ok(Value::string("B")))
        .register()
        .expect("base");
    let derived = registry.class("Derived").base(base).register().expect("derived");

    let method = registry
        .method(derived, registry.name("GetCode"))
        .expect("inherited method");
    assert_eq!(method.func.call(&[Value::Null]), Ok(Value::string("B")));
}

#[test]
fn visibility_filters_members() {
    let mut registry = TypeRegistry::new();
    let ty = registry
        .class("Secretive")
        .private_field("secret", TypeId::STR)
        .register()
        .expect("class");
    let member = &registry.members(ty)[0];
    assert!(!member.is_visible(AccessSet::default()));
    assert!(member.is_visible(AccessSet::PUBLIC | AccessSet::PRIVATE));
}

#[test]
fn generic_instances_know_their_definition() {
    let mut registry = TypeRegistry::new();
    let page = registry.register_generic_definition("Page<>", 1).expect("def");
    let page_int = registry
        .class("Page<int>")
        .generic(page, vec![TypeId::INT])
        .property("Items", TypeId::INT)
        .register()
        .expect("instance");
    assert_eq!(registry.generic_definition(page_int), Some(page));
    assert_eq!(registry.generic_definition(page), None);
}

#[test]
fn declared_type_is_filled_by_registration() {
    let mut registry = TypeRegistry::new();
    let node = registry.declare("Node").expect("declare");
    assert_eq!(registry.declare("Node"), Ok(node));

    let registered = registry
        .class("Node")
        .property("Value", TypeId::INT)
        .property("Next", node)
        .register()
        .expect("register");
    assert_eq!(registered, node);
    assert_eq!(registry.members(node).len(), 2);
    assert!(matches!(
        registry.declare("Node"),
        Err(RegistryError::DuplicateType(_))
    ));
}
