//! Shared host models for the integration tests.

#![allow(dead_code, reason = "each test binary uses a different subset")]

use morphc::{TypeId, TypeRegistry, Value};

/// A small domain: people with addresses, their DTOs, a patch type, and a
/// self-referential list node.
pub struct Model {
    pub registry: TypeRegistry,
    pub address: TypeId,
    pub address_dto: TypeId,
    pub person: TypeId,
    pub person_dto: TypeId,
    pub employee: TypeId,
    pub patch: TypeId,
    pub node: TypeId,
    pub node_dto: TypeId,
    pub people: TypeId,
    pub person_dtos: TypeId,
}

pub fn model() -> Model {
    let mut registry = TypeRegistry::new();
    let address = registry
        .class("Address")
        .property("Street", TypeId::STR)
        .property("City", TypeId::STR)
        .register()
        .expect("Address");
    let address_dto = registry
        .class("AddressDto")
        .property("Street", TypeId::STR)
        .property("City", TypeId::STR)
        .register()
        .expect("AddressDto");
    let person = registry
        .class("Person")
        .property("Name", TypeId::STR)
        .property("Age", TypeId::INT)
        .property("Address", address)
        .register()
        .expect("Person");
    let person_dto = registry
        .class("PersonDto")
        .property("Name", TypeId::STR)
        .property("Age", TypeId::INT)
        .property("Address", address_dto)
        .register()
        .expect("PersonDto");
    let employee = registry
        .class("Employee")
        .base(person)
        .property("Company", TypeId::STR)
        .register()
        .expect("Employee");
    let optional_int = registry.nullable_of(TypeId::INT).expect("int?");
    let patch = registry
        .class("PersonPatch")
        .property("Name", TypeId::STR)
        .property("Age", optional_int)
        .register()
        .expect("PersonPatch");

    let node = registry.declare("Node").expect("declare Node");
    registry
        .class("Node")
        .property("Value", TypeId::INT)
        .property("Next", node)
        .register()
        .expect("Node");
    let node_dto = registry.declare("NodeDto").expect("declare NodeDto");
    registry
        .class("NodeDto")
        .property("Value", TypeId::INT)
        .property("Next", node_dto)
        .register()
        .expect("NodeDto");

    let people = registry.register_collection("People", person).expect("People");
    let person_dtos = registry
        .register_collection("PersonDtos", person_dto)
        .expect("PersonDtos");

    Model {
        registry,
        address,
        address_dto,
        person,
        person_dto,
        employee,
        patch,
        node,
        node_dto,
        people,
        person_dtos,
    }
}

impl Model {
    pub fn address_value(&self, street: &str, city: &str) -> Value {
        let r = &self.registry;
        Value::object(
            self.address,
            [
                (r.name("Street"), Value::from(street)),
                (r.name("City"), Value::from(city)),
            ],
        )
    }

    pub fn person_value(&self, name: &str, age: i64, address: Value) -> Value {
        let r = &self.registry;
        Value::object(
            self.person,
            [
                (r.name("Name"), Value::from(name)),
                (r.name("Age"), Value::Int(age)),
                (r.name("Address"), address),
            ],
        )
    }

    /// `Value(1) -> Value(2) -> ... -> Value(n) -> null`.
    pub fn chain(&self, n: i64) -> Value {
        let value = self.registry.name("Value");
        let next = self.registry.name("Next");
        (1..=n).rev().fold(Value::Null, |tail, i| {
            Value::object(self.node, [(value, Value::Int(i)), (next, tail)])
        })
    }
}

/// Read a member path, panicking on shape errors.
pub fn read(registry: &TypeRegistry, value: &Value, path: &str) -> Value {
    path.split('.').fold(value.clone(), |current, segment| {
        current.member(registry.name(segment)).expect("object member")
    })
}
