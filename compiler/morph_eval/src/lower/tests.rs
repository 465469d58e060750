use std::sync::Arc;

use morph_ir::{
    BinaryOp, Conversion, EvalError, GraphArena, MapGraph, MapKind, NameConverter, Node, NodeId,
    Param, TypeId, TypePair, UnaryOp, Value,
};
use morph_types::TypeRegistry;
use pretty_assertions::assert_eq;
use rustc_hash::FxHashMap;

use crate::{lower, CompiledMap, FunctionTable, LowerError, MapContext};

#[derive(Default)]
struct Table(FxHashMap<(TypePair, MapKind), Arc<CompiledMap>>);

impl FunctionTable for Table {
    fn function(&self, pair: TypePair, kind: MapKind) -> Result<Arc<CompiledMap>, EvalError> {
        self.0
            .get(&(pair, kind))
            .cloned()
            .ok_or_else(|| EvalError::Dispatch(format!("{pair:?}")))
    }
}

fn compile(registry: &Arc<TypeRegistry>, pair: TypePair, arena: GraphArena, root: NodeId) -> CompiledMap {
    let graph = MapGraph::new(pair, MapKind::Map, arena, root);
    lower(&graph, registry).expect("graph lowers")
}

fn run(function: &CompiledMap, source: Value) -> Result<Value, EvalError> {
    let table = Table::default();
    let mut ctx = MapContext::new(&table);
    function.call(source, Value::Null, &mut ctx)
}

fn person(registry: &mut TypeRegistry) -> TypeId {
    registry
        .class("Person")
        .property("Name", TypeId::STR)
        .property("Age", TypeId::INT)
        .register()
        .expect("register Person")
}

#[test]
fn conditional_over_literals() {
    let registry = Arc::new(TypeRegistry::new());
    let mut arena = GraphArena::new();
    let source = arena.push(Node::Param(Param::Source), TypeId::INT);
    let limit = arena.push_const(Value::Int(18));
    let limit = arena.push(Node::Literal(limit), TypeId::INT);
    let cond = arena.push(
        Node::Binary {
            op: BinaryOp::GtEq,
            left: source,
            right: limit,
        },
        TypeId::BOOL,
    );
    let adult = arena.push_const(Value::from("adult"));
    let adult = arena.push(Node::Literal(adult), TypeId::STR);
    let minor = arena.push_const(Value::from("minor"));
    let minor = arena.push(Node::Literal(minor), TypeId::STR);
    let root = arena.push(
        Node::Conditional {
            cond,
            then: adult,
            otherwise: minor,
        },
        TypeId::STR,
    );

    let function = compile(&registry, TypePair::new(TypeId::INT, TypeId::STR), arena, root);
    assert_eq!(run(&function, Value::Int(30)), Ok(Value::from("adult")));
    assert_eq!(run(&function, Value::Int(3)), Ok(Value::from("minor")));
    // A null condition operand fails the comparison rather than branching.
    assert!(run(&function, Value::Null).is_err());
}

#[test]
fn logical_operators_short_circuit() {
    let registry = Arc::new(TypeRegistry::new());
    let mut arena = GraphArena::new();
    let source = arena.push(Node::Param(Param::Source), TypeId::OBJECT);
    let is_null = arena.push(
        Node::Unary {
            op: UnaryOp::IsNull,
            operand: source,
        },
        TypeId::BOOL,
    );
    // `source == null || source.not()` never evaluates the right side for null.
    let negated = arena.push(
        Node::Unary {
            op: UnaryOp::Not,
            operand: source,
        },
        TypeId::BOOL,
    );
    let root = arena.push(
        Node::Binary {
            op: BinaryOp::Or,
            left: is_null,
            right: negated,
        },
        TypeId::BOOL,
    );

    let function = compile(&registry, TypePair::new(TypeId::OBJECT, TypeId::BOOL), arena, root);
    assert_eq!(run(&function, Value::Null), Ok(Value::Bool(true)));
    assert_eq!(run(&function, Value::Bool(true)), Ok(Value::Bool(false)));
}

#[test]
fn construct_and_assign_members() {
    let mut registry = TypeRegistry::new();
    let ty = person(&mut registry);
    let name = registry.name("Name");
    let registry = Arc::new(registry);

    let mut arena = GraphArena::new();
    let source = arena.push(Node::Param(Param::Source), ty);
    let d_local = arena.new_local();
    let construct = arena.push(Node::Construct { ty }, ty);
    let init = arena.push(
        Node::Let {
            local: d_local,
            value: construct,
        },
        TypeId::OBJECT,
    );
    let d = arena.push(Node::Local(d_local), ty);
    let read = arena.push(
        Node::Member {
            target: source,
            member: name,
        },
        TypeId::STR,
    );
    let assign = arena.push(
        Node::Assign {
            target: d,
            member: name,
            value: read,
        },
        TypeId::OBJECT,
    );
    let nodes = arena.push_list(&[init, assign, d]);
    let root = arena.push(Node::Block { nodes }, ty);

    let function = compile(&registry, TypePair::new(ty, ty), arena, root);
    let source = Value::object(ty, [(name, Value::from("Ada"))]);
    let mapped = run(&function, source.clone()).expect("maps");

    assert_eq!(mapped.member(name), Ok(Value::from("Ada")));
    assert_ne!(mapped.identity(), source.identity());
    assert_eq!(mapped.member(registry.name("Age")), Ok(Value::Int(0)));
}

#[test]
fn assigning_into_null_fails() {
    let mut registry = TypeRegistry::new();
    let ty = person(&mut registry);
    let name = registry.name("Name");
    let registry = Arc::new(registry);

    let mut arena = GraphArena::new();
    let target = arena.push(Node::Default(ty), ty);
    let value = arena.push_const(Value::from("x"));
    let value = arena.push(Node::Literal(value), TypeId::STR);
    let root = arena.push(
        Node::Assign {
            target,
            member: name,
            value,
        },
        TypeId::OBJECT,
    );

    let function = compile(&registry, TypePair::new(ty, ty), arena, root);
    assert_eq!(
        run(&function, Value::Null),
        Err(EvalError::NullTarget {
            member: "Name".to_owned()
        })
    );
}

#[test]
fn value_type_defaults_are_fresh() {
    let mut registry = TypeRegistry::new();
    let point = registry
        .class("Point")
        .value_type()
        .field("X", TypeId::INT)
        .register()
        .expect("register Point");
    let registry = Arc::new(registry);

    let mut arena = GraphArena::new();
    let root = arena.push(Node::Default(point), point);
    let function = compile(&registry, TypePair::new(point, point), arena, root);

    let first = run(&function, Value::Null).expect("default");
    let second = run(&function, Value::Null).expect("default");
    assert_eq!(first, second);
    assert_ne!(first.identity(), second.identity());
}

#[test]
fn preserve_returns_the_registered_destination() {
    let mut registry = TypeRegistry::new();
    let ty = person(&mut registry);
    let registry = Arc::new(registry);
    let pair = TypePair::new(ty, ty);

    let mut arena = GraphArena::new();
    let source = arena.push(Node::Param(Param::Source), ty);
    let local = arena.new_local();
    let construct = arena.push(Node::Construct { ty }, ty);
    let populate = arena.push(Node::Unit, TypeId::OBJECT);
    let root = arena.push(
        Node::Preserve {
            source,
            pair,
            local,
            construct,
            populate,
        },
        ty,
    );
    let function = compile(&registry, pair, arena, root);

    let table = Table::default();
    let mut ctx = MapContext::new(&table);
    let source = registry.instantiate(ty);
    let first = function
        .call(source.clone(), Value::Null, &mut ctx)
        .expect("first");
    let again = function
        .call(source, Value::Null, &mut ctx)
        .expect("second");
    assert_eq!(first.identity(), again.identity());
    assert_eq!(ctx.preserved(), 1);

    // A fresh context forgets earlier destinations.
    let mut fresh = MapContext::new(&table);
    let other = function
        .call(registry.instantiate(ty), Value::Null, &mut fresh)
        .expect("third");
    assert_ne!(first.identity(), other.identity());
}

#[test]
fn sequences_map_and_refill_in_place() {
    let mut registry = TypeRegistry::new();
    let ints = registry.register_collection("Ints", TypeId::INT).expect("Ints");
    let strs = registry.register_collection("Strs", TypeId::STR).expect("Strs");
    let registry = Arc::new(registry);

    let mut arena = GraphArena::new();
    let source = arena.push(Node::Param(Param::Source), ints);
    let target = arena.push(Node::Param(Param::Destination), strs);
    let element = arena.new_local();
    let item = arena.push(Node::Local(element), TypeId::INT);
    let body = arena.push(
        Node::Convert {
            value: item,
            conversion: Conversion::ToStr,
        },
        TypeId::STR,
    );
    let root = arena.push(
        Node::PopulateSequence {
            source,
            target,
            element,
            body,
        },
        strs,
    );
    let graph = MapGraph::new(TypePair::new(ints, strs), MapKind::MapToTarget, arena, root);
    let function = lower(&graph, &registry).expect("lowers");

    let table = Table::default();
    let mut ctx = MapContext::new(&table);
    let existing = Value::list(strs, vec![Value::from("stale")]);
    let result = function
        .call(
            Value::list(ints, vec![Value::Int(1), Value::Int(2)]),
            existing.clone(),
            &mut ctx,
        )
        .expect("refills");

    assert_eq!(result.identity(), existing.identity());
    assert_eq!(existing.items(), Ok(vec![Value::from("1"), Value::from("2")]));
}

#[test]
fn dictionary_lookup_converts_keys() {
    let mut registry = TypeRegistry::new();
    let bag = registry
        .register_dictionary("Bag", TypeId::STR, TypeId::INT)
        .expect("Bag");
    let key = registry.name("fullname");
    let registry = Arc::new(registry);

    let mut arena = GraphArena::new();
    let source = arena.push(Node::Param(Param::Source), bag);
    let matcher = arena.push_matcher(NameConverter::LowerCase);
    let root = arena.push(
        Node::DictLookup {
            target: source,
            key,
            matcher,
        },
        TypeId::INT,
    );
    let function = compile(&registry, TypePair::new(bag, TypeId::INT), arena, root);

    let dict = Value::dict(bag, vec![(Value::from("FullName"), Value::Int(7))]);
    assert_eq!(run(&function, dict), Ok(Value::Int(7)));
    assert_eq!(run(&function, Value::dict(bag, Vec::new())), Ok(Value::Null));
    assert_eq!(run(&function, Value::Null), Ok(Value::Null));
}

#[test]
fn invoke_goes_through_the_function_table() {
    let registry = Arc::new(TypeRegistry::new());
    let doubled = TypePair::new(TypeId::INT, TypeId::INT);

    let mut arena = GraphArena::new();
    let source = arena.push(Node::Param(Param::Source), TypeId::INT);
    let root = arena.push(
        Node::Binary {
            op: BinaryOp::Add,
            left: source,
            right: source,
        },
        TypeId::INT,
    );
    let double = compile(&registry, doubled, arena, root);

    let mut arena = GraphArena::new();
    let source = arena.push(Node::Param(Param::Source), TypeId::INT);
    let root = arena.push(
        Node::Invoke {
            pair: doubled,
            kind: MapKind::Map,
            source,
            target: NodeId::INVALID,
        },
        TypeId::INT,
    );
    let caller = compile(&registry, TypePair::new(TypeId::INT, TypeId::OBJECT), arena, root);

    let mut table = Table::default();
    table.0.insert((doubled, MapKind::Map), Arc::new(double));
    let mut ctx = MapContext::new(&table);
    assert_eq!(caller.call(Value::Int(21), Value::Null, &mut ctx), Ok(Value::Int(42)));

    let empty = Table::default();
    let mut ctx = MapContext::new(&empty);
    assert!(matches!(
        caller.call(Value::Int(1), Value::Null, &mut ctx),
        Err(EvalError::Dispatch(_))
    ));
}

#[test]
fn malformed_graphs_are_rejected() {
    let registry = Arc::new(TypeRegistry::new());
    let pair = TypePair::new(TypeId::INT, TypeId::INT);

    let mut arena = GraphArena::new();
    let root = arena.push(
        Node::Unary {
            op: UnaryOp::Neg,
            operand: NodeId::new(5),
        },
        TypeId::INT,
    );
    let graph = MapGraph::new(pair, MapKind::Map, arena, root);
    assert_eq!(
        lower(&graph, &registry).map(|_| ()),
        Err(LowerError::InvalidNode(NodeId::new(5)))
    );

    let mut arena = GraphArena::new();
    let source = arena.push(Node::Param(Param::Source), TypeId::INT);
    let root = arena.push(
        Node::Invoke {
            pair,
            kind: MapKind::MapToTarget,
            source,
            target: NodeId::INVALID,
        },
        TypeId::INT,
    );
    let graph = MapGraph::new(pair, MapKind::MapToTarget, arena, root);
    assert!(matches!(
        lower(&graph, &registry),
        Err(LowerError::MissingOperand { .. })
    ));

    let mut arena = GraphArena::new();
    let root = arena.push(Node::Construct { ty: TypeId::new(999) }, TypeId::OBJECT);
    let graph = MapGraph::new(pair, MapKind::Map, arena, root);
    assert_eq!(
        lower(&graph, &registry).map(|_| ()),
        Err(LowerError::UnknownType(TypeId::new(999)))
    );
}
