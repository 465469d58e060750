use pretty_assertions::assert_eq;

use super::*;
use crate::{HostFn, Name, NameConverter, TypeId, Value};

fn pair() -> TypePair {
    TypePair::new(TypeId::new(10), TypeId::new(11))
}

#[test]
fn push_records_node_and_type() {
    let mut arena = GraphArena::new();
    let src = arena.push(Node::Param(Param::Source), TypeId::new(10));
    let unit = arena.push(Node::Unit, TypeId::OBJECT);

    assert_eq!(src, NodeId::new(0));
    assert_eq!(unit, NodeId::new(1));
    assert_eq!(*arena.node(src), Node::Param(Param::Source));
    assert_eq!(arena.ty(src), TypeId::new(10));
    assert_eq!(arena.len(), 2);
}

#[test]
fn lists_and_bindings_are_contiguous() {
    let mut arena = GraphArena::new();
    let a = arena.push(Node::Unit, TypeId::OBJECT);
    let b = arena.push(Node::Unit, TypeId::OBJECT);

    let first = arena.push_list(&[a]);
    let second = arena.push_list(&[a, b]);
    assert_eq!(arena.list(first), &[a]);
    assert_eq!(arena.list(second), &[a, b]);
    assert!(arena.push_list(&[]).is_empty());

    let member = Name::from_raw(3);
    let range = arena.push_bindings(&[Binding { member, value: b }]);
    assert_eq!(arena.bindings(range), &[Binding { member, value: b }]);
}

#[test]
fn host_functions_and_matchers_are_deduplicated() {
    let mut arena = GraphArena::new();
    let f = HostFn::new("f", TypeId::INT, |_| Ok(Value::Int(1)));
    let g = HostFn::new("g", TypeId::INT, |_| Ok(Value::Int(2)));

    let f1 = arena.push_host_fn(f.clone());
    let g1 = arena.push_host_fn(g);
    let f2 = arena.push_host_fn(f);
    assert_eq!(f1, f2);
    assert_ne!(f1, g1);

    let m1 = arena.push_matcher(NameConverter::LowerCase);
    let m2 = arena.push_matcher(NameConverter::LowerCase);
    assert_eq!(m1, m2);
    assert_eq!(*arena.matcher(m1), NameConverter::LowerCase);
}

#[test]
fn locals_are_counted() {
    let mut arena = GraphArena::new();
    assert_eq!(arena.new_local(), LocalId::new(0));
    assert_eq!(arena.new_local(), LocalId::new(1));
    assert_eq!(arena.local_count(), 2);
}

#[test]
fn self_contained_rejects_invoke() {
    let mut arena = GraphArena::new();
    let src = arena.push(Node::Param(Param::Source), pair().source);
    let graph = MapGraph::new(pair(), MapKind::Projection, arena.clone(), src);
    assert!(graph.is_self_contained());

    let call = arena.push(
        Node::Invoke {
            pair: pair(),
            kind: MapKind::Map,
            source: src,
            target: NodeId::INVALID,
        },
        pair().destination,
    );
    let graph = MapGraph::new(pair(), MapKind::Map, arena, call);
    assert!(!graph.is_self_contained());
}

#[test]
fn scalar_conversion_table() {
    assert!(Conversion::scalar_supported(TypeId::INT, TypeId::FLOAT));
    assert!(Conversion::scalar_supported(TypeId::BOOL, TypeId::INT));
    assert!(Conversion::scalar_supported(TypeId::CHAR, TypeId::INT));
    assert!(Conversion::scalar_supported(TypeId::TIMESTAMP, TypeId::INT));
    assert!(!Conversion::scalar_supported(TypeId::CHAR, TypeId::FLOAT));
    assert!(!Conversion::scalar_supported(TypeId::STR, TypeId::INT));
    assert!(!Conversion::scalar_supported(TypeId::new(20), TypeId::new(20)));
}

#[test]
fn debug_formats_ids() {
    assert_eq!(format!("{:?}", NodeId::new(4)), "NodeId(4)");
    assert_eq!(format!("{:?}", LocalId::INVALID), "LocalId::INVALID");
    assert_eq!(format!("{:?}", NodeRange::new(2, 3)), "NodeRange(2..+3)");
}
