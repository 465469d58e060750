use super::*;
use pretty_assertions::assert_eq;

fn name(raw: u32) -> Name {
    Name::from_raw(raw)
}

#[test]
fn test_clones_share_identity() {
    let obj = Value::object(TypeId::new(10), [(name(1), Value::Int(1))]);
    let alias = obj.clone();
    assert_eq!(obj.identity(), alias.identity());

    alias
        .set_member(name(1), Value::Int(2))
        .expect("objects accept member writes");
    assert_eq!(obj.member(name(1)), Ok(Value::Int(2)));
}

#[test]
fn test_structural_equality() {
    let a = Value::object(TypeId::new(10), [(name(1), Value::string("x"))]);
    let b = Value::object(TypeId::new(10), [(name(1), Value::string("x"))]);
    assert_ne!(a.identity(), b.identity());
    assert_eq!(a, b);

    let c = Value::object(TypeId::new(11), [(name(1), Value::string("x"))]);
    assert_ne!(a, c);
}

#[test]
fn test_member_through_null_propagates() {
    assert_eq!(Value::Null.member(name(3)), Ok(Value::Null));
    assert!(Value::Int(4).member(name(3)).is_err());
}

#[test]
fn test_runtime_type() {
    assert_eq!(Value::Null.runtime_type(), TypeId::OBJECT);
    assert_eq!(Value::string("a").runtime_type(), TypeId::STR);
    let list = Value::list(TypeId::new(12), vec![]);
    assert_eq!(list.runtime_type(), TypeId::new(12));
}

#[test]
fn test_dict_insert_overwrites_in_place() {
    let mut dict = DictData {
        ty: TypeId::new(20),
        entries: vec![(Value::string("a"), Value::Int(1))],
    };
    dict.insert(Value::string("b"), Value::Int(2));
    dict.insert(Value::string("a"), Value::Int(3));
    assert_eq!(dict.get_str("a"), Some(&Value::Int(3)));
    assert_eq!(dict.entries[0].0, Value::string("a"));
    assert_eq!(dict.entries.len(), 2);
}
