use super::*;

#[test]
fn test_shard_and_local_round_trip() {
    let name = Name::new(3, 42);
    assert_eq!(name.shard(), 3);
    assert_eq!(name.local(), 42);
    assert_eq!(Name::from_raw(name.raw()), name);
}

#[test]
fn test_empty_is_default() {
    assert_eq!(Name::default(), Name::EMPTY);
    assert_eq!(Name::EMPTY.raw(), 0);
}

#[test]
fn test_debug_shows_layout() {
    assert_eq!(format!("{:?}", Name::new(1, 7)), "Name(shard=1, local=7)");
}
