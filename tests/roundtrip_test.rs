#![allow(missing_docs)]

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use rescode::{CodecRegistry, FrozenMap, Rescode};

/// A registry covering every container instantiation these tests use.
fn test_registry() -> CodecRegistry {
    let registry = CodecRegistry::with_defaults();

    registry.register_map::<FrozenMap<String, i64>>();
    registry.register_builder::<FrozenMap<String, i64>, _>(FrozenMap::from_entries);

    registry.register_map::<FrozenMap<String, String>>();
    registry.register_builder::<FrozenMap<String, String>, _>(FrozenMap::from_entries);

    registry.register_map::<FrozenMap<u32, String>>();
    registry.register_builder::<FrozenMap<u32, String>, _>(FrozenMap::from_entries);

    registry.register_map::<FrozenMap<String, f64>>();
    registry.register_builder::<FrozenMap<String, f64>, _>(FrozenMap::from_entries);

    registry.register_map::<FrozenMap<String, bool>>();
    registry.register_builder::<FrozenMap<String, bool>, _>(FrozenMap::from_entries);

    registry.register_map::<FrozenMap<String, FrozenMap<String, i64>>>();
    registry.register_builder::<FrozenMap<String, FrozenMap<String, i64>>, _>(
        FrozenMap::from_entries,
    );

    registry.register_map::<Arc<HashMap<String, i64>>>();
    registry.register_builder::<Arc<HashMap<String, i64>>, _>(|entries| {
        Arc::new(entries.into_iter().collect())
    });

    registry.register_map::<Arc<BTreeMap<String, i64>>>();
    registry.register_builder::<Arc<BTreeMap<String, i64>>, _>(|entries| {
        Arc::new(entries.into_iter().collect())
    });

    registry
}

#[test]
fn test_round_trip_string_to_int() {
    let registry = test_registry();
    let original = FrozenMap::from_entries(vec![
        ("alice".to_owned(), 9_i64),
        ("bob".to_owned(), -7_i64),
        ("carol".to_owned(), 0_i64),
    ]);

    let text = Rescode::to_string(&registry, &original).unwrap();
    let back: FrozenMap<String, i64> = Rescode::from_str(&registry, &text).unwrap();
    assert_eq!(back, original);
}

#[test]
fn test_round_trip_awkward_strings() {
    let registry = test_registry();
    let original = FrozenMap::from_entries(vec![
        ("plain".to_owned(), "value".to_owned()),
        ("needs \"quoting\"".to_owned(), "line\none".to_owned()),
        ("unicode ☃".to_owned(), "emoji 😀".to_owned()),
        ("".to_owned(), "empty key".to_owned()),
    ]);

    let text = Rescode::to_string(&registry, &original).unwrap();
    let back: FrozenMap<String, String> = Rescode::from_str(&registry, &text).unwrap();
    assert_eq!(back, original);
}

#[test]
fn test_round_trip_integer_keys_are_quoted() {
    let registry = test_registry();
    let original = FrozenMap::from_entries(vec![
        (7_u32, "seven".to_owned()),
        (42_u32, "answer".to_owned()),
    ]);

    let text = Rescode::to_string(&registry, &original).unwrap();
    // Keys always render in quoted lexical form, whatever their native type.
    assert!(text.contains("\"7\":"));
    assert!(text.contains("\"42\":"));

    let back: FrozenMap<u32, String> = Rescode::from_str(&registry, &text).unwrap();
    assert_eq!(back, original);
}

#[test]
fn test_round_trip_floats_and_bools() {
    let registry = test_registry();

    let floats = FrozenMap::from_entries(vec![
        ("half".to_owned(), 0.5_f64),
        ("whole".to_owned(), 3.0_f64),
        ("tiny".to_owned(), 1e-300_f64),
    ]);
    let text = Rescode::to_string(&registry, &floats).unwrap();
    let back: FrozenMap<String, f64> = Rescode::from_str(&registry, &text).unwrap();
    assert_eq!(back, floats);

    let bools = FrozenMap::from_entries(vec![
        ("yes".to_owned(), true),
        ("no".to_owned(), false),
    ]);
    let text = Rescode::to_string(&registry, &bools).unwrap();
    let back: FrozenMap<String, bool> = Rescode::from_str(&registry, &text).unwrap();
    assert_eq!(back, bools);
}

#[test]
fn test_round_trip_nested_collections() {
    let registry = test_registry();
    let original = FrozenMap::from_entries(vec![
        (
            "east".to_owned(),
            FrozenMap::from_entries(vec![("a".to_owned(), 1_i64), ("b".to_owned(), 2_i64)]),
        ),
        ("empty".to_owned(), FrozenMap::new()),
        (
            "west".to_owned(),
            FrozenMap::from_entries(vec![("c".to_owned(), 3_i64)]),
        ),
    ]);

    let text = Rescode::to_string(&registry, &original).unwrap();
    let back: FrozenMap<String, FrozenMap<String, i64>> =
        Rescode::from_str(&registry, &text).unwrap();
    assert_eq!(back, original);
}

#[test]
fn test_round_trip_foreign_containers() {
    let registry = test_registry();

    let mut inner = HashMap::new();
    inner.insert("x".to_owned(), 1_i64);
    inner.insert("y".to_owned(), 2_i64);
    let shared: Arc<HashMap<String, i64>> = Arc::new(inner);

    let text = Rescode::to_string(&registry, &shared).unwrap();
    let back: Arc<HashMap<String, i64>> = Rescode::from_str(&registry, &text).unwrap();
    assert_eq!(back, shared);

    let mut sorted = BTreeMap::new();
    sorted.insert("a".to_owned(), 1_i64);
    sorted.insert("b".to_owned(), 2_i64);
    let shared: Arc<BTreeMap<String, i64>> = Arc::new(sorted);

    let text = Rescode::to_string(&registry, &shared).unwrap();
    // BTreeMap iterates sorted, so the wire form is fully deterministic.
    assert_eq!(text, r#"{"a":1,"b":2}"#);
    let back: Arc<BTreeMap<String, i64>> = Rescode::from_str(&registry, &text).unwrap();
    assert_eq!(back, shared);
}

#[test]
fn test_duplicate_wire_keys_last_wins() {
    let registry = test_registry();
    let back: FrozenMap<String, i64> =
        Rescode::from_str(&registry, r#"{"a":1,"b":5,"a":2}"#).unwrap();

    assert_eq!(back.len(), 2);
    assert_eq!(back.get(&"a".to_owned()), Some(&2));
    assert_eq!(back.get(&"b".to_owned()), Some(&5));
}

#[test]
fn test_empty_collection_round_trip() {
    let registry = test_registry();

    let empty: FrozenMap<String, i64> = FrozenMap::new();
    let text = Rescode::to_string(&registry, &empty).unwrap();
    assert_eq!(text, "{}");

    let back: FrozenMap<String, i64> = Rescode::from_str(&registry, "{}").unwrap();
    assert!(back.is_empty());
}

#[test]
fn test_read_rejects_value_type_mismatch() {
    let registry = test_registry();
    let result: rescode::Result<FrozenMap<String, i64>> =
        Rescode::from_str(&registry, r#"{"a":"not a number"}"#);
    assert!(matches!(result, Err(rescode::RescodeError::Codec(_))));
}

#[test]
fn test_read_rejects_null_values() {
    let registry = test_registry();
    let result: rescode::Result<FrozenMap<String, i64>> =
        Rescode::from_str(&registry, r#"{"a":null}"#);
    assert!(matches!(result, Err(rescode::RescodeError::Codec(_))));
}

#[test]
fn test_read_rejects_bad_key_lexical_form() {
    let registry = test_registry();
    let result: rescode::Result<FrozenMap<u32, String>> =
        Rescode::from_str(&registry, r#"{"not-a-number":"v"}"#);
    assert!(matches!(result, Err(rescode::RescodeError::Codec(_))));
}
