#![allow(missing_docs)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use rescode::{CodecRegistry, FrozenMap, MapAccumulator, RescodeError};

type Target = FrozenMap<String, i64>;

fn registry_with_builder() -> CodecRegistry {
    let registry = CodecRegistry::with_defaults();
    registry.register_map::<Target>();
    registry.register_builder::<Target, _>(FrozenMap::from_entries);
    registry
}

#[test]
fn test_accumulate_and_finalize() {
    let registry = registry_with_builder();
    let record = registry.map_record::<Target>().unwrap();

    let mut accumulator = MapAccumulator::<Target>::new();
    accumulator.begin().unwrap();
    accumulator.add_entry("a".to_owned(), 1).unwrap();
    accumulator.add_entry("b".to_owned(), 2).unwrap();
    assert_eq!(accumulator.staged_len(), 2);

    let map = accumulator.finalize(&registry, &record).unwrap();
    assert_eq!(map.get(&"a".to_owned()), Some(&1));
    assert_eq!(map.get(&"b".to_owned()), Some(&2));
}

#[test]
fn test_last_key_wins_in_staging() {
    let registry = registry_with_builder();
    let record = registry.map_record::<Target>().unwrap();

    let mut accumulator = MapAccumulator::<Target>::new();
    accumulator.begin().unwrap();
    accumulator.add_entry("a".to_owned(), 1).unwrap();
    accumulator.add_entry("a".to_owned(), 2).unwrap();
    assert_eq!(accumulator.staged_len(), 1);

    let map = accumulator.finalize(&registry, &record).unwrap();
    assert_eq!(map.get(&"a".to_owned()), Some(&2));
}

#[test]
fn test_begin_on_open_context_is_protocol_error() {
    let mut accumulator = MapAccumulator::<Target>::new();
    accumulator.begin().unwrap();
    let err = accumulator.begin().unwrap_err();
    assert!(matches!(err, RescodeError::Protocol(_)), "{err}");
}

#[test]
fn test_add_entry_without_begin_is_invalid_state() {
    let mut accumulator = MapAccumulator::<Target>::new();
    let err = accumulator.add_entry("a".to_owned(), 1).unwrap_err();
    assert!(matches!(err, RescodeError::InvalidState(_)), "{err}");
}

#[test]
fn test_double_finalize_is_invalid_state() {
    let registry = registry_with_builder();
    let record = registry.map_record::<Target>().unwrap();

    let mut accumulator = MapAccumulator::<Target>::new();
    accumulator.begin().unwrap();
    accumulator.finalize(&registry, &record).unwrap();

    let err = accumulator.finalize(&registry, &record).unwrap_err();
    assert!(matches!(err, RescodeError::InvalidState(_)), "{err}");

    // A finalized accumulator cannot be reopened either.
    let err = accumulator.begin().unwrap_err();
    assert!(matches!(err, RescodeError::InvalidState(_)), "{err}");
}

#[test]
fn test_finalize_without_begin_is_invalid_state() {
    let registry = registry_with_builder();
    let record = registry.map_record::<Target>().unwrap();

    let mut accumulator = MapAccumulator::<Target>::new();
    let err = accumulator.finalize(&registry, &record).unwrap_err();
    assert!(matches!(err, RescodeError::InvalidState(_)), "{err}");
}

#[test]
fn test_empty_finalize_invokes_strategy_with_empty_sequence() {
    let registry = CodecRegistry::with_defaults();
    registry.register_map::<Target>();

    let seen_lengths = Arc::new(AtomicUsize::new(usize::MAX));
    let lengths = seen_lengths.clone();
    registry.register_builder::<Target, _>(move |entries| {
        lengths.store(entries.len(), Ordering::SeqCst);
        FrozenMap::from_entries(entries)
    });

    let record = registry.map_record::<Target>().unwrap();
    let mut accumulator = MapAccumulator::<Target>::new();
    accumulator.begin().unwrap();
    let map = accumulator.finalize(&registry, &record).unwrap();

    assert!(map.is_empty());
    // The strategy saw exactly the staged (empty) sequence, nothing else.
    assert_eq!(seen_lengths.load(Ordering::SeqCst), 0);
}

#[test]
fn test_failed_finalize_leaves_no_container() {
    let registry = CodecRegistry::with_defaults();
    registry.register_map::<Target>();
    // No builder registered: discovery fails at finalize.

    let record = registry.map_record::<Target>().unwrap();
    let mut accumulator = MapAccumulator::<Target>::new();
    accumulator.begin().unwrap();
    accumulator.add_entry("a".to_owned(), 1).unwrap();

    let err = accumulator.finalize(&registry, &record).unwrap_err();
    assert!(matches!(err, RescodeError::UnsupportedType(_)), "{err}");

    // The staging context is consumed; the accumulator is spent, not
    // half-open.
    assert_eq!(accumulator.staged_len(), 0);
    let err = accumulator.add_entry("b".to_owned(), 2).unwrap_err();
    assert!(matches!(err, RescodeError::InvalidState(_)), "{err}");
}
