// TransformedMap integration tests.
//
// Each test notes the behavior it verifies. The core invariants exercised:
// - Identity: domain keys with equal transforms address one entry.
// - Strictness: only `get`/`delete` fail, with the offending domain key.
// - Order: iteration yields storage keys in insertion order; overwrite keeps
//   position.
// - Derivation: filter/map/map_keys/map_values never touch the source.
use rstest::rstest;
use transform_map::{
    GetOr, HashedMap, MapOptions, NotFoundError, Operation, TransformedMap, DEFAULT_LABEL,
};

#[derive(Clone, Debug)]
struct Timestamp {
    year: u16,
    month: u8,
    day: u8,
    hour: u8,
    minute: u8,
}

impl Timestamp {
    fn new(year: u16, month: u8, day: u8, hour: u8, minute: u8) -> Self {
        Self {
            year,
            month,
            day,
            hour,
            minute,
        }
    }

    fn iso_date(&self) -> String {
        format!("{:04}-{:02}-{:02}", self.year, self.month, self.day)
    }
}

fn numbers() -> TransformedMap<i32, &'static str> {
    TransformedMap::from_entries([(1, "one"), (2, "two"), (3, "three"), (4, "four")])
}

// Test: entries come back in insertion order with identity keys.
#[test]
fn identity_map_entries_in_insertion_order() {
    let mut m = TransformedMap::new();
    m.set(1, "one");
    m.set(2, "two");
    let entries: Vec<_> = m.entries().map(|(k, v)| (*k, *v)).collect();
    assert_eq!(entries, [(1, "one"), (2, "two")]);
    assert_eq!(m.label(), DEFAULT_LABEL);
    assert_eq!(m.type_name(), "TransformedMap");
}

// Test: two distinct timestamps on the same calendar day address one entry.
#[test]
fn same_day_timestamps_share_an_entry() {
    let mut m: HashedMap<Timestamp, i32> = HashedMap::with_hash(Timestamp::iso_date);
    m.set(Timestamp::new(2020, 1, 1, 9, 30), 1);

    let later = Timestamp::new(2020, 1, 1, 23, 59);
    assert_eq!(m.get(&later).ok(), Some(&1));
    assert!(m.has(&later));
    assert!(!m.has(&Timestamp::new(2020, 1, 2, 0, 0)));

    assert_eq!(m.set(later, 2), Some(1));
    assert_eq!(m.len(), 1);
    assert_eq!(m.keys().collect::<Vec<_>>(), ["2020-01-01"]);
}

// Test: strict delete on an empty map reports the key, the map and the op.
#[test]
fn delete_on_empty_map_fails_with_key() {
    let mut m: TransformedMap<i32, String> = TransformedMap::labeled("empty");
    let err: NotFoundError<i32> = m.delete(&5).unwrap_err();
    assert_eq!(*err.key(), 5);
    assert_eq!(err.operation(), Operation::Delete);
    assert_eq!(err.map().label(), "empty");
    assert_eq!(err.map().type_name(), "TransformedMap");
    assert!(err.originates_from(&m));
    assert!(!err.originates_from(&TransformedMap::<i32, String>::new()));
}

// Test: strict get reports the domain key, not the storage key.
#[test]
fn get_miss_carries_domain_key() {
    let m: TransformedMap<String, u8, usize> = TransformedMap::with_transform(|s: &String| s.len());
    let err = m.get(&"abc".to_string()).unwrap_err();
    assert_eq!(err.key(), "abc");
    assert_eq!(err.operation(), Operation::Get);
    assert!(err.to_string().contains("\"abc\""));
}

// Test: a stored "falsy" value is present, not a miss.
#[rstest]
#[case(0)]
#[case(i64::MIN)]
fn stored_zero_is_present(#[case] value: i64) {
    let mut m = TransformedMap::new();
    m.set("k", value);
    assert_eq!(m.get(&"k").ok(), Some(&value));
    assert_eq!(*m.get_or(&"k", &99), value);
    assert!(m.has(&"k"));
}

#[test]
fn stored_empty_string_is_present() {
    let mut m = TransformedMap::new();
    m.set(7u8, String::new());
    assert_eq!(m.get(&7).map(String::as_str).ok(), Some(""));
    assert!(m.get_or_else(&7, || 0usize).is_found());
}

// Test: fallbacks are returned only on a miss; the lazy form may change type.
#[test]
fn get_or_and_get_or_else() {
    let m = numbers();
    assert_eq!(*m.get_or(&1, &"none"), "one");
    assert_eq!(*m.get_or(&9, &"none"), "none");

    let calls = std::cell::Cell::new(0);
    let hit = m.get_or_else(&2, || {
        calls.set(calls.get() + 1);
        -1i64
    });
    assert_eq!(hit, GetOr::Found(&"two"));
    let miss = m.get_or_else(&9, || {
        calls.set(calls.get() + 1);
        -1i64
    });
    assert_eq!(miss, GetOr::Fallback(-1));
    assert_eq!(calls.get(), 1);
    assert_eq!(miss.either(|s| s.len() as i64, |n| n), -1);
}

// Test: delete_if_exists returns true exactly when the key was present.
#[test]
fn delete_if_exists_matches_has() {
    let mut m = numbers();
    assert!(m.has(&2));
    assert!(m.delete_if_exists(&2));
    assert!(!m.has(&2));
    assert!(!m.delete_if_exists(&2));
    assert_eq!(m.len(), 3);
    assert_eq!(m.delete(&3).ok(), Some("three"));
    assert_eq!(m.keys().copied().collect::<Vec<_>>(), [1, 4]);
}

// Test: from_entries keeps first position and last value on transform collisions.
#[test]
fn from_entries_last_write_wins() {
    let m = TransformedMap::from_entries_with(
        [("Apple", 1), ("banana", 2), ("APPLE", 3)],
        MapOptions::with_transform(|s: &&str| s.to_lowercase()).label("fruit"),
    );
    let entries: Vec<_> = m.entries().map(|(k, v)| (k.as_str(), *v)).collect();
    assert_eq!(entries, [("apple", 3), ("banana", 2)]);
    assert_eq!(m.label(), "fruit");
}

#[test]
fn from_custom_entries_uses_string_hash() {
    let m = HashedMap::from_custom_entries([((1, 2), 'a'), ((2, 1), 'b')], |&(x, y): &(i32, i32)| {
        format!("{}", x + y)
    });
    assert_eq!(m.len(), 1);
    assert_eq!(m.get(&(0, 3)).ok(), Some(&'b'));
}

// Test: clear empties the map; the map stays usable.
#[test]
fn clear_then_reuse() {
    let mut m = numbers();
    m.clear();
    assert!(m.is_empty());
    assert!(m.get(&1).is_err());
    m.set(9, "nine");
    assert_eq!(m.entries().count(), 1);
}

// Test: keys/values/entries are re-callable and independent.
#[test]
fn traversals_are_fresh_per_call() {
    let m = numbers();
    let mut a = m.keys();
    assert_eq!(a.next(), Some(&1));
    let b: Vec<_> = m.keys().copied().collect();
    assert_eq!(b, [1, 2, 3, 4]);
    assert_eq!(a.next(), Some(&2));
    assert_eq!(m.values().rev().next(), Some(&"four"));
    assert_eq!(m.entries().len(), 4);

    let direct: Vec<_> = (&m).into_iter().collect();
    let via_entries: Vec<_> = m.entries().collect();
    assert_eq!(direct, via_entries);
}

// Test: filter keeps accepted entries and counts accepted-so-far.
#[test]
fn filter_by_value_length() {
    let m = numbers();
    let before: Vec<_> = m.entries().map(|(k, v)| (*k, *v)).collect();
    let mut indices = Vec::new();
    let long = m.filter(|v, _, i, _| {
        indices.push(i);
        v.len() > 3
    });
    assert_eq!(
        long.entries().map(|(k, v)| (*k, *v)).collect::<Vec<_>>(),
        [(3, "three"), (4, "four")]
    );
    assert_eq!(indices, [0, 0, 0, 1]);
    assert_eq!(m.entries().map(|(k, v)| (*k, *v)).collect::<Vec<_>>(), before);
    assert_eq!(long.label(), m.label());
}

// Test: the predicate sees the original map, unchanged.
#[test]
fn filter_predicate_sees_source() {
    let m = numbers();
    let kept = m.filter(|_, k, _, src| src.len() == 4 && src.has(&(k + 1)));
    assert_eq!(kept.keys().copied().collect::<Vec<_>>(), [1, 2, 3]);
}

// Test: map rebuilds through the transform; later collisions win.
#[test]
fn map_rebuilds_through_transform() {
    let m: TransformedMap<i32, &str, i32> =
        TransformedMap::from_entries_with(numbers(), MapOptions::with_transform(|n: &i32| n % 3));
    // 1 -> 1, 2 -> 2, 3 -> 0, 4 -> 1 (overwrites "one")
    assert_eq!(
        m.entries().map(|(k, v)| (*k, *v)).collect::<Vec<_>>(),
        [(1, "four"), (2, "two"), (0, "three")]
    );

    let mut positions = Vec::new();
    let lengths = m.map(|v, k, i, _| {
        positions.push(i);
        (*k + 10, v.len())
    });
    assert_eq!(positions, [0, 1, 2]);
    // 11 -> 2, 12 -> 0, 10 -> 1
    assert_eq!(
        lengths.entries().map(|(k, v)| (*k, *v)).collect::<Vec<_>>(),
        [(2, 4), (0, 3), (1, 5)]
    );
    assert_eq!(m.len(), 3);
}

#[test]
fn map_with_colliding_keys_keeps_last() {
    let m = numbers();
    let collapsed = m.map(|v, _, _, _| (0, *v));
    assert_eq!(collapsed.len(), 1);
    assert_eq!(collapsed.get(&0).ok(), Some(&"four"));
}

#[test]
fn map_keys_and_map_values() {
    let m = numbers();
    let shifted = m.map_keys(|k, _, _, _| k * 100);
    assert_eq!(shifted.keys().copied().collect::<Vec<_>>(), [100, 200, 300, 400]);
    assert_eq!(shifted.get(&300).ok(), Some(&"three"));

    let upper = m.map_values(|v, _, _, _| v.to_uppercase());
    assert_eq!(upper.get(&4).ok().map(String::as_str), Some("FOUR"));
    assert_eq!(m.get(&4).ok(), Some(&"four"));
}

// Test: map_values keeps storage keys without re-running the transform.
#[test]
fn map_values_keeps_storage_keys() {
    let m = TransformedMap::from_entries_with(
        [("A".to_string(), 1)],
        MapOptions::with_transform(|s: &String| s.to_lowercase()),
    );
    let doubled = m.map_values(|v, _, _, _| v * 2);
    assert_eq!(doubled.find_stored("a"), Some((&"a".to_string(), &2)));
    assert_eq!(doubled.get(&"A".to_string()).ok(), Some(&2));
}

// Test: every derivation emits a trace event with source and result sizes.
#[test]
fn derivations_are_traced() {
    use std::io;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    let captured = Captured::default();
    let writer = captured.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish();

    tracing::subscriber::with_default(subscriber, || {
        let m = numbers();
        let _ = m.filter(|v, _, _, _| v.len() > 3);
        let _ = m.map(|v, k, _, _| (*k, v.len()));
        let _ = m.map_values(|v, _, _, _| v.len());
    });

    let out = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
    for event in ["filtered map", "mapped map", "mapped values"] {
        assert!(out.contains(event), "missing {event:?} in {out:?}");
    }
    assert!(out.contains("from=4 to=2"), "{out:?}");
    assert_eq!(out.matches("from=4 to=4").count(), 2, "{out:?}");
}

#[test]
fn retain_and_get_mut() {
    let mut m = numbers().map_values(|v, _, _, _| v.len());
    *m.get_mut(&1).unwrap() += 10;
    m.retain(|k, v| {
        *v += 1;
        k % 2 == 1
    });
    assert_eq!(
        m.entries().map(|(k, v)| (*k, *v)).collect::<Vec<_>>(),
        [(1, 14), (3, 6)]
    );
}

#[test]
fn clone_and_equality() {
    let m = numbers();
    let c = m.clone();
    assert_eq!(m, c);
    assert_ne!(m.id(), c.id());
    let reordered = TransformedMap::from_entries([(2, "two"), (1, "one"), (3, "three"), (4, "four")]);
    assert_ne!(m, reordered);
}

#[test]
fn into_entries_yields_owned_pairs() {
    let m = numbers();
    let owned: Vec<(i32, &str)> = m.into_iter().collect();
    assert_eq!(owned, [(1, "one"), (2, "two"), (3, "three"), (4, "four")]);
}

#[test]
fn collect_and_extend() {
    let mut m: TransformedMap<char, u32> = "abc".chars().zip(1..).collect();
    m.extend([('c', 30), ('d', 4)]);
    assert_eq!(
        m.entries().map(|(k, v)| (*k, *v)).collect::<Vec<_>>(),
        [('a', 1), ('b', 2), ('c', 30), ('d', 4)]
    );
}

#[test]
fn debug_shows_label_and_entries() {
    let m = TransformedMap::<u8, u8>::from_entries_with([(1, 2)], MapOptions::new().label("dbg"));
    assert_eq!(format!("{m:?}"), "TransformedMap(\"dbg\") {1: 2}");
}

#[cfg(feature = "serde")]
#[test]
fn serializes_storage_keys_in_order() {
    let m = TransformedMap::from_entries_with(
        [("B", 1), ("a", 2)],
        MapOptions::with_transform(|s: &&str| s.to_lowercase()),
    );
    assert_eq!(serde_json::to_string(&m).unwrap(), r#"{"b":1,"a":2}"#);
}
