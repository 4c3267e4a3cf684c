// CountedMap integration tests against the public API.
//
// Each test documents what behavior is being verified and which
// invariants are assumed or asserted. The core invariants exercised:
// - Counting: `len()` equals the distinct keys present, except that
//   remove/pop of an absent key still decrements.
// - Absence: unset keys read back as `None`.
// - Snapshots: keys/values/items never alias the map.
// - Escape hatch: `items_obj()` aliases storage and bypasses the counter.
use counted_map::{CountedMap, LengthMismatch};
use std::collections::BTreeSet;
use std::rc::Rc;

// Test: the reference walk-through from an empty map.
// Assumes: a fresh map has len 0.
// Verifies: overwrite keeps len, remove of a present key decrements,
// remove of an absent key drives len to -1.
#[test]
fn end_to_end_walkthrough() {
    let mut m: CountedMap<String, i32> = CountedMap::new();
    assert_eq!(m.len(), 0);

    m.put("x".to_string(), 10);
    assert_eq!(m.len(), 1);

    m.put("x".to_string(), 20);
    assert_eq!(m.len(), 1);
    assert_eq!(m.get("x"), Some(&20));

    m.remove("x");
    assert_eq!(m.len(), 0);

    m.remove("y");
    assert_eq!(m.len(), -1);
    assert_eq!(m.storage_len(), 0);
}

// Test: put/get round trip with borrowed lookup.
// Assumes: String keys can be queried with &str.
// Verifies: the stored value is returned and unset keys are None.
#[test]
fn put_then_get() {
    let mut m = CountedMap::new();
    let stored = m.put("hello".to_string(), vec![1, 2, 3]);
    stored.push(4);
    assert_eq!(m.get("hello"), Some(&vec![1, 2, 3, 4]));
    assert_eq!(m.get("world"), None);
    assert!(!m.contains("world"));
}

// Test: empty() forgets every key.
// Assumes: keys were set via put and update.
// Verifies: contains is false for all of them and len resets to 0.
#[test]
fn empty_forgets_previous_keys() {
    let mut m = CountedMap::new();
    m.put("a".to_string(), 1);
    m.update([("b".to_string(), 2), ("c".to_string(), 3)]);
    m.empty();
    for k in ["a", "b", "c"] {
        assert!(!m.contains(k));
    }
    assert_eq!(m.len(), 0);
    assert!(m.is_empty());
}

// Test: ensure on set and unset keys.
// Assumes: `ensure` goes through the put counting rule.
// Verifies: existing value wins; absent key gets the default and len +1.
#[test]
fn ensure_sets_only_when_absent() {
    let mut m = CountedMap::new();
    m.put("k".to_string(), "old");
    assert_eq!(*m.ensure("k".to_string(), "new"), "old");
    assert_eq!(m.len(), 1);

    let before = m.len();
    assert_eq!(*m.ensure("fresh".to_string(), "default"), "default");
    assert_eq!(m.len(), before + 1);
}

// Test: lazy_ensure defers construction.
// Assumes: the closure receives the key being ensured.
// Verifies: the closure never runs for a present key.
#[test]
fn lazy_ensure_skips_present_keys() {
    let mut m: CountedMap<String, usize> = CountedMap::new();
    m.put("abc".to_string(), 0);
    let v = *m.lazy_ensure("abc".to_string(), |_| panic!("must not be called"));
    assert_eq!(v, 0);

    let v = *m.lazy_ensure("abcd".to_string(), |k| k.len());
    assert_eq!(v, 4);
    assert_eq!(m.len(), 2);
}

// Test: update from a two-entry source into an empty map.
// Assumes: update routes every pair through put.
// Verifies: len 2 and both values readable.
#[test]
fn update_into_empty_map() {
    let mut m = CountedMap::new();
    m.update([("a", 1), ("b", 2)]);
    assert_eq!(m.len(), 2);
    assert_eq!(m.get("a"), Some(&1));
    assert_eq!(m.get("b"), Some(&2));
}

// Test: construction copies the source's own entries.
// Assumes: duplicate keys in the source overwrite earlier ones.
// Verifies: len counts distinct keys and last write wins.
#[test]
fn construct_from_source() {
    let source = vec![("a".to_string(), 1), ("b".to_string(), 2), ("a".to_string(), 5)];
    let m: CountedMap<String, i32> = CountedMap::from_source(source);
    assert_eq!(m.len(), 2);
    assert_eq!(m.get("a"), Some(&5));
    assert!(m.check_len().is_ok());
}

// Test: pop quirk on absent keys.
// Assumes: pop shares remove's counting.
// Verifies: None is returned and len still drops.
#[test]
fn pop_absent_key_still_decrements() {
    let mut m = CountedMap::new();
    m.put("a", 1);
    assert_eq!(m.pop("b"), None);
    assert_eq!(m.len(), 0);
    assert_eq!(m.pop("a"), Some(1));
    assert_eq!(m.len(), -1);
}

// Test: snapshot independence in both directions.
// Assumes: keys/values/items clone out of the map.
// Verifies: editing a snapshot leaves the map alone, and editing the map
// leaves earlier snapshots alone.
#[test]
fn snapshots_do_not_alias() {
    let mut m = CountedMap::new();
    m.update([("a".to_string(), 1), ("b".to_string(), 2)]);

    let mut keys = m.keys();
    let mut values = m.values();
    let mut items = m.items();
    keys.clear();
    values.push(100);
    items.push(("z".to_string(), 26));
    assert_eq!(m.len(), 2);
    assert!(!m.contains("z"));

    let keys = m.keys();
    let values = m.values();
    let items = m.items();
    m.put("c".to_string(), 3);
    m.put("a".to_string(), 10);
    m.remove("b");

    let key_set: BTreeSet<_> = keys.into_iter().collect();
    assert_eq!(key_set, BTreeSet::from(["a".to_string(), "b".to_string()]));
    let value_set: BTreeSet<_> = values.into_iter().collect();
    assert_eq!(value_set, BTreeSet::from([1, 2]));
    let item_set: BTreeSet<_> = items.into_iter().collect();
    assert_eq!(
        item_set,
        BTreeSet::from([("a".to_string(), 1), ("b".to_string(), 2)])
    );
}

// Test: values() keeps element identity.
// Assumes: values are Rc-wrapped.
// Verifies: each snapshot element is the same allocation as the stored one.
#[test]
fn values_share_identity() {
    let a = Rc::new("shared".to_string());
    let mut m = CountedMap::new();
    m.put("a", Rc::clone(&a));
    let vals = m.values();
    assert_eq!(vals.len(), 1);
    assert!(Rc::ptr_eq(&vals[0], &a));
    assert!(Rc::ptr_eq(&m.items()[0].1, &a));
}

// Test: items_obj aliasing.
// Assumes: the returned borrow is the live storage.
// Verifies: direct edits show up in get, the counter ignores them, and
// resync restores consistency.
#[test]
fn items_obj_is_live_storage() {
    let mut m = CountedMap::new();
    m.put("a".to_string(), 1);

    let raw = m.items_obj();
    raw.insert("b".to_string(), 2);
    raw.remove("a");

    assert_eq!(m.get("b"), Some(&2));
    assert_eq!(m.get("a"), None);
    assert_eq!(m.len(), 1);
    assert_eq!(m.storage_len(), 1);
    assert!(m.check_len().is_ok());

    m.items_obj().insert("c".to_string(), 3);
    assert_eq!(
        m.check_len(),
        Err(LengthMismatch {
            recorded: 1,
            actual: 2
        })
    );
    m.resync();
    assert_eq!(m.len(), 2);
}

// Test: chaining of the self-returning operations.
// Assumes: update/remove/empty return &mut Self.
// Verifies: a chain applies every step in order.
#[test]
fn mutators_chain() {
    let mut m = CountedMap::new();
    m.update([("a", 1), ("b", 2)]).remove("a").update([("c", 3)]);
    assert_eq!(m.len(), 2);
    assert!(m.contains("b") && m.contains("c"));
    assert_eq!(m.empty().update([("d", 4)]).len(), 1);
}

// Test: LengthMismatch is a std error.
// Assumes: Display carries both numbers.
// Verifies: it can be boxed as dyn Error.
#[test]
fn length_mismatch_is_error() {
    let mut m: CountedMap<&str, ()> = CountedMap::default();
    m.remove("gone").remove("gone");
    let err: Box<dyn std::error::Error> = Box::new(m.check_len().unwrap_err());
    assert_eq!(
        err.to_string(),
        "length counter out of sync: recorded -2, storage holds 0"
    );
}
