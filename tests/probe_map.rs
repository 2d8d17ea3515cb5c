// ProbeMap / ProbeSet public-surface tests.
//
// Invariants exercised:
// - Uniqueness: `insert` refuses an equal key and leaves the entry alone;
//   `insert_or_replace` supersedes it.
// - Absence is an Option/bool result except for `get`, which reports
//   `LookupError::NotFound`.
// - Views: `keys()`/`values()` borrow the map, can be iterated repeatedly
//   and report the same length as the map.
// - Owning policies: `Release::release` runs exactly once for each owned
//   side that leaves the container through replace, remove, clear or drop,
//   and never for entries handed back by `take`.
use shift_collections::{
    InsertError, LookupError, Ownership, OwningMap, OwningSet, ProbeMap, ProbeSet, Release,
};
use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::rc::Rc;

type Log = Rc<RefCell<Vec<String>>>;

// Element type that records its own release in a shared log.
#[derive(Debug)]
struct Handle {
    name: String,
    log: Log,
}

impl Handle {
    fn new(name: &str, log: &Log) -> Self {
        Handle {
            name: name.to_string(),
            log: Rc::clone(log),
        }
    }
}

impl PartialEq for Handle {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for Handle {}

impl std::hash::Hash for Handle {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

impl std::borrow::Borrow<str> for Handle {
    fn borrow(&self) -> &str {
        &self.name
    }
}

impl Release for Handle {
    fn release(self) {
        self.log.borrow_mut().push(self.name);
    }
}

fn sorted(log: &Log) -> Vec<String> {
    let mut v = log.borrow().clone();
    v.sort();
    v
}

// Test: unique insert, replace, lookup and removal round trip.
#[test]
fn insert_lookup_replace_remove() {
    let mut m: ProbeMap<String, i32> = ProbeMap::new();
    assert!(m.is_empty());
    m.insert("one".to_string(), 1).unwrap();
    m.insert("two".to_string(), 2).unwrap();
    assert_eq!(
        m.insert("one".to_string(), 100),
        Err(InsertError::DuplicateKey)
    );
    assert_eq!(m["one"], 1, "refused insert must not overwrite");

    m.insert_or_replace("one".to_string(), 11);
    m.insert_or_replace("three".to_string(), 3);
    assert_eq!(m.len(), 3);
    assert_eq!(m.try_get("one"), Some(&11));
    assert_eq!(m.get("three"), Ok(&3));
    assert_eq!(m.get("four"), Err(LookupError::NotFound));
    assert_eq!(m.try_get("four"), None);

    assert!(m.contains_key("two"));
    assert!(m.contains_value(&2));
    assert!(!m.contains_value(&1));

    assert!(m.remove("two"));
    assert!(!m.remove("two"));
    assert_eq!(m.take("three"), Some(("three".to_string(), 3)));
    assert_eq!(m.len(), 1);
}

// Test: indexing a missing key panics with the lookup error message.
#[test]
#[should_panic(expected = "the given key was not present")]
fn index_on_missing_key_panics() {
    let m: ProbeMap<String, i32> = ProbeMap::new();
    let _v: i32 = m["missing"];
}

// Test: worked growth example through the public map.
// Verifies: capacity goes 0 -> 4 -> 8 and removal keeps the rest reachable.
#[test]
fn growth_example_through_the_map() {
    let mut m: ProbeMap<char, u32> = ProbeMap::new();
    assert_eq!(m.capacity(), 0);
    for (i, k) in ['A', 'B', 'C'].into_iter().enumerate() {
        m.insert(k, i as u32).unwrap();
    }
    assert_eq!(m.capacity(), 4);
    m.insert('D', 3).unwrap();
    assert_eq!(m.capacity(), 8);
    assert!(m.remove(&'B'));
    for k in ['A', 'C', 'D'] {
        assert!(m.contains_key(&k), "{k} lost after removing B");
    }
    assert!(!m.contains_key(&'B'));
}

// Test: views are restartable and agree with the map.
#[test]
fn key_and_value_views() {
    let m: ProbeMap<u32, String> = (0..20).map(|i| (i, format!("v{i}"))).collect();
    let keys = m.keys();
    let values = m.values();
    assert_eq!(keys.len(), 20);
    assert_eq!(values.len(), 20);

    let first: Vec<u32> = keys.iter().copied().collect();
    let second: Vec<u32> = keys.into_iter().copied().collect();
    assert_eq!(first, second, "view iteration must be repeatable");
    assert_eq!(
        first.iter().copied().collect::<BTreeSet<_>>(),
        (0..20).collect::<BTreeSet<_>>()
    );

    assert!(keys.contains(&7));
    assert!(!keys.contains(&70));
    assert!(values.contains(&"v7".to_string()));
    let mut total = 0;
    for v in &values {
        total += v.len();
    }
    assert_eq!(total, values.iter().map(String::len).sum::<usize>());

    // iter() and the views walk the same slots in the same order.
    let pairs: Vec<(u32, &String)> = m.iter().map(|(k, v)| (*k, v)).collect();
    let zipped: Vec<(u32, &String)> = keys.iter().copied().zip(values.iter()).collect();
    assert_eq!(pairs, zipped);
}

// Test: in-place mutation through iter_mut, values_mut and get_mut.
#[test]
fn mutation_in_place() {
    let mut m: ProbeMap<u32, u32> = (0..10).map(|i| (i, i)).collect();
    for (_, v) in m.iter_mut() {
        *v *= 2;
    }
    for v in m.values_mut() {
        *v += 1;
    }
    if let Some(v) = m.get_mut(&3) {
        *v = 0;
    }
    let model: BTreeMap<u32, u32> = m.iter().map(|(k, v)| (*k, *v)).collect();
    let expected: BTreeMap<u32, u32> = (0..10)
        .map(|i| (i, if i == 3 { 0 } else { i * 2 + 1 }))
        .collect();
    assert_eq!(model, expected);
}

// Test: extend replaces duplicates; clear empties and releases storage.
#[test]
fn extend_and_clear() {
    let mut m: ProbeMap<&str, i32> = ProbeMap::with_capacity(8);
    let cap = m.capacity();
    assert!(cap >= 8);
    m.extend([("a", 1), ("b", 2), ("a", 3)]);
    assert_eq!(m.len(), 2);
    assert_eq!(m.try_get("a"), Some(&3));
    assert_eq!(m.capacity(), cap, "pre-sized map must not grow");
    m.clear();
    assert!(m.is_empty());
    assert_eq!(m.capacity(), 0);
    m.insert("c", 4).unwrap();
    assert_eq!(m.get_key_value("c"), Some((&"c", &4)));
}

// Test: cloning a plain map yields an independent copy.
#[test]
fn clone_is_independent() {
    let mut a: ProbeMap<u8, Vec<u8>> = ProbeMap::new();
    a.insert(1, vec![1]).unwrap();
    let mut b = a.clone();
    b.get_mut(&1).unwrap().push(2);
    b.insert(2, vec![]).unwrap();
    assert_eq!(a.try_get(&1), Some(&vec![1]));
    assert_eq!(a.len(), 1);
    assert_eq!(b.len(), 2);
    assert_eq!(format!("{a:?}"), "{1: [1]}");
}

// Test: owning map with both sides owned.
// Verifies: replace releases the old pair, remove releases, take does not,
// drop releases whatever is left.
#[test]
fn owning_map_releases_both_sides() {
    let log: Log = Rc::default();
    {
        let mut m: OwningMap<Handle, Handle> = OwningMap::owning(Ownership::Both);
        m.insert(Handle::new("k1", &log), Handle::new("v1", &log))
            .unwrap();
        m.insert(Handle::new("k2", &log), Handle::new("v2", &log))
            .unwrap();
        m.insert(Handle::new("k3", &log), Handle::new("v3", &log))
            .unwrap();

        m.insert_or_replace(Handle::new("k1", &log), Handle::new("v1b", &log));
        assert_eq!(sorted(&log), vec!["k1", "v1"]);

        assert!(m.remove("k2"));
        assert_eq!(sorted(&log), vec!["k1", "k2", "v1", "v2"]);

        let (k, v) = m.take("k3").unwrap();
        assert_eq!((k.name.as_str(), v.name.as_str()), ("k3", "v3"));
        assert_eq!(log.borrow().len(), 4, "take must not release");
    }
    assert_eq!(sorted(&log), vec!["k1", "k1", "k2", "v1", "v1b", "v2"]);
}

// Test: key-only and value-only policies release only their side.
#[test]
fn owning_map_respects_single_sided_policies() {
    let log: Log = Rc::default();
    let mut keys_only: OwningMap<Handle, Handle> = OwningMap::owning(Ownership::Keys);
    keys_only
        .insert(Handle::new("k", &log), Handle::new("v", &log))
        .unwrap();
    keys_only.clear();
    assert_eq!(sorted(&log), vec!["k"]);

    log.borrow_mut().clear();
    let mut values_only: OwningMap<Handle, Handle> = OwningMap::owning(Ownership::Values);
    values_only
        .insert(Handle::new("k", &log), Handle::new("v", &log))
        .unwrap();
    drop(values_only);
    assert_eq!(sorted(&log), vec!["v"]);

    log.borrow_mut().clear();
    let mut neither: OwningMap<Handle, ()> = OwningMap::owning(Ownership::Neither);
    neither.insert(Handle::new("k", &log), ()).unwrap();
    assert!(neither.remove("k"));
    assert!(log.borrow().is_empty());
}

// Test: set surface mirrors the map.
#[test]
fn set_insert_replace_contains() {
    let mut s: ProbeSet<String> = ProbeSet::new();
    s.insert("x".to_string()).unwrap();
    assert_eq!(s.insert("x".to_string()), Err(InsertError::DuplicateKey));
    s.replace("x".to_string());
    s.replace("y".to_string());
    assert_eq!(s.len(), 2);
    assert!(s.contains("y"));
    assert_eq!(s.get("x").map(String::as_str), Some("x"));
    assert!(s.remove("x"));
    assert_eq!(s.take("y"), Some("y".to_string()));
    assert!(s.is_empty());

    let collected: BTreeSet<&String> = (&s).into_iter().collect();
    assert!(collected.is_empty());
}

// Test: owning set releases elements on replace and drop.
#[test]
fn owning_set_releases_elements() {
    let log: Log = Rc::default();
    {
        let mut s: OwningSet<Handle> = OwningSet::owning(Ownership::Keys);
        s.insert(Handle::new("a", &log)).unwrap();
        s.insert(Handle::new("b", &log)).unwrap();
        s.replace(Handle::new("a", &log));
        assert_eq!(sorted(&log), vec!["a"]);
        assert!(s.contains("a"));
    }
    assert_eq!(sorted(&log), vec!["a", "a", "b"]);
}
