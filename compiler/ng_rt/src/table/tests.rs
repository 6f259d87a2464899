//! Tests for the Robin-Hood table.

#![allow(
    clippy::unwrap_used,
    reason = "test code uses unwrap for concise assertions"
)]

use std::collections::HashMap;

use pretty_assertions::assert_eq;

use super::*;

/// Deliberately poor hash so probe chains collide and wrap.
fn clumpy(key: u64) -> u64 {
    key % 5
}

fn put(table: &mut RobinHoodTable<u64, u64>, key: u64, value: u64) -> Insert<u64, u64> {
    table.insert(clumpy(key), key, value, |a, b| a == b)
}

fn get(table: &RobinHoodTable<u64, u64>, key: u64) -> Option<u64> {
    table.get(clumpy(key), |k| *k == key).copied()
}

fn del(table: &mut RobinHoodTable<u64, u64>, key: u64) -> Option<u64> {
    table.remove(clumpy(key), |k| *k == key).map(|(_, v)| v)
}

// ── Basic operations ────────────────────────────────────────────────────

#[test]
fn starts_at_capacity_two() {
    let table = RobinHoodTable::<u64, u64>::new();
    assert_eq!(table.capacity(), 2);
    assert!(table.is_empty());
}

#[test]
fn update_keeps_len_and_returns_previous_value() {
    let mut table = RobinHoodTable::new();
    assert_eq!(put(&mut table, 1, 10), Insert::Inserted);
    assert_eq!(put(&mut table, 1, 20), Insert::Replaced { key: 1, old: 10 });
    assert_eq!(table.len(), 1);
    assert_eq!(get(&table, 1), Some(20));
}

#[test]
fn survives_three_resizes() {
    let mut table = RobinHoodTable::new();
    for key in 0..20 {
        put(&mut table, key, key * 100);
        table.check_invariants().unwrap();
    }
    assert!(table.capacity() >= 16, "capacity {}", table.capacity());
    assert_eq!(table.len(), 20);
    for key in 0..20 {
        assert_eq!(get(&table, key), Some(key * 100));
    }
    assert_eq!(get(&table, 99), None);
}

#[test]
fn resize_happens_when_len_reaches_threshold() {
    let mut table = RobinHoodTable::new();
    put(&mut table, 0, 0);
    assert_eq!(table.capacity(), 2);
    put(&mut table, 1, 1);
    assert_eq!(table.capacity(), 4);
    put(&mut table, 2, 2);
    assert_eq!(table.capacity(), 4);
    put(&mut table, 3, 3);
    assert_eq!(table.capacity(), 8);
}

#[test]
fn backward_shift_keeps_the_rest_of_the_chain() {
    let mut table = RobinHoodTable::with_capacity(16);
    // Keys 0, 5, 10, 15 share one home slot.
    for key in [0, 5, 10, 15, 1, 2] {
        put(&mut table, key, key);
    }
    assert_eq!(del(&mut table, 5), Some(5));
    table.check_invariants().unwrap();
    for key in [0, 10, 15, 1, 2] {
        assert_eq!(get(&table, key), Some(key));
    }
    assert_eq!(get(&table, 5), None);
    assert_eq!(del(&mut table, 5), None);
}

#[test]
fn remove_everything_empties_every_slot() {
    let mut table = RobinHoodTable::new();
    for key in 0..50 {
        put(&mut table, key, key);
    }
    for key in (0..50).rev() {
        assert_eq!(del(&mut table, key), Some(key));
    }
    assert!(table.is_empty());
    assert!(table.probe_lengths().all(|psl| psl == 0));
}

#[test]
fn into_entries_yields_every_pair() {
    let mut table = RobinHoodTable::new();
    for key in 0..10 {
        put(&mut table, key, key + 1);
    }
    let mut entries: Vec<_> = table.into_entries().collect();
    entries.sort_unstable();
    assert_eq!(entries, (0..10).map(|k| (k, k + 1)).collect::<Vec<_>>());
}

#[test]
fn get_mut_updates_in_place() {
    let mut table = RobinHoodTable::new();
    put(&mut table, 7, 1);
    *table.get_mut(clumpy(7), |k| *k == 7).unwrap() += 41;
    assert_eq!(get(&table, 7), Some(42));
}

// ── Model-based properties ──────────────────────────────────────────────

mod proptest_model {
    use proptest::prelude::*;

    use super::*;

    #[derive(Clone, Debug)]
    enum Op {
        Put(u64, u64),
        Del(u64),
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            3 => (0u64..64, any::<u64>()).prop_map(|(k, v)| Op::Put(k, v)),
            1 => (0u64..64).prop_map(Op::Del),
        ]
    }

    proptest! {
        #[test]
        fn matches_hashmap_model(ops in proptest::collection::vec(op(), 0..400)) {
            let mut table = RobinHoodTable::new();
            let mut model = HashMap::new();

            for op in ops {
                match op {
                    Op::Put(k, v) => {
                        let expected = model.insert(k, v);
                        let got = match put(&mut table, k, v) {
                            Insert::Inserted => None,
                            Insert::Replaced { old, .. } => Some(old),
                        };
                        prop_assert_eq!(got, expected);
                    }
                    Op::Del(k) => {
                        prop_assert_eq!(del(&mut table, k), model.remove(&k));
                    }
                }
                prop_assert!(table.check_invariants().is_ok(), "{:?}", table.check_invariants());
                prop_assert_eq!(table.len(), model.len());
            }

            for (k, v) in &model {
                prop_assert_eq!(get(&table, *k), Some(*v));
            }
        }

        #[test]
        fn full_hash_keys_stay_retrievable(
            keys in proptest::collection::hash_set(any::<u64>(), 0..300),
        ) {
            let mut table = RobinHoodTable::new();
            for &k in &keys {
                table.insert(k, k, !k, |a, b| a == b);
            }
            prop_assert_eq!(table.len(), keys.len());
            for &k in &keys {
                prop_assert_eq!(table.get(k, |x| *x == k), Some(&!k));
            }
        }
    }
}
