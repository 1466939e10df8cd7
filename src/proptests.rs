use super::*;

use proptest::prelude::*;
use std::collections::BTreeMap;

#[derive(Clone, Debug)]
enum Op {
    Insert(u16, u32),
    Remove(u16),
    Get(u16),
    PopFirst,
    PopLast,
}

fn ops_strategy() -> impl Strategy<Value = Vec<Op>> {
    // A small key space so that removes and upserts hit existing keys
    let key = 0u16..512;
    let op = prop_oneof![
        50 => (key.clone(), any::<u32>()).prop_map(|(k, v)| Op::Insert(k, v)),
        30 => key.clone().prop_map(Op::Remove),
        16 => key.prop_map(Op::Get),
        2 => Just(Op::PopFirst),
        2 => Just(Op::PopLast),
    ];
    prop::collection::vec(op, 0..=600)
}

/// Height limit of an AVL tree with `len` nodes.
fn avl_height_bound(len: usize) -> usize {
    (1.44 * ((len + 2) as f64).log2()).ceil() as usize
}

fn is_strictly_ascending<'a>(mut keys: impl Iterator<Item = &'a u16>) -> bool {
    let mut prev = match keys.next() {
        None => return true,
        Some(key) => key,
    };
    for key in keys {
        if key <= prev {
            return false;
        }
        prev = key;
    }
    true
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 128,
        .. ProptestConfig::default()
    })]

    #[test]
    fn prop_avl_equivalence(ops in ops_strategy()) {
        let mut t: AvlTreeMap<u16, u32> = AvlTreeMap::new();
        let mut m: BTreeMap<u16, u32> = BTreeMap::new();

        for op in ops {
            match op {
                Op::Insert(key, value) => {
                    prop_assert_eq!(t.insert(key, value), m.insert(key, value));
                }
                Op::Remove(key) => {
                    prop_assert_eq!(t.remove(&key), m.remove(&key));
                }
                Op::Get(key) => {
                    prop_assert_eq!(t.get(&key), m.get(&key));
                }
                Op::PopFirst => {
                    prop_assert_eq!(t.pop_first(), m.pop_first());
                }
                Op::PopLast => {
                    prop_assert_eq!(t.pop_last(), m.pop_last());
                }
            }

            t.check_consistency();
            prop_assert!(t.is_balanced());
            prop_assert!(is_strictly_ascending(t.keys()));
            prop_assert!(t.height() <= avl_height_bound(t.len()));
            prop_assert_eq!(t.len(), m.len());
        }

        let got: Vec<(u16, u32)> = t.iter().map(|(k, v)| (*k, *v)).collect();
        let expected: Vec<(u16, u32)> = m.iter().map(|(k, v)| (*k, *v)).collect();
        prop_assert_eq!(got, expected);
    }

    #[test]
    fn prop_search_tree_equivalence(ops in ops_strategy()) {
        let mut t: SearchTree<u16, u32> = SearchTree::new();
        let mut m: BTreeMap<u16, u32> = BTreeMap::new();

        for op in ops {
            match op {
                Op::Insert(key, value) => {
                    prop_assert_eq!(t.insert(key, value), m.insert(key, value));
                }
                Op::Remove(key) => {
                    prop_assert_eq!(t.remove(&key), m.remove(&key));
                }
                Op::Get(key) => {
                    prop_assert_eq!(t.get(&key), m.get(&key));
                }
                Op::PopFirst => {
                    prop_assert_eq!(t.pop_first(), m.pop_first());
                }
                Op::PopLast => {
                    prop_assert_eq!(t.pop_last(), m.pop_last());
                }
            }

            prop_assert!(is_strictly_ascending(t.keys()));
            prop_assert_eq!(t.len(), m.len());
        }

        t.check_consistency();
        let got: Vec<(u16, u32)> = t.iter().rev().map(|(k, v)| (*k, *v)).collect();
        let expected: Vec<(u16, u32)> = m.iter().rev().map(|(k, v)| (*k, *v)).collect();
        prop_assert_eq!(got, expected);
    }

    #[test]
    fn prop_round_trip(keys in prop::collection::btree_set(any::<i32>(), 0..300), seed in any::<u64>()) {
        use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

        let mut keys: Vec<i32> = keys.into_iter().collect();
        let mut t: AvlTreeMap<i32, ()> = keys.iter().map(|&key| (key, ())).collect();
        prop_assert_eq!(t.len(), keys.len());

        keys.shuffle(&mut StdRng::seed_from_u64(seed));
        for key in &keys {
            prop_assert_eq!(t.remove(key), Some(()));
            prop_assert_eq!(t.remove(key), None);
            prop_assert!(t.is_balanced());
        }
        prop_assert!(t.is_empty());
    }

    #[test]
    fn prop_absent_remove_is_noop(keys in prop::collection::vec(0i32..1000, 0..200), absent in 1000i32..2000) {
        let mut t: AvlTreeMap<i32, i32> = keys.iter().map(|&key| (key, key)).collect();
        let before = t.clone();
        prop_assert_eq!(t.remove(&absent), None);
        prop_assert_eq!(&t, &before);
        t.check_consistency();
    }
}
