//! Property-Based Tests for Cache Module
//!
//! Uses proptest to check the cache against a plain HashMap model and the
//! radix index against its pruning invariants.

use proptest::prelude::*;
use std::collections::{HashMap, HashSet};

use crate::cache::{DigitWidth, HashCache, NodeId, RadixIndex};

// == Test Runtime ==
/// Builds a cache inside a runtime that is never driven, so the scavenger
/// stays parked and the properties see no background sweeps.
fn with_cache<F: FnOnce(&HashCache) -> Result<(), TestCaseError>>(
    test: F,
) -> Result<(), TestCaseError> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap();
    let _guard = runtime.enter();
    let cache = HashCache::new("property-secret");
    test(&cache)
}

// == Strategies ==
fn key_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9_:]{0,32}"
}

fn value_strategy() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..64)
}

#[derive(Debug, Clone)]
enum CacheOp {
    Write { key: String, value: Vec<u8> },
    Read { key: String },
    Delete { key: String },
}

fn cache_op_strategy() -> impl Strategy<Value = CacheOp> {
    // Small key space so deletes and overwrites hit existing keys
    let key = "k[0-9]{1,2}";
    prop_oneof![
        (key, value_strategy()).prop_map(|(key, value)| CacheOp::Write { key, value }),
        key.prop_map(|key| CacheOp::Read { key }),
        key.prop_map(|key| CacheOp::Delete { key }),
    ]
}

fn width_strategy() -> impl Strategy<Value = DigitWidth> {
    prop_oneof![
        Just(DigitWidth::Four),
        Just(DigitWidth::Eight),
        Just(DigitWidth::Sixteen),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    // Every written key reads back its own value.
    #[test]
    fn prop_roundtrip_storage(
        entries in prop::collection::hash_map(key_strategy(), value_strategy(), 1..40)
    ) {
        with_cache(|cache| {
            for (key, value) in &entries {
                cache.write(key, value.clone());
            }
            for (key, value) in &entries {
                prop_assert_eq!(cache.read(key), Some(value.clone()));
            }
            prop_assert_eq!(cache.count(), entries.len());
            Ok(())
        })?;
    }

    // A second write replaces the value without adding an entry.
    #[test]
    fn prop_overwrite_semantics(
        key in key_strategy(),
        value1 in value_strategy(),
        value2 in value_strategy()
    ) {
        with_cache(|cache| {
            cache.write(&key, value1.clone());
            let count = cache.count();
            cache.write(&key, value2.clone());

            prop_assert_eq!(cache.read(&key), Some(value2.clone()));
            prop_assert_eq!(cache.count(), count);
            Ok(())
        })?;
    }

    // Count and reads match a HashMap model under any operation sequence.
    #[test]
    fn prop_matches_model(ops in prop::collection::vec(cache_op_strategy(), 1..80)) {
        with_cache(|cache| {
            let mut model: HashMap<String, Vec<u8>> = HashMap::new();

            for op in ops {
                match op {
                    CacheOp::Write { key, value } => {
                        cache.write(&key, value.clone());
                        model.insert(key, value);
                    }
                    CacheOp::Read { key } => {
                        prop_assert_eq!(cache.read(&key), model.get(&key).cloned());
                    }
                    CacheOp::Delete { key } => {
                        prop_assert_eq!(cache.delete(&key), model.remove(&key).is_some());
                    }
                }
                prop_assert_eq!(cache.count(), model.len());
            }
            Ok(())
        })?;
    }

    // Deleting everything collapses the trie back to its root.
    #[test]
    fn prop_delete_all_prunes_to_root(
        keys in prop::collection::hash_set(key_strategy(), 1..40)
    ) {
        with_cache(|cache| {
            for key in &keys {
                cache.write(key, b"v".to_vec());
            }
            for key in &keys {
                prop_assert!(cache.delete(key));
                prop_assert_eq!(cache.read(key), None);
            }
            let stats = cache.stats();
            prop_assert_eq!(stats.entries, 0);
            prop_assert_eq!(stats.nodes, 1);
            Ok(())
        })?;
    }

    // Digests sharing a long common prefix get distinct leaves, and pruning
    // them in any order leaves the survivors reachable.
    #[test]
    fn prop_shared_prefix_paths(
        width in width_strategy(),
        prefix in any::<u64>(),
        tails in prop::collection::hash_set(0u64..16, 2..16),
        removal_order in any::<prop::sample::Index>()
    ) {
        let mut index = RadixIndex::new(width);
        // Vary only the top 4 bits so every path shares all but the last level
        let digests: Vec<u64> = tails
            .iter()
            .map(|tail| (prefix & 0x0fff_ffff_ffff_ffff) | (tail << 60))
            .collect();

        let leaves: Vec<NodeId> = digests
            .iter()
            .map(|d| index.ensure_path(width.digits(*d)))
            .collect();
        let distinct: HashSet<NodeId> = leaves.iter().copied().collect();
        prop_assert_eq!(distinct.len(), leaves.len());

        let mut remaining: Vec<(u64, NodeId)> = digests.into_iter().zip(leaves).collect();
        let start = removal_order.index(remaining.len());
        remaining.rotate_left(start);

        while let Some((_, leaf)) = remaining.pop() {
            index.prune(leaf);
            for (digest, leaf) in &remaining {
                prop_assert_eq!(index.lookup_path(width.digits(*digest)), Some(*leaf));
            }
        }
        prop_assert_eq!(index.node_count(), 1);
    }
}
